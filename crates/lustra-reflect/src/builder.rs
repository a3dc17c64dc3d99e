//! Typed registration surface for records.
//!
//! [`RecordBuilder`] is where plain Rust functions become registered
//! overloads: each `ctorN`/`methodN` takes the parameter markers
//! ([`ByVal`]/[`ByRef`]/[`ByRefMut`]) as type arguments, derives the
//! strict and normal signature ids from them, and wraps the supplied
//! closure in the erased calling convention. Closures receive owned
//! argument values; the markers exist to distinguish overloads and
//! drive slot classification at resolution time.

use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use lustra_core::{
    sig_of, uid_of, ByRef, Erased, Param, ParamList, RBox, ReflectError, ReflectResult,
};

use crate::method::Method;
use crate::object::Alloc;
use crate::overload::{Overload, OverloadFn};
use crate::record::{CopyFn, Record};
use crate::registry::register_record;

fn wrap_instance<T: 'static>(value: T, alloc: Alloc) -> Erased {
    match alloc {
        Alloc::Stack => Erased::value(value),
        Alloc::Heap => Erased::wrapper(RBox::new(value)),
    }
}

fn take_arg<P: Param>(
    args: &mut std::vec::IntoIter<Erased>,
    index: usize,
) -> ReflectResult<P::Owned> {
    args.next()
        .and_then(|a| a.take::<P::Owned>())
        .ok_or(ReflectError::ArgumentMismatch {
            index,
            expected: std::any::type_name::<P::Owned>(),
        })
}

/// Builder for one record's reflected surface.
pub struct RecordBuilder<T: 'static> {
    name: String,
    namespace: String,
    ctors: Vec<Overload>,
    methods: FxHashMap<String, Vec<Overload>>,
    copier: Option<CopyFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> RecordBuilder<T> {
    /// Start building a record registered under `name`.
    pub fn new(name: &str) -> Self {
        RecordBuilder {
            name: name.to_string(),
            namespace: String::new(),
            ctors: Vec::new(),
            methods: FxHashMap::default(),
            copier: None,
            _marker: PhantomData,
        }
    }

    /// Set the namespace the record is reported under.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Register the default constructor.
    ///
    /// Its signature is the implicit allocation-strategy parameter
    /// itself, strict and normal alike, so `constructor0` resolution
    /// can match it by strict id.
    pub fn ctor0(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let sig = sig_of(&[uid_of::<Alloc>()]);
        let call = OverloadFn::Ctor(Arc::new(move |alloc, _args| Ok(wrap_instance(f(), alloc))));
        self.ctors
            .push(Overload::new(sig, sig, uid_of::<T>(), false, call));
        self
    }

    /// Register a zero-argument method.
    pub fn method0<R: 'static>(
        mut self,
        name: &str,
        f: impl Fn(&T) -> R + Send + Sync + 'static,
    ) -> Self {
        let sig = <()>::strict_sig();
        let call = OverloadFn::Method(Arc::new(move |target, _args| {
            let this = target.deref_as::<T>()?;
            Ok(Erased::value(f(this)))
        }));
        self.methods
            .entry(name.to_string())
            .or_default()
            .push(Overload::new(sig, sig, uid_of::<R>(), false, call));
        self
    }

    /// Register the deep-copy path: a copy constructor overload plus
    /// the erased copier behind `RObject::clone_with`.
    pub fn with_clone(mut self) -> Self
    where
        T: Clone,
    {
        let copier: CopyFn = Arc::new(|target, alloc| {
            let this = target.deref_as::<T>()?;
            Ok(wrap_instance(this.clone(), alloc))
        });
        self.copier = Some(copier);
        self.ctor1::<ByRef<T>>(|v| v)
    }

    /// Finalize into an immutable [`Record`].
    ///
    /// Constructor overloads are stored as a method under the record's
    /// own name, mirroring how constructor lookup finds them.
    pub fn build(self) -> Record {
        let uid = uid_of::<T>();
        let mut methods = FxHashMap::default();
        if !self.ctors.is_empty() {
            methods.insert(self.name.clone(), Method::new(&self.name, uid, self.ctors));
        }
        for (name, overloads) in self.methods {
            let method = Method::new(&name, uid, overloads);
            methods.insert(name, method);
        }
        Record::new(&self.name, &self.namespace, uid, methods, self.copier)
    }

    /// Build and publish to the global registry.
    pub fn register(self) {
        register_record(self.build());
    }
}

macro_rules! impl_builder_arity {
    ($ctor:ident, $method:ident; $($P:ident $idx:tt),+) => {
        impl<T: 'static> RecordBuilder<T> {
            /// Register a constructor overload at this arity.
            pub fn $ctor<$($P: Param),+>(
                mut self,
                f: impl Fn($($P::Owned),+) -> T + Send + Sync + 'static,
            ) -> Self {
                let strict = <($($P,)+)>::strict_sig();
                let normal = <($($P,)+)>::normal_sig();
                let refs = <($($P,)+)>::any_ref_mut();
                let call = OverloadFn::Ctor(Arc::new(move |alloc, args| {
                    let mut it = args.into_iter();
                    let value = f($(take_arg::<$P>(&mut it, $idx)?),+);
                    Ok(wrap_instance(value, alloc))
                }));
                self.ctors
                    .push(Overload::new(strict, normal, uid_of::<T>(), refs, call));
                self
            }

            /// Register a method overload at this arity.
            pub fn $method<R: 'static, $($P: Param),+>(
                mut self,
                name: &str,
                f: impl Fn(&T $(, $P::Owned)+) -> R + Send + Sync + 'static,
            ) -> Self {
                let strict = <($($P,)+)>::strict_sig();
                let normal = <($($P,)+)>::normal_sig();
                let refs = <($($P,)+)>::any_ref_mut();
                let call = OverloadFn::Method(Arc::new(move |target, args| {
                    let this = target.deref_as::<T>()?;
                    let mut it = args.into_iter();
                    let ret = f(this $(, take_arg::<$P>(&mut it, $idx)?)+);
                    Ok(Erased::value(ret))
                }));
                self.methods
                    .entry(name.to_string())
                    .or_default()
                    .push(Overload::new(strict, normal, uid_of::<R>(), refs, call));
                self
            }
        }
    };
}

impl_builder_arity!(ctor1, method1; P1 0);
impl_builder_arity!(ctor2, method2; P1 0, P2 1);
impl_builder_arity!(ctor3, method3; P1 0, P2 1, P3 2);
impl_builder_arity!(ctor4, method4; P1 0, P2 1, P3 2, P4 3);

#[cfg(test)]
mod tests {
    use super::*;
    use lustra_core::{ByVal, EntityKind};

    #[derive(Clone, Debug, PartialEq)]
    struct Vec2 {
        x: f64,
        y: f64,
    }

    fn vec2_record() -> Record {
        RecordBuilder::<Vec2>::new("Vec2")
            .namespace("geometry")
            .ctor0(|| Vec2 { x: 0.0, y: 0.0 })
            .ctor2::<ByVal<f64>, ByVal<f64>>(|x, y| Vec2 { x, y })
            .method0("norm_sq", |v: &Vec2| v.x * v.x + v.y * v.y)
            .method1::<f64, ByVal<f64>>("scaled_x", |v, k| v.x * k)
            .with_clone()
            .build()
    }

    #[test]
    fn test_default_ctor_stack_and_heap() {
        let record = vec2_record();
        let ctor = record.constructor0();
        assert!(ctor.is_ok());

        let obj = ctor.invoke(Alloc::Stack, ()).unwrap();
        assert_eq!(obj.kind(), EntityKind::Value);
        assert_eq!(obj.view::<Vec2>(), Some(&Vec2 { x: 0.0, y: 0.0 }));

        let obj = ctor.invoke(Alloc::Heap, ()).unwrap();
        assert_eq!(obj.kind(), EntityKind::Wrapper);
        assert_eq!(obj.view::<Vec2>(), Some(&Vec2 { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_typed_ctor_and_method() {
        let record = vec2_record();
        let obj = record
            .constructor::<(f64, f64)>()
            .invoke(Alloc::Heap, (3.0, 4.0))
            .unwrap();

        let m = record.get_method("norm_sq").unwrap();
        let ret = m
            .target_erased()
            .args::<()>()
            .returning::<f64>()
            .call_obj(&obj, ())
            .unwrap();
        assert_eq!(ret.view::<f64>(), Some(&25.0));
    }

    #[test]
    fn test_method_with_args() {
        let record = vec2_record();
        let v = Vec2 { x: 2.0, y: 1.0 };
        let m = record.get_method("scaled_x").unwrap();
        let h = m.target::<Vec2>().args::<(f64,)>().returning::<f64>();
        assert_eq!(h.call::<_, _, f64>(&v, (10.0,)), Ok(20.0));
    }

    #[test]
    fn test_copy_ctor_registered_by_with_clone() {
        let record = vec2_record();
        // `with_clone` adds a by-reference constructor taking the type
        // itself; its normal signature matches a value request.
        let ctor = record.constructor::<(Vec2,)>();
        assert!(ctor.is_ok());
        let src = Vec2 { x: 1.0, y: 2.0 };
        let obj = ctor.invoke(Alloc::Stack, (src.clone(),)).unwrap();
        assert_eq!(obj.view::<Vec2>(), Some(&src));
    }

    #[test]
    fn test_clone_with_is_independent() {
        let record = vec2_record();
        let obj = record
            .constructor::<(f64, f64)>()
            .invoke(Alloc::Stack, (5.0, 6.0))
            .unwrap();
        let copy = obj.clone_with(Alloc::Heap).unwrap();
        assert_eq!(copy.kind(), EntityKind::Wrapper);
        assert_eq!(copy.view::<Vec2>(), obj.view::<Vec2>());

        // The copy survives the source.
        let src = obj.take::<Vec2>().unwrap();
        assert_eq!(copy.view::<Vec2>(), Some(&src));
    }

    #[test]
    fn test_missing_copier_reports_mismatch() {
        let record = RecordBuilder::<Vec2>::new("Bare")
            .ctor0(|| Vec2 { x: 0.0, y: 0.0 })
            .build();
        let obj = record.constructor0().invoke(Alloc::Stack, ()).unwrap();
        assert_eq!(
            obj.clone_with(Alloc::Stack).err(),
            Some(ReflectError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_arity_argument_mismatch() {
        let record = vec2_record();
        // A resolved handle invoked with too few erased args surfaces
        // the per-argument error from the erased calling convention.
        let ctor = record.constructor::<(f64, f64)>();
        assert!(matches!(
            ctor.invoke_erased(Alloc::Stack, vec![Erased::value(1.0f64)])
                .err(),
            Some(ReflectError::ArgumentMismatch { index: 1, .. })
        ));
    }
}
