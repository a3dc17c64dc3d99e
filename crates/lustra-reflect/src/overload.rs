//! Registered overloads and erased call targets.
//!
//! An [`Overload`] is one concrete registered signature: its strict and
//! normal signature ids, the return type uid, the non-const-reference
//! flag, and the erased callable invoked through a uniform boxed-call
//! shape. Callables are `Arc`-shared closures registered once and
//! invoked without further allocation.

use std::any::Any;
use std::sync::Arc;

use lustra_core::uid::name_of;
use lustra_core::{uid_of, Erased, ReflectError, ReflectResult, SigId, TypeUid};

use crate::object::Alloc;

/// Erased constructor callable: allocation strategy + packed arguments
/// in, erased instance out.
pub type CtorFn = Arc<dyn Fn(Alloc, Vec<Erased>) -> ReflectResult<Erased> + Send + Sync>;

/// Erased method callable: erased target + packed arguments in, erased
/// result out.
pub type MethodFn =
    Arc<dyn for<'a> Fn(TargetRef<'a>, Vec<Erased>) -> ReflectResult<Erased> + Send + Sync>;

/// A borrowed view of a call target, typed or erased.
pub enum TargetRef<'a> {
    /// A concrete `&T` supplied by a type-aware caller.
    Typed {
        /// The target as `dyn Any`.
        any: &'a dyn Any,
        /// Uid of the concrete target type.
        uid: TypeUid,
    },
    /// The payload of an erased object handle.
    Erased(&'a Erased),
}

impl<'a> TargetRef<'a> {
    /// View a concrete reference as a call target.
    pub fn typed<T: 'static>(target: &'a T) -> Self {
        TargetRef::Typed {
            any: target,
            uid: uid_of::<T>(),
        }
    }

    /// Logical type uid of the target.
    pub fn uid(&self) -> TypeUid {
        match self {
            TargetRef::Typed { uid, .. } => *uid,
            TargetRef::Erased(e) => e.uid(),
        }
    }

    /// Extract the target as `&T`.
    ///
    /// For erased targets this recognizes direct values and the `RBox`
    /// wrapper shape; an unrecognized wrapper shape is reported as
    /// `UnsupportedWrapper`.
    pub fn deref_as<T: 'static>(&self) -> ReflectResult<&T> {
        match self {
            TargetRef::Typed { any, uid } => {
                any.downcast_ref::<T>()
                    .ok_or_else(|| ReflectError::TargetMismatch {
                        expected: std::any::type_name::<T>(),
                        got: name_of(*uid),
                    })
            }
            TargetRef::Erased(e) => e.view_as::<T>().map_err(|err| match err {
                ReflectError::ConversionFailed { from, to } => ReflectError::TargetMismatch {
                    expected: to,
                    got: from,
                },
                other => other,
            }),
        }
    }
}

/// The erased callable held by an overload.
#[derive(Clone)]
pub enum OverloadFn {
    /// Constructor: takes an allocation strategy instead of a target.
    Ctor(CtorFn),
    /// Member method: takes a call target.
    Method(MethodFn),
}

/// One registered signature plus its erased function pointer.
#[derive(Clone)]
pub struct Overload {
    strict: SigId,
    normal: SigId,
    ret: TypeUid,
    any_ref_mut: bool,
    call: OverloadFn,
}

impl Overload {
    pub(crate) fn new(
        strict: SigId,
        normal: SigId,
        ret: TypeUid,
        any_ref_mut: bool,
        call: OverloadFn,
    ) -> Self {
        Overload {
            strict,
            normal,
            ret,
            any_ref_mut,
            call,
        }
    }

    /// Strict signature id (exact calling conventions).
    pub fn strict_sig(&self) -> SigId {
        self.strict
    }

    /// Normal signature id (conventions collapsed).
    pub fn normal_sig(&self) -> SigId {
        self.normal
    }

    /// Uid of the value this overload returns.
    pub fn ret_uid(&self) -> TypeUid {
        self.ret
    }

    /// Whether any parameter takes an exclusive reference.
    pub fn any_ref_mut(&self) -> bool {
        self.any_ref_mut
    }

    pub(crate) fn invoke_ctor(&self, alloc: Alloc, args: Vec<Erased>) -> ReflectResult<Erased> {
        match &self.call {
            OverloadFn::Ctor(f) => f(alloc, args),
            OverloadFn::Method(_) => Err(ReflectError::SignatureMismatch),
        }
    }

    pub(crate) fn invoke_method(
        &self,
        target: TargetRef<'_>,
        args: Vec<Erased>,
    ) -> ReflectResult<Erased> {
        match &self.call {
            OverloadFn::Method(f) => f(target, args),
            OverloadFn::Ctor(_) => Err(ReflectError::SignatureMismatch),
        }
    }
}

impl std::fmt::Debug for Overload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overload")
            .field("strict", &self.strict)
            .field("normal", &self.normal)
            .field("ret", &name_of(self.ret))
            .field("any_ref_mut", &self.any_ref_mut)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustra_core::RBox;

    #[test]
    fn test_target_ref_typed() {
        let n = 5i32;
        let t = TargetRef::typed(&n);
        assert_eq!(t.uid(), uid_of::<i32>());
        assert_eq!(t.deref_as::<i32>().copied(), Ok(5));
        assert!(matches!(
            t.deref_as::<String>(),
            Err(ReflectError::TargetMismatch { .. })
        ));
    }

    #[test]
    fn test_target_ref_erased_value_and_wrapper() {
        let v = Erased::value(3u64);
        let t = TargetRef::Erased(&v);
        assert_eq!(t.deref_as::<u64>().copied(), Ok(3));

        let w = Erased::wrapper(RBox::new(9u64));
        let t = TargetRef::Erased(&w);
        assert_eq!(t.uid(), uid_of::<u64>());
        assert_eq!(t.deref_as::<u64>().copied(), Ok(9));
    }

    #[test]
    fn test_target_ref_erased_mismatch() {
        let v = Erased::value(3u64);
        let t = TargetRef::Erased(&v);
        assert!(matches!(
            t.deref_as::<String>(),
            Err(ReflectError::TargetMismatch { .. })
        ));
    }
}
