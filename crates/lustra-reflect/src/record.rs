//! Records: reflected metadata for one registered type.
//!
//! A [`Record`] is the sole authority for resolving constructors and
//! methods of its type. Records are built once during registration,
//! shared behind an `Arc`, and never mutated afterwards; lookups hand
//! out cheap clones.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use lustra_core::{sig_of, uid_of, ArgPack, Erased, ReflectError, ReflectResult, TypeUid};

use crate::dispatch::Constructor;
use crate::method::Method;
use crate::object::Alloc;
use crate::overload::TargetRef;

/// Erased deep-copy callable registered alongside a record's copy
/// constructor; drives `RObject::clone_with`.
pub type CopyFn =
    Arc<dyn for<'a> Fn(TargetRef<'a>, Alloc) -> ReflectResult<Erased> + Send + Sync>;

struct RecordInner {
    name: Arc<str>,
    namespace: Arc<str>,
    uid: TypeUid,
    methods: FxHashMap<String, Method>,
    copier: Option<CopyFn>,
}

/// Reflected metadata for one registered class/struct.
#[derive(Clone)]
pub struct Record(Arc<RecordInner>);

impl Record {
    pub(crate) fn new(
        name: &str,
        namespace: &str,
        uid: TypeUid,
        methods: FxHashMap<String, Method>,
        copier: Option<CopyFn>,
    ) -> Self {
        Record(Arc::new(RecordInner {
            name: Arc::from(name),
            namespace: Arc::from(namespace),
            uid,
            methods,
            copier,
        }))
    }

    /// Registered record name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Registered namespace.
    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    /// Uid of the reflected type.
    pub fn uid(&self) -> TypeUid {
        self.0.uid
    }

    /// Look up a method by name. Absence is `None`, not an error.
    pub fn get_method(&self, name: &str) -> Option<Method> {
        self.0.methods.get(name).cloned()
    }

    /// Names of all registered methods, in no particular order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.0.methods.keys().map(String::as_str)
    }

    pub(crate) fn copier(&self) -> Option<&CopyFn> {
        self.0.copier.as_ref()
    }

    /// Constructors are stored under the record's own name.
    fn ctor_method(&self) -> Option<&Method> {
        self.0.methods.get(&*self.0.name)
    }

    /// Resolve the default constructor.
    ///
    /// The zero-argument form is matched by strict id: the registered
    /// overload's strict signature must equal the signature of the
    /// implicit allocation-strategy parameter itself.
    pub fn constructor0(&self) -> Constructor {
        let strict = sig_of(&[uid_of::<Alloc>()]);
        let picked = self.ctor_method().and_then(|m| {
            m.overloads()
                .iter()
                .find(|o| o.strict_sig() == strict)
                .cloned()
        });
        match picked {
            Some(overload) => Constructor::resolved(self.clone(), vec![overload]),
            None => Constructor::unresolved(self.clone(), ReflectError::SignatureMismatch),
        }
    }

    /// Resolve a constructor against the requested argument types.
    ///
    /// Normal-id matches are classified into the exact-value and
    /// exact-reference slots plus extras; the returned handle carries
    /// `SignatureMismatch` if nothing matched and short-circuits when
    /// invoked.
    pub fn constructor<A: ArgPack>(&self) -> Constructor {
        let requested = A::args_sig();
        let ranked = self
            .ctor_method()
            .map(|m| {
                m.select(requested)
                    .ranked()
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if ranked.is_empty() {
            Constructor::unresolved(self.clone(), ReflectError::SignatureMismatch)
        } else {
            Constructor::resolved(self.clone(), ranked)
        }
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.0.name)
            .field("namespace", &self.0.namespace)
            .field("methods", &self.0.methods.len())
            .finish()
    }
}
