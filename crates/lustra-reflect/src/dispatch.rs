//! Dispatch layer: binding, resolution, and invocation handles.
//!
//! Handles are short-lived, per-call objects produced by binding a
//! record or method to zero or more compile-time-known types. Binding
//! is orthogonal along three axes - target, arguments, return - and any
//! combination of concrete and erased is legal; all of them run the
//! same overload classification from [`Method::select`]. Resolution
//! failures are captured into the handle and returned as error values
//! when invoked, never thrown.

use lustra_core::uid::name_of;
use lustra_core::{sig_of, uid_of, ArgPack, Erased, ReflectError, ReflectResult, Return, TypeUid};

use crate::method::Method;
use crate::object::{Alloc, RObject};
use crate::overload::{Overload, TargetRef};
use crate::record::Record;

// ============================================================================
// Constructor handle
// ============================================================================

/// A resolved (or failed) constructor binding.
///
/// Produced by [`Record::constructor`] / [`Record::constructor0`];
/// holds the matched overloads in priority order plus an init error.
pub struct Constructor {
    record: Record,
    ranked: Vec<Overload>,
    err: Option<ReflectError>,
}

impl Constructor {
    pub(crate) fn resolved(record: Record, ranked: Vec<Overload>) -> Self {
        Constructor {
            record,
            ranked,
            err: None,
        }
    }

    pub(crate) fn unresolved(record: Record, err: ReflectError) -> Self {
        Constructor {
            record,
            ranked: Vec::new(),
            err: Some(err),
        }
    }

    /// Whether resolution succeeded.
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// The captured resolution error, if any.
    pub fn init_error(&self) -> Option<&ReflectError> {
        self.err.as_ref()
    }

    /// Construct an instance from typed arguments.
    pub fn invoke<A: ArgPack>(&self, alloc: Alloc, args: A) -> ReflectResult<RObject> {
        self.invoke_erased(alloc, args.pack())
    }

    /// Construct an instance from pre-erased arguments.
    pub fn invoke_erased(&self, alloc: Alloc, args: Vec<Erased>) -> ReflectResult<RObject> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        let overload = self.ranked.first().ok_or(ReflectError::SignatureMismatch)?;
        let value = overload.invoke_ctor(alloc, args)?;
        Ok(RObject::new(self.record.clone(), value))
    }
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("record", &self.record.name())
            .field("candidates", &self.ranked.len())
            .field("err", &self.err)
            .finish()
    }
}

// ============================================================================
// Method binding chain
// ============================================================================

impl Method {
    /// Bind a concrete target type.
    pub fn target<T: 'static>(&self) -> MethodBind {
        MethodBind {
            method: self.clone(),
            target: Some(uid_of::<T>()),
        }
    }

    /// Leave the target erased (resolved per call against the supplied
    /// object's record identity).
    pub fn target_erased(&self) -> MethodBind {
        MethodBind {
            method: self.clone(),
            target: None,
        }
    }
}

/// Binding step: target chosen, arguments pending.
pub struct MethodBind {
    method: Method,
    target: Option<TypeUid>,
}

impl MethodBind {
    /// Bind concrete argument types; resolution happens immediately.
    pub fn args<A: ArgPack>(self) -> MethodArgs {
        MethodArgs {
            method: self.method,
            target: self.target,
            requested: Some(A::args_sig()),
        }
    }

    /// Leave arguments erased; resolution is deferred to each call and
    /// runs against the supplied values' type uids.
    pub fn args_erased(self) -> MethodArgs {
        MethodArgs {
            method: self.method,
            target: self.target,
            requested: None,
        }
    }
}

/// Binding step: target and arguments chosen, return pending.
pub struct MethodArgs {
    method: Method,
    target: Option<TypeUid>,
    requested: Option<lustra_core::SigId>,
}

impl MethodArgs {
    /// Bind a concrete return type.
    pub fn returning<R: 'static>(self) -> MethodHandle {
        self.finish(Some(uid_of::<R>()))
    }

    /// Leave the return erased; results come back as [`Return`].
    pub fn returning_erased(self) -> MethodHandle {
        self.finish(None)
    }

    fn finish(self, ret: Option<TypeUid>) -> MethodHandle {
        let mut err = None;

        if let Some(bound) = self.target {
            if bound != self.method.owner() {
                err = Some(ReflectError::TargetMismatch {
                    expected: name_of(self.method.owner()),
                    got: name_of(bound),
                });
            }
        }

        let mut ranked = Vec::new();
        if err.is_none() {
            if let Some(requested) = self.requested {
                ranked = self
                    .method
                    .select(requested)
                    .ranked()
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>();
                if ranked.is_empty() {
                    err = Some(ReflectError::SignatureMismatch);
                } else if let Some(bound_ret) = ret {
                    let actual = ranked[0].ret_uid();
                    if actual != bound_ret {
                        err = Some(ReflectError::ReturnMismatch {
                            expected: name_of(bound_ret),
                            got: name_of(actual),
                        });
                    }
                }
            }
        }

        MethodHandle {
            method: self.method,
            ranked,
            deferred: self.requested.is_none(),
            bound_ret: ret,
            err,
        }
    }
}

/// A resolved (or failed) method binding.
pub struct MethodHandle {
    method: Method,
    ranked: Vec<Overload>,
    deferred: bool,
    bound_ret: Option<TypeUid>,
    err: Option<ReflectError>,
}

impl MethodHandle {
    /// Whether binding succeeded (deferred-argument handles report
    /// `true` until a call observes a mismatch).
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// The captured binding error, if any.
    pub fn init_error(&self) -> Option<&ReflectError> {
        self.err.as_ref()
    }

    /// Invoke against an erased target with pre-erased arguments.
    ///
    /// This is the single dispatch path; the typed entry points wrap
    /// it. Deferred-argument handles resolve here, against a signature
    /// computed from the supplied values.
    pub fn invoke(&self, target: TargetRef<'_>, args: Vec<Erased>) -> ReflectResult<Return> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if target.uid() != self.method.owner() {
            return Err(ReflectError::TargetMismatch {
                expected: name_of(self.method.owner()),
                got: name_of(target.uid()),
            });
        }

        let overload = match self.ranked.first() {
            Some(overload) => overload.clone(),
            None if self.deferred => {
                let uids = args.iter().map(Erased::uid).collect::<Vec<_>>();
                let sel = self.method.select(sig_of(&uids));
                let ranked = sel.ranked();
                let best = *ranked.first().ok_or(ReflectError::SignatureMismatch)?;
                if let Some(bound_ret) = self.bound_ret {
                    if best.ret_uid() != bound_ret {
                        return Err(ReflectError::ReturnMismatch {
                            expected: name_of(bound_ret),
                            got: name_of(best.ret_uid()),
                        });
                    }
                }
                best.clone()
            }
            None => return Err(ReflectError::SignatureMismatch),
        };

        overload.invoke_method(target, args).map(Return::from)
    }

    /// Invoke with a concrete target and typed arguments, extracting a
    /// typed result.
    pub fn call<T: 'static, A: ArgPack, R: 'static>(
        &self,
        target: &T,
        args: A,
    ) -> ReflectResult<R> {
        let ret = self.invoke(TargetRef::typed(target), args.pack())?;
        let got = name_of(ret.uid());
        ret.take::<R>().ok_or(ReflectError::ReturnMismatch {
            expected: std::any::type_name::<R>(),
            got,
        })
    }

    /// Invoke against an erased object handle, keeping the result
    /// erased.
    pub fn call_obj<A: ArgPack>(&self, target: &RObject, args: A) -> ReflectResult<Return> {
        self.invoke(target.target_ref(), args.pack())
    }
}

impl std::fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandle")
            .field("method", &self.method.name())
            .field("candidates", &self.ranked.len())
            .field("deferred", &self.deferred)
            .field("err", &self.err)
            .finish()
    }
}
