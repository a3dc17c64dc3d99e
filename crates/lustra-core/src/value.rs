//! Type-erased value containers.
//!
//! [`Erased`] is the universal in-flight value: a type tag
//! ([`TypeUid`]), an [`EntityKind`] describing how the payload is held,
//! and the boxed payload itself. All access is through fallible
//! `view`/`take` accessors; there is no unchecked cast anywhere.
//!
//! [`RBox`] is the single owning wrapper shape the engine recognizes
//! for `Wrapper`-kind payloads. A `Wrapper` payload held in any other
//! shape is a reportable misconfiguration and surfaces as
//! [`ReflectError::UnsupportedWrapper`], never a silent success.

use std::any::Any;
use std::ptr::NonNull;

use crate::error::{ReflectError, ReflectResult};
use crate::kind::EntityKind;
use crate::uid::{name_of, uid_of, TypeUid};

/// The owning wrapper shape recognized for `Wrapper`-kind payloads.
pub struct RBox<T>(Box<T>);

impl<T> RBox<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        RBox(Box::new(value))
    }

    /// Unwrap into the owned value.
    pub fn into_inner(self) -> T {
        *self.0
    }
}

impl<T> std::ops::Deref for RBox<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for RBox<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

/// Payload form for `Ptr`-kind values created from a reference.
///
/// Only constructed through [`Erased::pointer`], whose safety contract
/// guarantees the referent outlives the erased value; the safe `view`
/// path relies on that contract when dereferencing.
struct ErasedPtr<T>(NonNull<T>);

/// A type-erased value: type tag + entity kind + boxed payload.
pub struct Erased {
    uid: TypeUid,
    kind: EntityKind,
    payload: Option<Box<dyn Any>>,
}

impl Erased {
    /// The empty value (no payload, kind `None`).
    pub fn none() -> Self {
        Erased {
            uid: TypeUid::NIL,
            kind: EntityKind::None,
            payload: None,
        }
    }

    /// Erase a directly-held value (kind `Value`).
    pub fn value<T: 'static>(value: T) -> Self {
        Erased {
            uid: uid_of::<T>(),
            kind: EntityKind::Value,
            payload: Some(Box::new(value)),
        }
    }

    /// Erase a value held inside the owning wrapper (kind `Wrapper`).
    ///
    /// The recorded uid is the logical type `T`, not the wrapper shape.
    pub fn wrapper<T: 'static>(value: RBox<T>) -> Self {
        Erased {
            uid: uid_of::<T>(),
            kind: EntityKind::Wrapper,
            payload: Some(Box::new(value)),
        }
    }

    /// Erase a non-owning pointer to `value` (kind `Ptr`).
    ///
    /// # Safety
    /// The referent must outlive every use of the returned `Erased`.
    /// The safe `view` accessor dereferences this pointer on the
    /// assumption that the caller upheld this contract.
    pub unsafe fn pointer<T: 'static>(value: &T) -> Self {
        Erased {
            uid: uid_of::<T>(),
            kind: EntityKind::Ptr,
            payload: Some(Box::new(ErasedPtr(NonNull::from(value)))),
        }
    }

    /// Erase a pointer-like view object held directly (kind `Ptr`).
    ///
    /// Used by conversions whose result is itself a raw view (e.g. a
    /// character-sequence view into a source string): the payload is
    /// the view value, the kind records that it does not own the
    /// storage it points into.
    pub fn pointer_view<T: 'static>(view: T) -> Self {
        Erased {
            uid: uid_of::<T>(),
            kind: EntityKind::Ptr,
            payload: Some(Box::new(view)),
        }
    }

    /// Assemble from raw parts.
    ///
    /// This is the extension seam for payloads held in shapes the
    /// engine does not construct itself; such payloads are extracted
    /// only if a `view` arm recognizes the shape, and otherwise report
    /// `UnsupportedWrapper`.
    pub fn from_parts(uid: TypeUid, kind: EntityKind, payload: Box<dyn Any>) -> Self {
        Erased {
            uid,
            kind,
            payload: Some(payload),
        }
    }

    /// Logical type uid of the payload (`TypeUid::NIL` when empty).
    pub fn uid(&self) -> TypeUid {
        self.uid
    }

    /// How the payload is held.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether this is the empty value.
    pub fn is_none(&self) -> bool {
        self.payload.is_none()
    }

    /// Recorded name of the payload type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        name_of(self.uid)
    }

    /// Attempt to view the payload as `&T`.
    ///
    /// Recognizes a directly-held `T` (kinds `Value` and `Ptr` views),
    /// an `RBox<T>` wrapper, and a `Ptr` payload created from a
    /// reference to `T`.
    pub fn view<T: 'static>(&self) -> Option<&T> {
        let any = self.payload.as_deref()?;
        if let Some(v) = any.downcast_ref::<T>() {
            return Some(v);
        }
        match self.kind {
            EntityKind::Wrapper => any.downcast_ref::<RBox<T>>().map(|b| &**b),
            EntityKind::Ptr => any
                .downcast_ref::<ErasedPtr<T>>()
                // Valid per the `Erased::pointer` safety contract.
                .map(|p| unsafe { p.0.as_ref() }),
            _ => None,
        }
    }

    /// View the payload as `&T`, reporting why extraction failed.
    ///
    /// A `Wrapper` payload whose logical type matches but whose shape
    /// is not `RBox<T>` reports `UnsupportedWrapper`; every other
    /// failure reports `ConversionFailed`.
    pub fn view_as<T: 'static>(&self) -> ReflectResult<&T> {
        if let Some(v) = self.view::<T>() {
            return Ok(v);
        }
        if self.kind == EntityKind::Wrapper && self.uid == uid_of::<T>() {
            return Err(ReflectError::UnsupportedWrapper {
                expected: std::any::type_name::<T>(),
                got: self.type_name(),
            });
        }
        Err(ReflectError::ConversionFailed {
            from: self.type_name(),
            to: std::any::type_name::<T>(),
        })
    }

    /// Consume the payload as an owned `T`.
    ///
    /// Succeeds for a directly-held `T` or an `RBox<T>` wrapper;
    /// `Ptr`-kind payloads created from references cannot yield
    /// ownership and return `None`.
    pub fn take<T: 'static>(mut self) -> Option<T> {
        let payload = self.payload.take()?;
        match payload.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(payload) => match payload.downcast::<RBox<T>>() {
                Ok(b) => Some(b.into_inner()),
                Err(_) => None,
            },
        }
    }
}

impl std::fmt::Debug for Erased {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "Erased::None")
        } else {
            write!(f, "Erased::{}({})", self.kind, self.type_name())
        }
    }
}

/// Type-erased call result.
///
/// Owns the returned value until it is consumed or dropped; access is
/// through the fallible typed-view accessors.
pub struct Return {
    inner: Erased,
}

impl Return {
    /// Wrap an erased value as a call result.
    pub fn from_erased(inner: Erased) -> Self {
        Return { inner }
    }

    /// Whether the held value can be viewed as `T`.
    pub fn can_view_as<T: 'static>(&self) -> bool {
        self.inner.view::<T>().is_some()
    }

    /// Attempt to view the held value as `&T`.
    pub fn view<T: 'static>(&self) -> Option<&T> {
        self.inner.view::<T>()
    }

    /// Consume the result as an owned `T`.
    pub fn take<T: 'static>(self) -> Option<T> {
        self.inner.take::<T>()
    }

    /// How the held value is stored.
    pub fn kind(&self) -> EntityKind {
        self.inner.kind()
    }

    /// Logical type uid of the held value.
    pub fn uid(&self) -> TypeUid {
        self.inner.uid()
    }

    /// Unwrap back into the erased form.
    pub fn into_erased(self) -> Erased {
        self.inner
    }
}

impl From<Erased> for Return {
    fn from(inner: Erased) -> Self {
        Return::from_erased(inner)
    }
}

impl std::fmt::Debug for Return {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Return({:?})", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none() {
        let e = Erased::none();
        assert!(e.is_none());
        assert_eq!(e.kind(), EntityKind::None);
        assert_eq!(e.uid(), TypeUid::NIL);
        assert!(e.view::<i32>().is_none());
    }

    #[test]
    fn test_value_roundtrip() {
        let e = Erased::value(42i32);
        assert_eq!(e.kind(), EntityKind::Value);
        assert_eq!(e.uid(), uid_of::<i32>());
        assert_eq!(e.view::<i32>(), Some(&42));
        assert!(e.view::<i64>().is_none());
        assert_eq!(e.take::<i32>(), Some(42));
    }

    #[test]
    fn test_wrapper_roundtrip() {
        let e = Erased::wrapper(RBox::new("hello".to_string()));
        assert_eq!(e.kind(), EntityKind::Wrapper);
        // Uid is the logical type, not the wrapper shape.
        assert_eq!(e.uid(), uid_of::<String>());
        assert_eq!(e.view::<String>().map(String::as_str), Some("hello"));
        assert_eq!(e.take::<String>().as_deref(), Some("hello"));
    }

    #[test]
    fn test_pointer_view() {
        let held = 7u64;
        let e = unsafe { Erased::pointer(&held) };
        assert_eq!(e.kind(), EntityKind::Ptr);
        assert_eq!(e.view::<u64>(), Some(&7));
        // Non-owning: ownership cannot be taken out of a pointer.
        assert!(e.take::<u64>().is_none());
    }

    #[test]
    fn test_unrecognized_wrapper_shape() {
        // A Wrapper-kind payload held in a foreign shape (here a plain
        // std Box around an Arc) is reported, not guessed at.
        let foreign = std::sync::Arc::new(5i32);
        let e = Erased::from_parts(uid_of::<i32>(), EntityKind::Wrapper, Box::new(foreign));
        assert!(e.view::<i32>().is_none());
        match e.view_as::<i32>() {
            Err(ReflectError::UnsupportedWrapper { .. }) => {}
            other => panic!("expected UnsupportedWrapper, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_view_as_type_mismatch() {
        let e = Erased::value(1i32);
        match e.view_as::<String>() {
            Err(ReflectError::ConversionFailed { .. }) => {}
            other => panic!("expected ConversionFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_return_views() {
        let r = Return::from_erased(Erased::value("x".to_string()));
        assert!(r.can_view_as::<String>());
        assert!(!r.can_view_as::<i32>());
        assert_eq!(r.view::<String>().map(String::as_str), Some("x"));
        assert_eq!(r.take::<String>().as_deref(), Some("x"));
    }
}
