//! Erased object handles and allocation strategies.
//!
//! An [`RObject`] owns one constructed instance in erased form and
//! carries the [`Record`] it was constructed from, so methods can be
//! re-resolved against it at any time. Payload ownership is exclusive;
//! duplicating an object goes through [`RObject::clone_with`], which
//! deep-copies via the record's registered copy path.

use lustra_core::{Erased, EntityKind, ReflectError, ReflectResult};

use crate::overload::TargetRef;
use crate::record::Record;

/// Allocation strategy for constructed instances.
///
/// `Stack` holds the instance payload directly by value; `Heap` holds
/// it inside the owning wrapper (`RBox`). The strategy is also the
/// implicit parameter whose signature identifies default constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alloc {
    /// Payload held directly by value (kind `Value`).
    Stack,
    /// Payload held inside the owning wrapper (kind `Wrapper`).
    Heap,
}

/// An owning, type-erased handle to a constructed instance.
pub struct RObject {
    record: Record,
    value: Erased,
}

impl RObject {
    pub(crate) fn new(record: Record, value: Erased) -> Self {
        RObject { record, value }
    }

    /// The record this instance was constructed from.
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// How the instance payload is held.
    pub fn kind(&self) -> EntityKind {
        self.value.kind()
    }

    /// Attempt to view the instance as `&T`.
    pub fn view<T: 'static>(&self) -> Option<&T> {
        self.value.view::<T>()
    }

    /// Borrow the instance as an erased call target.
    pub fn target_ref(&self) -> TargetRef<'_> {
        TargetRef::Erased(&self.value)
    }

    /// Consume the handle, yielding the owned instance.
    pub fn take<T: 'static>(self) -> Option<T> {
        self.value.take::<T>()
    }

    /// Deep-copy the instance under the requested allocation strategy.
    ///
    /// Copying runs through the record's registered copy path, so the
    /// clone has state equal to the source at copy time and a fully
    /// independent lifetime. A record with no registered copy path
    /// yields `SignatureMismatch`, matching an absent copy constructor.
    pub fn clone_with(&self, alloc: Alloc) -> ReflectResult<RObject> {
        let copier = self
            .record
            .copier()
            .ok_or(ReflectError::SignatureMismatch)?;
        let value = copier(self.target_ref(), alloc)?;
        Ok(RObject::new(self.record.clone(), value))
    }
}

impl std::fmt::Debug for RObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RObject({}, {:?})", self.record.name(), self.value)
    }
}
