//! Entity kind tagging for erased payloads.
//!
//! Every [`Erased`](crate::value::Erased) value carries an `EntityKind`
//! describing how its payload is held. Downstream code trusts this tag
//! instead of re-inspecting the payload, so every operation that
//! produces or forwards an erased value must set it consistently.

/// How an erased payload is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityKind {
    /// No payload, or the result of a failed operation.
    #[default]
    None,
    /// Payload held directly by value.
    Value,
    /// Payload is a non-owning view of storage with a known lifetime.
    Ptr,
    /// Payload held inside an owning handle (`RBox`).
    Wrapper,
}

impl EntityKind {
    /// Short name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::None => "none",
            EntityKind::Value => "value",
            EntityKind::Ptr => "ptr",
            EntityKind::Wrapper => "wrapper",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
