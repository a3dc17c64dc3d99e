//! Error types for the Lustra reflection engine.
//!
//! Expected failure modes (signature mismatches, failed coercions) are
//! returned as values, never panicked. Absent records/methods are
//! signalled with `Option::None` by the lookup APIs, not with an error
//! variant.

/// Result type for reflection calls.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Reflection error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// No registered overload matches the requested signature.
    #[error("no registered overload matches the requested signature")]
    SignatureMismatch,

    /// The bound target type does not match the invoked target.
    #[error("target type mismatch: expected {expected}, got {got}")]
    TargetMismatch {
        /// Type name the handle was bound to.
        expected: &'static str,
        /// Type name of the supplied target.
        got: &'static str,
    },

    /// The bound return type does not match the overload's return type.
    #[error("return type mismatch: expected {expected}, got {got}")]
    ReturnMismatch {
        /// Type name the handle was bound to.
        expected: &'static str,
        /// Type name the overload actually returns.
        got: &'static str,
    },

    /// An argument payload could not be extracted as the overload's
    /// parameter type.
    #[error("argument {index} type mismatch: expected {expected}")]
    ArgumentMismatch {
        /// Zero-based argument position.
        index: usize,
        /// Expected parameter type name.
        expected: &'static str,
    },

    /// An attempted type coercion failed.
    #[error("type conversion failed: {from} -> {to}")]
    ConversionFailed {
        /// Source type name.
        from: &'static str,
        /// Target type name.
        to: &'static str,
    },

    /// An erased payload is held in an owning handle shape the engine
    /// does not recognize. This is a reportable misconfiguration, not a
    /// silent fallback.
    #[error("unsupported wrapper shape holding {expected}: found {got}")]
    UnsupportedWrapper {
        /// Type the caller tried to extract.
        expected: &'static str,
        /// Type name recorded for the stored payload.
        got: &'static str,
    },
}
