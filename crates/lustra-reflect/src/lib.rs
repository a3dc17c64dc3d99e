//! Lustra reflect - records, overload resolution, and dispatch
//!
//! The engine layer of the Lustra runtime reflection engine. Types are
//! described to the engine once, through [`RecordBuilder`], and from
//! then on can be constructed and called entirely through erased
//! handles:
//!
//! - [`Record`] holds one registered type's constructors and methods
//!   and resolves them against requested signatures;
//! - [`Constructor`] and [`MethodHandle`] are the per-call dispatch
//!   handles, bindable along three independent axes (target, arguments,
//!   return) in any mix of concrete and erased;
//! - [`RObject`] owns a constructed instance in erased form;
//! - the conversion table ([`push_conversion`]/[`convert`]) performs
//!   registered one-hop value conversions.
//!
//! All resolution failures are values: a missing record or method is
//! `None`, and every mismatch is a [`ReflectError`] carried by the
//! handle or returned from the call.

#![warn(missing_docs)]

pub mod builder;
pub mod convert;
pub mod dispatch;
pub mod method;
pub mod object;
pub mod overload;
pub mod record;
pub mod registry;

pub use builder::RecordBuilder;
pub use convert::{convert, push_conversion, register_text_conversions, CharSeq, ConversionFn};
pub use dispatch::{Constructor, MethodArgs, MethodBind, MethodHandle};
pub use method::Method;
pub use object::{Alloc, RObject};
pub use overload::{CtorFn, MethodFn, Overload, OverloadFn, TargetRef};
pub use record::{CopyFn, Record};
pub use registry::{lookup_record, register_record};

// Re-exported so downstream users need only this crate.
pub use lustra_core::{
    sig_of, uid_of, ByRef, ByRefMut, ByVal, EntityKind, Erased, RBox, ReflectError, ReflectResult,
    Return, SigId, TypeUid,
};
