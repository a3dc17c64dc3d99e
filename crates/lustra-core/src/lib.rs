//! Lustra core - type identity and erased values
//!
//! This crate provides the value layer of the Lustra runtime reflection
//! engine: process-stable type identities (`TypeUid`, `SigId`), the
//! entity-kind tag attached to every erased payload (`EntityKind`), the
//! type-erased value container (`Erased`) with its owning wrapper shape
//! (`RBox`), the erased call result (`Return`), and the shared error
//! type (`ReflectError`).
//!
//! The engine layer (records, overload tables, dispatch, conversions)
//! lives in `lustra-reflect` and is built entirely on these types.

#![warn(missing_docs)]

pub mod error;
pub mod kind;
pub mod uid;
pub mod value;

pub use error::{ReflectError, ReflectResult};
pub use kind::EntityKind;
pub use uid::{sig_of, uid_of, ArgPack, ByRef, ByRefMut, ByVal, Param, ParamList, SigId, TypeUid};
pub use value::{Erased, RBox, Return};
