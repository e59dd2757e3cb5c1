//! Core types for the Strata simulation runtime.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers shared across the Strata workspace: variable labels
//! and their registry, patch and material ids, and the old/new
//! generation selector.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod label;
pub mod material;

pub use error::RegistryError;
pub use id::{Generation, MaterialId, PatchId, TimestepId};
pub use label::{LabelDef, LabelRegistry, StorageKind, ValueKind, VariableLabel};
pub use material::{MaterialRegistry, MaterialSubset};
