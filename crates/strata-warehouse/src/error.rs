//! Warehouse access errors.
//!
//! Every variant here signals a defect in task dependency declarations
//! or problem setup, never a transient condition. The scheduler treats
//! them as fatal and aborts the step.

use std::error::Error;
use std::fmt;

use strata_core::{Generation, PatchId, VariableLabel};

use crate::key::Key;

/// A warehouse access violated the single-writer discipline or asked
/// for data that was never committed.
#[derive(Clone, Debug, PartialEq)]
pub enum WarehouseError {
    /// A second `put` landed on a key already committed this timestep.
    DoubleWrite {
        /// Variable name, for diagnostics.
        name: String,
        /// The key written twice.
        key: Key,
    },
    /// A read addressed a key with no committed buffer.
    GetMissing {
        /// Variable name, for diagnostics.
        name: String,
        /// The key that was read.
        key: Key,
        /// The generation the read addressed.
        generation: Generation,
    },
    /// A ghost-inclusive read asked for more layers than the level
    /// supports.
    GhostExceeded {
        /// The key that was read.
        key: Key,
        /// Requested ghost extent.
        requested: i32,
        /// The level's configured maximum.
        max: i32,
    },
    /// The named patch does not exist on the warehouse's level.
    UnknownPatch {
        /// The offending id.
        patch: PatchId,
    },
    /// The label was never registered with this warehouse's registry.
    UnknownLabel {
        /// The offending label.
        label: VariableLabel,
    },
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleWrite { name, key } => write!(
                f,
                "double write of variable '{name}' ({key}); each key has exactly one producer per timestep"
            ),
            Self::GetMissing { name, key, generation } => write!(
                f,
                "read of variable '{name}' ({key}) found nothing in the {generation} generation"
            ),
            Self::GhostExceeded { key, requested, max } => write!(
                f,
                "ghost extent {requested} on {key} exceeds the level maximum of {max}"
            ),
            Self::UnknownPatch { patch } => {
                write!(f, "patch {patch} does not exist on this level")
            }
            Self::UnknownLabel { label } => {
                write!(f, "label #{label} is not registered")
            }
        }
    }
}

impl Error for WarehouseError {}
