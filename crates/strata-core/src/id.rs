//! Strongly-typed identifiers used as map keys across the runtime.

use std::fmt;

/// Identifies a patch within a level.
///
/// Patches are created at grid decomposition and assigned sequential IDs.
/// The ID is opaque and stable for the lifetime of the run — it is never
/// derived from pointer identity, so it is usable as a map key across
/// process boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub u32);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PatchId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a material (a coexisting physical phase) within a run.
///
/// Materials are registered once at problem setup and assigned
/// sequential IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MaterialId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing timestep counter.
///
/// Incremented each time the warehouse generations rotate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestepId(pub u64);

impl fmt::Display for TimestepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TimestepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Selects which warehouse generation a read addresses.
///
/// `Old` is the state as of the end of the previous timestep; `New` is
/// data produced earlier in the current timestep by an upstream task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Generation {
    /// The rotated-out generation from the previous timestep.
    Old,
    /// The generation being produced this timestep.
    New,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}
