//! The [`Patch`]: one rectangular sub-block of the decomposed domain.

use std::fmt;

use smallvec::SmallVec;
use strata_core::PatchId;
use strata_exec::BlockRange;

/// A rectangular sub-block of the simulation grid.
///
/// The unit of spatial decomposition and scheduling. Created at level
/// setup and read-only afterwards; identified by its opaque
/// [`PatchId`], never by address.
#[derive(Clone, Debug)]
pub struct Patch {
    id: PatchId,
    interior: BlockRange,
    allocation: BlockRange,
    spacing: [f64; 3],
    neighbors: SmallVec<[PatchId; 26]>,
}

impl Patch {
    pub(crate) fn new(
        id: PatchId,
        interior: BlockRange,
        allocation: BlockRange,
        spacing: [f64; 3],
    ) -> Self {
        Self {
            id,
            interior,
            allocation,
            spacing,
            neighbors: SmallVec::new(),
        }
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: SmallVec<[PatchId; 26]>) {
        self.neighbors = neighbors;
    }

    /// The patch's stable id.
    pub fn id(&self) -> PatchId {
        self.id
    }

    /// Interior index bounds `[low, high)`, excluding extra cells.
    pub fn interior(&self) -> BlockRange {
        self.interior
    }

    /// Allocation bounds: the interior plus extra cells on faces that
    /// touch the domain boundary. Buffers for this patch cover exactly
    /// this box.
    pub fn allocation_range(&self) -> BlockRange {
        self.allocation
    }

    /// The interior grown by `g` cells on every face.
    pub fn with_ghost(&self, g: i32) -> BlockRange {
        self.interior.grow(g)
    }

    /// Cell spacing per axis.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Adjacent patches (face, edge, and corner adjacency).
    pub fn neighbors(&self) -> &[PatchId] {
        &self.neighbors
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch {} {}", self.id, self.interior)
    }
}
