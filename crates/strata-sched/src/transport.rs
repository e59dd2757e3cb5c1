//! The ghost-delivery seam between the scheduler and the memory layout.
//!
//! Before a node with ghost requirements becomes ready, the scheduler
//! asks the transport to complete every region delivery. Delivery is
//! synchronous: when `deliver` returns, the dependent may read the
//! region through a warehouse view. [`LocalTransport`] covers the
//! single-process case; a rank-to-rank transport plugs in here without
//! touching the scheduler.

use std::fmt;

use strata_core::{MaterialId, PatchId, VariableLabel};
use strata_exec::BlockRange;

use crate::error::TransportError;

/// One region delivery: cells of `label` owned by `source`, needed by
/// `dest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostRequest {
    /// The variable being moved.
    pub label: VariableLabel,
    /// The material index.
    pub material: MaterialId,
    /// Patch that owns the cells.
    pub source: PatchId,
    /// Patch whose view needs them.
    pub dest: PatchId,
    /// The cell box, in global coordinates.
    pub region: BlockRange,
}

/// Moves ghost-cell data between patches ahead of a dependent task.
pub trait GhostTransport: fmt::Debug {
    /// Complete one delivery, returning the number of cells moved.
    fn deliver(&self, request: &GhostRequest) -> Result<usize, TransportError>;
}

/// Transport for runs where every patch shares the process.
///
/// All committed buffers already live in the one warehouse, so views
/// assemble halos by direct copy and delivery is complete as soon as
/// the producer is. `deliver` only accounts for the cells.
#[derive(Debug, Default)]
pub struct LocalTransport;

impl GhostTransport for LocalTransport {
    fn deliver(&self, request: &GhostRequest) -> Result<usize, TransportError> {
        Ok(request.region.size())
    }
}
