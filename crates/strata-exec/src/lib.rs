//! Portable parallel loop abstraction for the Strata runtime.
//!
//! A task body iterates a 3D [`BlockRange`] through [`parallel_for`] or
//! the reduction loops, and the same functor runs unchanged under the
//! serial, shared-memory, or device execution policy. The policy is
//! resolved once per task at graph-build time; loop call sites never
//! re-branch on hardware.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod loops;
pub mod pool;
pub mod range;
pub mod space;

pub use loops::{
    parallel_for, parallel_reduce_min, parallel_reduce_sum, serial_for, ExecPolicy,
};
pub use pool::WorkerPool;
pub use range::BlockRange;
pub use space::{Capabilities, ExecutionSpace};
