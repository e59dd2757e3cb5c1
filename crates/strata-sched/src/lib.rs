//! Task declaration, dispatch and dependency-ordered execution.
//!
//! A [`Task`] declares what it reads and writes; the [`Schedule`]
//! resolves each task's hardware variant once at registration, builds a
//! per-patch dependency graph, and executes nodes in dependency order
//! against the warehouse. Every invariant violation is fatal: the step
//! aborts and the error names the offending task and key.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod scheduler;
pub mod task;
pub mod transport;

pub use dispatch::{resolve, PrepFlags, Resolved};
pub use error::{DispatchError, GraphError, RunError, TaskError, TransportError};
pub use graph::{TaskGraph, TaskState};
pub use metrics::StepMetrics;
pub use scheduler::Schedule;
pub use task::{Access, Dependency, PatchSelector, Task, TaskContext, TaskFn, TaskVariants};
pub use transport::{GhostRequest, GhostTransport, LocalTransport};
