//! Scheduling errors.
//!
//! Everything here is fatal. A dispatch or graph error is a
//! configuration defect caught before anything runs; a run error aborts
//! the step with no retry and no partial results, naming the offending
//! task and key so the driver can report it.

use std::error::Error;
use std::fmt;

use strata_core::PatchId;
use strata_exec::ExecutionSpace;
use strata_warehouse::{Key, WarehouseError};

/// No hardware variant of a task matches the run's configuration.
///
/// Raised at task registration, never mid-run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The task compiled no variant for any execution space this run
    /// can use.
    NoCompiledVariant {
        /// The offending task.
        task: String,
        /// The space the run's capabilities preferred.
        wanted: ExecutionSpace,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCompiledVariant { task, wanted } => write!(
                f,
                "task '{task}' has no compiled variant usable on this run (preferred space: {wanted})"
            ),
        }
    }
}

impl Error for DispatchError {}

/// The declared dependencies do not form a valid single-writer graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// Two tasks both declare `computes` on one key.
    DuplicateComputes {
        /// The later registrant.
        task: String,
        /// The task already holding the key.
        other_task: String,
        /// The key claimed twice.
        key: Key,
    },
    /// A new-generation requirement has no computing task.
    MissingProducer {
        /// The requiring task.
        task: String,
        /// The unproduced key.
        key: Key,
    },
    /// A task pairs `requires` and `computes` on one key; in-place
    /// updates must declare `modifies` instead.
    OverlappingRequiresComputes {
        /// The offending task.
        task: String,
        /// The overlapping key.
        key: Key,
    },
    /// A patch selector names a patch the level does not hold.
    UnknownPatch {
        /// The offending task.
        task: String,
        /// The nonexistent patch id.
        patch: PatchId,
    },
    /// New-generation requirements form a cycle.
    DependencyCycle {
        /// Tasks on the unresolvable cycle, in registration order.
        tasks: Vec<String>,
    },
    /// The schedule holds no tasks.
    EmptyGraph,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateComputes { task, other_task, key } => write!(
                f,
                "task '{task}' computes {key}, already computed by task '{other_task}'"
            ),
            Self::MissingProducer { task, key } => write!(
                f,
                "task '{task}' requires {key} from the new generation but no task computes it"
            ),
            Self::OverlappingRequiresComputes { task, key } => write!(
                f,
                "task '{task}' both requires and computes {key}; declare modifies for in-place updates"
            ),
            Self::UnknownPatch { task, patch } => write!(
                f,
                "task '{task}' selects patch {patch}, which the level does not hold"
            ),
            Self::DependencyCycle { tasks } => {
                write!(f, "dependency cycle through tasks: {}", tasks.join(", "))
            }
            Self::EmptyGraph => write!(f, "schedule holds no tasks"),
        }
    }
}

impl Error for GraphError {}

/// A failure inside a task body.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskError {
    /// The numerics went wrong (NaN, divergence, ...).
    Numerical {
        /// What the task observed.
        reason: String,
    },
    /// A warehouse access violated its contract.
    Warehouse(WarehouseError),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numerical { reason } => write!(f, "numerical failure: {reason}"),
            Self::Warehouse(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Numerical { .. } => None,
            Self::Warehouse(err) => Some(err),
        }
    }
}

impl From<WarehouseError> for TaskError {
    fn from(err: WarehouseError) -> Self {
        Self::Warehouse(err)
    }
}

/// A ghost delivery failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not move a region between two patches.
    DeliveryFailed {
        /// Owning patch.
        source: PatchId,
        /// Receiving patch.
        dest: PatchId,
        /// Transport-specific explanation.
        reason: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeliveryFailed { source, dest, reason } => write!(
                f,
                "ghost delivery from patch {source} to patch {dest} failed: {reason}"
            ),
        }
    }
}

impl Error for TransportError {}

/// A step aborted. No retry, no partial results.
#[derive(Debug)]
pub enum RunError {
    /// A task body failed.
    Task {
        /// The failing task.
        task: String,
        /// The patch it was running on.
        patch: PatchId,
        /// What the body reported.
        source: TaskError,
    },
    /// The graph could not be built.
    Graph(GraphError),
    /// A ghost delivery failed before a task became ready.
    Transport(TransportError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task { task, patch, source } => {
                write!(f, "task '{task}' on patch {patch} aborted the step: {source}")
            }
            Self::Graph(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Task { source, .. } => Some(source),
            Self::Graph(err) => Some(err),
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<GraphError> for RunError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<TransportError> for RunError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
