//! Execution-space dispatch: pick one compiled variant per task, once.
//!
//! Resolution happens at task registration and never again. The
//! preference order is fixed: device if the run uses one and a device
//! body was compiled, else the shared-memory pool, else serial. A task
//! whose variants cannot satisfy the run's configuration is rejected
//! here, before it can enter a graph.

use strata_exec::{Capabilities, ExecutionSpace};

use crate::error::DispatchError;
use crate::task::{Task, TaskFn};

/// Preparation side effects applied when a variant is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrepFlags {
    /// Mark the task's buffers for device-resident preload.
    pub device_preload: bool,
    /// Suggested index-chunk width for pool work sharing.
    pub chunk_hint: Option<usize>,
}

/// A task's resolved dispatch: the space, its body, and prep flags.
#[derive(Clone)]
pub struct Resolved {
    /// The chosen execution space.
    pub space: ExecutionSpace,
    /// The body compiled for that space.
    pub body: TaskFn,
    /// Side effects to apply before the task enters the graph.
    pub prep: PrepFlags,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("space", &self.space)
            .field("prep", &self.prep)
            .finish()
    }
}

fn prep_for(space: ExecutionSpace, caps: &Capabilities) -> PrepFlags {
    match space {
        ExecutionSpace::Serial => PrepFlags::default(),
        ExecutionSpace::Threads => PrepFlags {
            device_preload: false,
            chunk_hint: Some(caps.thread_width),
        },
        ExecutionSpace::Device => PrepFlags {
            device_preload: true,
            chunk_hint: None,
        },
    }
}

/// Resolve the variant a task will run as for the whole phase.
///
/// Walks the preference order restricted to what the capabilities
/// enable; if no enabled space has a body, falls back to a compiled
/// host space with one (a threads-only task still runs on a one-wide
/// pool). A device-only task on a run without device capabilities is
/// rejected, as is a task with no usable body at all.
pub fn resolve(task: &Task, caps: &Capabilities) -> Result<Resolved, DispatchError> {
    let mut preferred = Vec::with_capacity(3);
    if caps.use_device {
        preferred.push(ExecutionSpace::Device);
    }
    if caps.thread_width > 1 {
        preferred.push(ExecutionSpace::Threads);
    }
    preferred.push(ExecutionSpace::Serial);

    // The fallback keeps host-only and pool-only tasks runnable under
    // any capabilities, but never offloads to a device the run did not
    // ask for.
    let mut fallback = vec![ExecutionSpace::Serial, ExecutionSpace::Threads];
    if caps.use_device {
        fallback.push(ExecutionSpace::Device);
    }
    let pick = preferred
        .iter()
        .chain(fallback.iter())
        .copied()
        .filter(|space| space.is_compiled())
        .find_map(|space| {
            task.variants()
                .for_space(space)
                .map(|body| (space, body.clone()))
        });

    match pick {
        Some((space, body)) => Ok(Resolved {
            space,
            body,
            prep: prep_for(space, caps),
        }),
        None => Err(DispatchError::NoCompiledVariant {
            task: task.name().to_string(),
            wanted: preferred[0],
        }),
    }
}
