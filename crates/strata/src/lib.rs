//! Strata: a patch-decomposed task-graph runtime for structured-grid
//! simulations.
//!
//! This is the facade crate re-exporting the public API of the Strata
//! sub-crates. Tasks declare what they read and write; the runtime
//! orders them, assembles ghost-cell views across patch boundaries, and
//! runs each task's body on the hardware variant resolved for the run.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//! use std::sync::Arc;
//!
//! // One cell-centered field on a two-patch grid.
//! let mut labels = LabelRegistry::new();
//! let heat = labels
//!     .get_or_create("heat", StorageKind::Cell, ValueKind::Double)
//!     .unwrap();
//! let labels = Arc::new(labels);
//!
//! let domain = BlockRange::from_extent([0, 0, 0], [8, 4, 4]);
//! let level = Arc::new(Level::decompose(domain, [2, 1, 1], 1, 1, [1.0; 3]).unwrap());
//! let mut warehouse = DataWarehouse::new(Arc::clone(&level), Arc::clone(&labels));
//!
//! // A task initializing the field on every patch. The same body runs
//! // serially or on the worker pool; the schedule decides once.
//! let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
//!     let mut buf = ctx.warehouse.allocate(heat, ctx.patch.id(), MaterialId(0))?;
//!     buf.fill_with(ctx.policy, |i, j, k| (i + j + k) as f64);
//!     ctx.warehouse.put(heat, ctx.patch.id(), MaterialId(0), buf)?;
//!     Ok(())
//! });
//!
//! let mut schedule = Schedule::new(Arc::clone(&level), Capabilities::detect());
//! schedule
//!     .add_task(Task::new("init_heat", body).computes(
//!         heat,
//!         PatchSelector::All,
//!         MaterialSubset::one(MaterialId(0)),
//!     ))
//!     .unwrap();
//! let metrics = schedule.execute(&mut warehouse).unwrap();
//! assert_eq!(metrics.tasks_executed, 2);
//!
//! // Read patch 0 with one ghost layer; x = 4 comes from patch 1.
//! let view = warehouse
//!     .get(heat, PatchId(0), MaterialId(0), 1, Generation::New)
//!     .unwrap();
//! assert_eq!(view.get(4, 0, 0), 4.0);
//!
//! schedule.advance_timestep(&mut warehouse);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | Labels, materials, ids, generations |
//! | [`exec`] | `strata-exec` | `BlockRange`, portable loops, worker pool |
//! | [`grid`] | `strata-grid` | Patches, level decomposition, ghost regions |
//! | [`warehouse`] | `strata-warehouse` | Generation-rotated data store |
//! | [`sched`] | `strata-sched` | Tasks, dispatch, graph, scheduler |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Labels, materials, ids, and the generation selector (`strata-core`).
pub use strata_core as types;

/// The 3D iteration range, portable loops, execution spaces, and the
/// worker pool (`strata-exec`).
pub use strata_exec as exec;

/// Patch decomposition and ghost-region geometry (`strata-grid`).
pub use strata_grid as grid;

/// The generation-rotated data store (`strata-warehouse`).
pub use strata_warehouse as warehouse;

/// Task declaration, dispatch, and the scheduler (`strata-sched`).
pub use strata_sched as sched;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and registries
    pub use strata_core::{
        Generation, LabelRegistry, MaterialId, MaterialRegistry, MaterialSubset, PatchId,
        StorageKind, TimestepId, ValueKind, VariableLabel,
    };

    // Iteration and execution
    pub use strata_exec::{
        parallel_for, parallel_reduce_min, parallel_reduce_sum, serial_for, BlockRange,
        Capabilities, ExecPolicy, ExecutionSpace,
    };

    // Grid
    pub use strata_grid::{ghost_regions, GhostRegion, Level, Patch};

    // Data store
    pub use strata_warehouse::{DataWarehouse, GridBuffer, GridView, Key, WarehouseError};

    // Tasks and scheduling
    pub use strata_sched::{
        Access, DispatchError, GraphError, LocalTransport, PatchSelector, RunError, Schedule,
        StepMetrics, Task, TaskContext, TaskError, TaskVariants,
    };
}
