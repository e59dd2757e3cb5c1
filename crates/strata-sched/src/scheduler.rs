//! The [`Schedule`]: registration, graph build, and step execution.

use std::sync::Arc;
use std::time::Instant;

use strata_core::{MaterialSubset, PatchId};
use strata_exec::{Capabilities, ExecPolicy, ExecutionSpace, WorkerPool};
use strata_grid::{ghost_regions, Level};
use strata_warehouse::DataWarehouse;

use crate::dispatch::{resolve, Resolved};
use crate::error::{DispatchError, GraphError, RunError};
use crate::graph::{TaskGraph, TaskState};
use crate::metrics::StepMetrics;
use crate::task::{Access, Task, TaskContext};
use crate::transport::{GhostRequest, GhostTransport, LocalTransport};

struct Registered {
    task: Task,
    resolved: Resolved,
    materials: MaterialSubset,
}

/// Tasks registered for one phase, with their resolved variants.
///
/// `add_task` resolves dispatch eagerly, so a misconfigured task fails
/// at registration. `execute` builds the graph fresh and runs every
/// node in dependency order on the controlling thread; within-node
/// parallelism comes from the shared worker pool through each task's
/// resolved loop policy. The schedule is per phase: build, execute,
/// discard.
pub struct Schedule {
    level: Arc<Level>,
    caps: Capabilities,
    pool: Arc<WorkerPool>,
    transport: Box<dyn GhostTransport>,
    tasks: Vec<Registered>,
}

impl Schedule {
    /// An empty schedule for a level under the given capabilities.
    pub fn new(level: Arc<Level>, caps: Capabilities) -> Self {
        Self {
            level,
            caps,
            pool: Arc::new(WorkerPool::new(caps.thread_width)),
            transport: Box::new(LocalTransport),
            tasks: Vec::new(),
        }
    }

    /// Replace the ghost transport. Defaults to [`LocalTransport`].
    pub fn with_transport(mut self, transport: Box<dyn GhostTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Register a task, resolving its hardware variant now.
    ///
    /// The task is frozen from here on. A task with no usable variant
    /// is rejected here, before any graph exists.
    pub fn add_task(&mut self, task: Task) -> Result<(), DispatchError> {
        let resolved = resolve(&task, &self.caps)?;
        let materials = task.material_set();
        self.tasks.push(Registered {
            task,
            resolved,
            materials,
        });
        Ok(())
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The level this schedule runs over.
    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    fn policy_for(&self, space: ExecutionSpace) -> ExecPolicy {
        match space {
            ExecutionSpace::Serial => ExecPolicy::Serial,
            ExecutionSpace::Threads => ExecPolicy::Threads(Arc::clone(&self.pool)),
            #[cfg(feature = "gpu")]
            ExecutionSpace::Device => ExecPolicy::Device(Arc::clone(&self.pool)),
            // resolve() never yields an uncompiled space.
            #[cfg(not(feature = "gpu"))]
            ExecutionSpace::Device => ExecPolicy::Serial,
        }
    }

    /// Complete every ghost delivery a node's requires need before it
    /// can become ready. Returns cells delivered.
    fn deliver_ghosts(&self, node_task: usize, patch: PatchId) -> Result<usize, RunError> {
        let registered = &self.tasks[node_task];
        let p = self.level.patch(patch).ok_or_else(|| {
            RunError::Graph(GraphError::UnknownPatch {
                task: registered.task.name().to_string(),
                patch,
            })
        })?;
        let mut cells = 0;
        for dep in registered.task.deps() {
            let reads = matches!(dep.access, Access::RequiresOld | Access::RequiresNew);
            if !reads || dep.ghost <= 0 || !dep.patches.contains(patch) {
                continue;
            }
            for region in ghost_regions(&self.level, p, dep.ghost) {
                for material in dep.materials.iter() {
                    let request = GhostRequest {
                        label: dep.label,
                        material,
                        source: region.source,
                        dest: patch,
                        region: region.region,
                    };
                    cells += self.transport.deliver(&request)?;
                }
            }
        }
        Ok(cells)
    }

    /// Build this phase's graph and run it to completion.
    ///
    /// Nodes execute one at a time in dependency order; among
    /// simultaneously-ready nodes the tie-break is registration order,
    /// which is a valid choice because the single-writer discipline
    /// makes results independent of it. The first task failure aborts
    /// the step.
    pub fn execute(&mut self, warehouse: &mut DataWarehouse) -> Result<StepMetrics, RunError> {
        let started = Instant::now();
        let tasks: Vec<Task> = self.tasks.iter().map(|r| r.task.clone()).collect();
        let mut graph = TaskGraph::build(&tasks, &self.level)?;

        let mut metrics = StepMetrics::default();
        let mut remaining = graph.len();
        while remaining > 0 {
            let next = graph.nodes.iter().position(|n| {
                n.state == TaskState::GraphBuilt
                    && n.waits_on
                        .iter()
                        .all(|&d| graph.nodes[d].state == TaskState::Complete)
            });
            // Build-time cycle detection guarantees progress.
            let Some(ni) = next else { break };

            let (task_index, patch_id) = (graph.nodes[ni].task, graph.nodes[ni].patch);
            metrics.ghost_cells_delivered += self.deliver_ghosts(task_index, patch_id)?;
            graph.nodes[ni].state = TaskState::Ready;

            let registered = &self.tasks[task_index];
            // Graph build rejects selectors naming patches outside the
            // level, so the lookup only fails if the graph and level
            // disagree; that is fatal, never skippable.
            let patch = self.level.patch(patch_id).ok_or_else(|| {
                RunError::Graph(GraphError::UnknownPatch {
                    task: registered.task.name().to_string(),
                    patch: patch_id,
                })
            })?;
            let policy = self.policy_for(registered.resolved.space);

            graph.nodes[ni].state = TaskState::Running;
            let mut ctx = TaskContext {
                patch,
                level: &self.level,
                materials: &registered.materials,
                policy: &policy,
                warehouse: &mut *warehouse,
            };
            (registered.resolved.body)(&mut ctx).map_err(|source| RunError::Task {
                task: registered.task.name().to_string(),
                patch: patch_id,
                source,
            })?;

            graph.nodes[ni].state = TaskState::Complete;
            metrics.tasks_executed += 1;
            metrics
                .execution_order
                .push((registered.task.name().to_string(), patch_id));
            remaining -= 1;
        }

        metrics.elapsed = started.elapsed();
        Ok(metrics)
    }

    /// Close the timestep: rotate warehouse generations so this step's
    /// outputs become the next step's old generation.
    pub fn advance_timestep(&self, warehouse: &mut DataWarehouse) {
        warehouse.rotate();
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("tasks", &self.tasks.len())
            .field("caps", &self.caps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{PatchSelector, TaskVariants};
    use strata_core::{LabelRegistry, MaterialId, PatchId, StorageKind, ValueKind};
    use strata_exec::BlockRange;

    fn setup() -> (Arc<Level>, Arc<LabelRegistry>) {
        let domain = BlockRange::from_extent([0, 0, 0], [8, 4, 4]);
        let level = Level::decompose(domain, [2, 1, 1], 1, 2, [1.0; 3]).unwrap();
        let mut labels = LabelRegistry::new();
        labels
            .get_or_create("mass", StorageKind::Cell, ValueKind::Double)
            .unwrap();
        (Arc::new(level), Arc::new(labels))
    }

    #[test]
    fn add_task_rejects_unschedulable_tasks() {
        let (level, _) = setup();
        let mut schedule = Schedule::new(level, Capabilities::serial_only());
        let err = schedule
            .add_task(Task::new("bare", TaskVariants::new()))
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoCompiledVariant { .. }));
        assert!(schedule.is_empty());
    }

    #[test]
    fn execute_with_no_tasks_is_an_empty_graph_error() {
        let (level, labels) = setup();
        let mut warehouse = DataWarehouse::new(Arc::clone(&level), labels);
        let mut schedule = Schedule::new(level, Capabilities::serial_only());
        let err = schedule.execute(&mut warehouse).unwrap_err();
        assert!(matches!(
            err,
            RunError::Graph(crate::error::GraphError::EmptyGraph)
        ));
    }

    #[test]
    fn single_task_executes_on_every_patch() {
        let (level, labels) = setup();
        let mass = labels.lookup("mass").unwrap();
        let mut warehouse = DataWarehouse::new(Arc::clone(&level), labels);
        let mut schedule = Schedule::new(level, Capabilities::serial_only());

        let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
            let buf = ctx.warehouse.allocate(mass, ctx.patch.id(), MaterialId(0))?;
            ctx.warehouse.put(mass, ctx.patch.id(), MaterialId(0), buf)?;
            Ok(())
        });
        schedule
            .add_task(
                Task::new("init", body).computes(
                    mass,
                    PatchSelector::All,
                    MaterialSubset::one(MaterialId(0)),
                ),
            )
            .unwrap();

        let metrics = schedule.execute(&mut warehouse).unwrap();
        assert_eq!(metrics.tasks_executed, 2);
        assert!(warehouse.contains(mass, PatchId(0), MaterialId(0), strata_core::Generation::New));
        assert!(warehouse.contains(mass, PatchId(1), MaterialId(0), strata_core::Generation::New));
    }

    #[test]
    fn failing_body_aborts_naming_task_and_patch() {
        let (level, labels) = setup();
        let mass = labels.lookup("mass").unwrap();
        let mut warehouse = DataWarehouse::new(Arc::clone(&level), labels);
        let mut schedule = Schedule::new(level, Capabilities::serial_only());

        let body = TaskVariants::uniform(|ctx: &mut TaskContext<'_>| {
            if ctx.patch.id() == PatchId(1) {
                return Err(crate::error::TaskError::Numerical {
                    reason: "flux blew up".into(),
                });
            }
            Ok(())
        });
        schedule
            .add_task(
                Task::new("explode", body).computes(
                    mass,
                    PatchSelector::All,
                    MaterialSubset::one(MaterialId(0)),
                ),
            )
            .unwrap();

        let err = schedule.execute(&mut warehouse).unwrap_err();
        match err {
            RunError::Task { task, patch, .. } => {
                assert_eq!(task, "explode");
                assert_eq!(patch, PatchId(1));
            }
            other => panic!("expected task abort, got {other}"),
        }
    }
}
