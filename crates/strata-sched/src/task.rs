//! Task declaration: hardware variants plus a dependency list.

use std::fmt;
use std::sync::Arc;

use strata_core::{Generation, MaterialSubset, PatchId, VariableLabel};
use strata_exec::{ExecPolicy, ExecutionSpace};
use strata_grid::{Level, Patch};
use strata_warehouse::DataWarehouse;

use crate::error::TaskError;

/// One compiled task body.
///
/// The body reads through `ctx.warehouse` gets and writes through
/// allocate/put; it learns its iteration domain from `ctx.patch` and
/// drives its loops with `ctx.policy`.
pub type TaskFn = Arc<dyn Fn(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + Sync>;

/// What the task runs with: its patch, materials, resolved loop policy,
/// and the warehouse.
///
/// Handed to the body by the scheduler, one invocation per graph node.
pub struct TaskContext<'a> {
    /// The patch this invocation covers.
    pub patch: &'a Patch,
    /// The level the patch belongs to.
    pub level: &'a Level,
    /// Union of the materials named by the task's dependencies.
    pub materials: &'a MaterialSubset,
    /// Loop policy resolved for this task at registration.
    pub policy: &'a ExecPolicy,
    /// The data store. Reads and writes both go through here.
    pub warehouse: &'a mut DataWarehouse,
}

/// How a dependency touches its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Read the previous timestep's committed value.
    RequiresOld,
    /// Read a value committed earlier this timestep.
    RequiresNew,
    /// Commit the key's value for this timestep, exactly once.
    Computes,
    /// Update the already-committed value in place, after the producer
    /// and before later readers.
    Modifies,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresOld => write!(f, "requires(old)"),
            Self::RequiresNew => write!(f, "requires(new)"),
            Self::Computes => write!(f, "computes"),
            Self::Modifies => write!(f, "modifies"),
        }
    }
}

/// Which patches a dependency covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchSelector {
    /// Every patch on the level.
    All,
    /// A single patch.
    One(PatchId),
    /// An explicit set.
    Subset(Vec<PatchId>),
}

impl PatchSelector {
    /// The selected patch ids in ascending order.
    pub fn resolve(&self, level: &Level) -> Vec<PatchId> {
        match self {
            Self::All => level.patches().iter().map(Patch::id).collect(),
            Self::One(id) => vec![*id],
            Self::Subset(ids) => {
                let mut ids = ids.clone();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        }
    }

    /// Whether the selector covers `patch`.
    pub fn contains(&self, patch: PatchId) -> bool {
        match self {
            Self::All => true,
            Self::One(id) => *id == patch,
            Self::Subset(ids) => ids.contains(&patch),
        }
    }
}

/// One declared data dependency of a task.
#[derive(Clone, Debug)]
pub struct Dependency {
    /// The variable.
    pub label: VariableLabel,
    /// The patches the access covers.
    pub patches: PatchSelector,
    /// The materials the access covers.
    pub materials: MaterialSubset,
    /// Ghost layers needed around the patch interior; only meaningful
    /// on requires.
    pub ghost: i32,
    /// Read, write, or in-place update.
    pub access: Access,
}

/// The compiled bodies of a task, at most one per execution space.
#[derive(Clone, Default)]
pub struct TaskVariants {
    serial: Option<TaskFn>,
    threads: Option<TaskFn>,
    device: Option<TaskFn>,
}

impl TaskVariants {
    /// No variants; add them with the builder methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// One body for both host spaces. The portable loops make this the
    /// common case: the same functor runs serially or on the pool.
    pub fn uniform<F>(body: F) -> Self
    where
        F: Fn(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        let body: TaskFn = Arc::new(body);
        Self {
            serial: Some(Arc::clone(&body)),
            threads: Some(body),
            device: None,
        }
    }

    /// Set the serial body.
    pub fn serial<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.serial = Some(Arc::new(body));
        self
    }

    /// Set the shared-memory body.
    pub fn threads<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.threads = Some(Arc::new(body));
        self
    }

    /// Set the device body.
    pub fn device<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + Sync + 'static,
    {
        self.device = Some(Arc::new(body));
        self
    }

    /// The body compiled for `space`, if any.
    pub fn for_space(&self, space: ExecutionSpace) -> Option<&TaskFn> {
        match space {
            ExecutionSpace::Serial => self.serial.as_ref(),
            ExecutionSpace::Threads => self.threads.as_ref(),
            ExecutionSpace::Device => self.device.as_ref(),
        }
    }

    /// Whether any body exists at all.
    pub fn is_empty(&self) -> bool {
        self.serial.is_none() && self.threads.is_none() && self.device.is_none()
    }
}

impl fmt::Debug for TaskVariants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskVariants")
            .field("serial", &self.serial.is_some())
            .field("threads", &self.threads.is_some())
            .field("device", &self.device.is_some())
            .finish()
    }
}

/// A declared unit of work: a name, compiled variants, and the
/// dependency list the graph is built from.
///
/// Built with the fluent methods, then frozen by
/// [`Schedule::add_task`](crate::Schedule::add_task).
#[derive(Clone, Debug)]
pub struct Task {
    name: String,
    variants: TaskVariants,
    deps: Vec<Dependency>,
}

impl Task {
    /// A task with no dependencies yet.
    pub fn new(name: impl Into<String>, variants: TaskVariants) -> Self {
        Self {
            name: name.into(),
            variants,
            deps: Vec::new(),
        }
    }

    /// Declare a read of `label` from the given generation, with
    /// `ghost` halo layers.
    pub fn requires(
        mut self,
        generation: Generation,
        label: VariableLabel,
        patches: PatchSelector,
        materials: MaterialSubset,
        ghost: i32,
    ) -> Self {
        self.deps.push(Dependency {
            label,
            patches,
            materials,
            ghost,
            access: match generation {
                Generation::Old => Access::RequiresOld,
                Generation::New => Access::RequiresNew,
            },
        });
        self
    }

    /// Declare this task the sole producer of `label` on the selected
    /// patches and materials this timestep.
    pub fn computes(
        mut self,
        label: VariableLabel,
        patches: PatchSelector,
        materials: MaterialSubset,
    ) -> Self {
        self.deps.push(Dependency {
            label,
            patches,
            materials,
            ghost: 0,
            access: Access::Computes,
        });
        self
    }

    /// Declare an in-place update of a key committed earlier this
    /// timestep.
    pub fn modifies(
        mut self,
        label: VariableLabel,
        patches: PatchSelector,
        materials: MaterialSubset,
    ) -> Self {
        self.deps.push(Dependency {
            label,
            patches,
            materials,
            ghost: 0,
            access: Access::Modifies,
        });
        self
    }

    /// The task's name, used in every diagnostic.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled variants.
    pub fn variants(&self) -> &TaskVariants {
        &self.variants
    }

    /// The declared dependencies, in declaration order.
    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }

    /// Union of the patches named by any dependency, ascending.
    pub fn patch_set(&self, level: &Level) -> Vec<PatchId> {
        let mut out: Vec<PatchId> = self
            .deps
            .iter()
            .flat_map(|d| d.patches.resolve(level))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Union of the materials named by any dependency.
    pub fn material_set(&self) -> MaterialSubset {
        let all: Vec<_> = self
            .deps
            .iter()
            .flat_map(|d| d.materials.iter())
            .collect();
        MaterialSubset::of(&all)
    }
}
