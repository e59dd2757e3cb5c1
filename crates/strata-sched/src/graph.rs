//! The per-patch task dependency graph.
//!
//! One node per (task, patch). Build validates the single-writer
//! discipline: exactly one `computes` producer per key, `modifies`
//! chained after the producer and after any reader registered since,
//! and new-generation readers ordered after the last writer registered
//! before them. Old-generation reads create
//! no intra-step edge; they are checked against the old store when the
//! body runs.

use indexmap::IndexMap;
use smallvec::SmallVec;

use strata_core::PatchId;
use strata_grid::{ghost_regions, Level};
use strata_warehouse::Key;

use crate::error::GraphError;
use crate::task::{Access, Task};

/// Lifecycle of one graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Declared, not yet validated.
    Registered,
    /// Validated into a graph.
    GraphBuilt,
    /// All dependencies complete and ghost data delivered.
    Ready,
    /// Body executing.
    Running,
    /// Body returned.
    Complete,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub task: usize,
    pub patch: PatchId,
    pub waits_on: SmallVec<[usize; 4]>,
    pub state: TaskState,
}

/// The validated dependency graph for one phase.
#[derive(Debug)]
pub struct TaskGraph {
    pub(crate) nodes: Vec<Node>,
}

impl TaskGraph {
    /// Expand tasks over their patch sets and validate the dependency
    /// declarations into an executable graph.
    pub fn build(tasks: &[Task], level: &Level) -> Result<Self, GraphError> {
        if tasks.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        for task in tasks {
            reject_requires_computes_overlap(task, level)?;
        }

        let mut nodes = Vec::new();
        let mut by_task_patch: IndexMap<(usize, PatchId), usize> = IndexMap::new();
        for (ti, task) in tasks.iter().enumerate() {
            for patch in task.patch_set(level) {
                if level.patch(patch).is_none() {
                    return Err(GraphError::UnknownPatch {
                        task: task.name().to_string(),
                        patch,
                    });
                }
                by_task_patch.insert((ti, patch), nodes.len());
                nodes.push(Node {
                    task: ti,
                    patch,
                    waits_on: SmallVec::new(),
                    state: TaskState::Registered,
                });
            }
        }
        if nodes.is_empty() {
            return Err(GraphError::EmptyGraph);
        }

        // Exactly one computes producer per key.
        let mut producers: IndexMap<Key, usize> = IndexMap::new();
        for (ni, node) in nodes.iter().enumerate() {
            let task = &tasks[node.task];
            for dep in task.deps() {
                if dep.access != Access::Computes || !dep.patches.contains(node.patch) {
                    continue;
                }
                for material in dep.materials.iter() {
                    let key = Key::new(dep.label, node.patch, material);
                    if let Some(&other) = producers.get(&key) {
                        return Err(GraphError::DuplicateComputes {
                            task: task.name().to_string(),
                            other_task: tasks[nodes[other].task].name().to_string(),
                            key,
                        });
                    }
                    producers.insert(key, ni);
                }
            }
        }

        // Edges, in registration order. last_writer starts at the
        // producers and advances through each modifies, so a reader
        // lands after the last writer registered before it. readers
        // collects new-generation reads since that writer; a modifies
        // takes anti-dependency edges on them so no reader overlaps the
        // in-place update of its key.
        let mut last_writer = producers.clone();
        let mut readers: IndexMap<Key, SmallVec<[usize; 4]>> = IndexMap::new();
        for ni in 0..nodes.len() {
            let task = &tasks[nodes[ni].task];
            let patch = nodes[ni].patch;
            let mut waits: SmallVec<[usize; 4]> = SmallVec::new();

            for dep in task.deps() {
                if !dep.patches.contains(patch) {
                    continue;
                }
                match dep.access {
                    Access::Computes | Access::RequiresOld => {}
                    Access::Modifies => {
                        for material in dep.materials.iter() {
                            let key = Key::new(dep.label, patch, material);
                            match last_writer.get(&key) {
                                Some(&writer) => {
                                    waits.push(writer);
                                    if let Some(prior) = readers.swap_remove(&key) {
                                        waits.extend(prior.into_iter().filter(|&r| r != ni));
                                    }
                                    last_writer.insert(key, ni);
                                }
                                None => {
                                    return Err(GraphError::MissingProducer {
                                        task: task.name().to_string(),
                                        key,
                                    })
                                }
                            }
                        }
                    }
                    Access::RequiresNew => {
                        let mut sources: SmallVec<[PatchId; 8]> = SmallVec::new();
                        sources.push(patch);
                        if dep.ghost > 0 {
                            if let Some(p) = level.patch(patch) {
                                for region in ghost_regions(level, p, dep.ghost) {
                                    sources.push(region.source);
                                }
                            }
                        }
                        for material in dep.materials.iter() {
                            for &source in &sources {
                                let key = Key::new(dep.label, source, material);
                                match last_writer.get(&key) {
                                    Some(&writer) => {
                                        waits.push(writer);
                                        readers.entry(key).or_default().push(ni);
                                    }
                                    None => {
                                        return Err(GraphError::MissingProducer {
                                            task: task.name().to_string(),
                                            key,
                                        })
                                    }
                                }
                            }
                        }
                    }
                }
            }

            waits.sort_unstable();
            waits.dedup();
            nodes[ni].waits_on = waits;
            nodes[ni].state = TaskState::GraphBuilt;
        }

        check_acyclic(&nodes, tasks)?;
        Ok(Self { nodes })
    }

    /// Number of (task, patch) nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// State of node `index`.
    pub fn state(&self, index: usize) -> Option<TaskState> {
        self.nodes.get(index).map(|n| n.state)
    }
}

/// A task pairing a new-generation requires with computes on one key
/// is declaring an in-place update without saying so; force `modifies`.
/// Reading the old generation of a key while computing its new value is
/// the ordinary double-buffered advance and stays legal.
fn reject_requires_computes_overlap(task: &Task, level: &Level) -> Result<(), GraphError> {
    for computes in task.deps().iter().filter(|d| d.access == Access::Computes) {
        for requires in task
            .deps()
            .iter()
            .filter(|d| d.access == Access::RequiresNew)
        {
            if computes.label != requires.label
                || !computes.materials.intersects(&requires.materials)
            {
                continue;
            }
            let shared_patch = computes
                .patches
                .resolve(level)
                .into_iter()
                .find(|&p| requires.patches.contains(p));
            if let Some(patch) = shared_patch {
                let material = computes
                    .materials
                    .iter()
                    .find(|&m| requires.materials.contains(m))
                    .unwrap_or(strata_core::MaterialId(0));
                return Err(GraphError::OverlappingRequiresComputes {
                    task: task.name().to_string(),
                    key: Key::new(computes.label, patch, material),
                });
            }
        }
    }
    Ok(())
}

/// Kahn's toposort; anything left over sits on a cycle.
fn check_acyclic(nodes: &[Node], tasks: &[Task]) -> Result<(), GraphError> {
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut indegree: Vec<usize> = vec![0; nodes.len()];
    for (ni, node) in nodes.iter().enumerate() {
        indegree[ni] = node.waits_on.len();
        for &dep in &node.waits_on {
            dependents[dep].push(ni);
        }
    }

    let mut queue: Vec<usize> = (0..nodes.len()).filter(|&n| indegree[n] == 0).collect();
    let mut seen = 0;
    while let Some(n) = queue.pop() {
        seen += 1;
        for &next in &dependents[n] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push(next);
            }
        }
    }
    if seen == nodes.len() {
        return Ok(());
    }

    let mut stuck: Vec<String> = (0..nodes.len())
        .filter(|&n| indegree[n] > 0)
        .map(|n| tasks[nodes[n].task].name().to_string())
        .collect();
    stuck.dedup();
    Err(GraphError::DependencyCycle { tasks: stuck })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{PatchSelector, TaskVariants};
    use strata_core::{Generation, MaterialId, MaterialSubset, VariableLabel};
    use strata_exec::BlockRange;

    const MASS: VariableLabel = VariableLabel(0);
    const MOMENTUM: VariableLabel = VariableLabel(1);

    fn level() -> Level {
        let domain = BlockRange::from_extent([0, 0, 0], [8, 4, 4]);
        Level::decompose(domain, [2, 1, 1], 1, 2, [1.0; 3]).unwrap()
    }

    fn m0() -> MaterialSubset {
        MaterialSubset::one(MaterialId(0))
    }

    fn noop(name: &str) -> Task {
        Task::new(name, TaskVariants::uniform(|_| Ok(())))
    }

    #[test]
    fn reader_waits_on_its_producer() {
        let level = level();
        let produce = noop("produce").computes(MASS, PatchSelector::All, m0());
        let consume = noop("consume")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MOMENTUM, PatchSelector::All, m0());

        let graph = TaskGraph::build(&[produce, consume], &level).unwrap();
        assert_eq!(graph.len(), 4);
        // consume@P0 is node 2 and waits on produce@P0 (node 0) only.
        assert_eq!(graph.nodes[2].waits_on.as_slice(), &[0]);
        assert_eq!(graph.nodes[3].waits_on.as_slice(), &[1]);
    }

    #[test]
    fn ghost_requirement_expands_to_neighbor_producers() {
        let level = level();
        let produce = noop("produce").computes(MASS, PatchSelector::All, m0());
        let stencil = noop("stencil")
            .requires(
                Generation::New,
                MASS,
                PatchSelector::One(PatchId(0)),
                m0(),
                1,
            )
            .computes(MOMENTUM, PatchSelector::One(PatchId(0)), m0());

        let graph = TaskGraph::build(&[produce, stencil], &level).unwrap();
        // stencil@P0 waits on produce@P0 and produce@P1.
        assert_eq!(graph.nodes[2].waits_on.as_slice(), &[0, 1]);
    }

    #[test]
    fn duplicate_computes_rejected_naming_both_tasks() {
        let level = level();
        let a = noop("a").computes(MASS, PatchSelector::All, m0());
        let b = noop("b").computes(MASS, PatchSelector::One(PatchId(1)), m0());

        let err = TaskGraph::build(&[a, b], &level).unwrap_err();
        match err {
            GraphError::DuplicateComputes { task, other_task, key } => {
                assert_eq!(task, "b");
                assert_eq!(other_task, "a");
                assert_eq!(key.patch, PatchId(1));
            }
            other => panic!("expected DuplicateComputes, got {other}"),
        }
    }

    #[test]
    fn missing_producer_rejected() {
        let level = level();
        let orphan = noop("orphan")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MOMENTUM, PatchSelector::All, m0());
        let err = TaskGraph::build(&[orphan], &level).unwrap_err();
        assert!(matches!(err, GraphError::MissingProducer { task, .. } if task == "orphan"));
    }

    #[test]
    fn old_generation_reads_need_no_producer() {
        let level = level();
        let advance = noop("advance")
            .requires(Generation::Old, MASS, PatchSelector::All, m0(), 1)
            .computes(MOMENTUM, PatchSelector::All, m0());
        let graph = TaskGraph::build(&[advance], &level).unwrap();
        assert!(graph.nodes.iter().all(|n| n.waits_on.is_empty()));
    }

    #[test]
    fn new_requires_computes_overlap_rejected() {
        let level = level();
        let sneaky = noop("sneaky")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MASS, PatchSelector::All, m0());
        let err = TaskGraph::build(&[sneaky], &level).unwrap_err();
        assert!(matches!(
            err,
            GraphError::OverlappingRequiresComputes { task, .. } if task == "sneaky"
        ));
    }

    #[test]
    fn old_requires_with_computes_on_one_label_is_the_normal_advance() {
        let level = level();
        let advance = noop("advance")
            .requires(Generation::Old, MASS, PatchSelector::All, m0(), 1)
            .computes(MASS, PatchSelector::All, m0());
        let graph = TaskGraph::build(&[advance], &level).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.nodes.iter().all(|n| n.waits_on.is_empty()));
    }

    #[test]
    fn modifies_chains_between_producer_and_reader() {
        let level = level();
        let produce = noop("produce").computes(MASS, PatchSelector::All, m0());
        let correct = noop("correct").modifies(MASS, PatchSelector::All, m0());
        let consume = noop("consume")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MOMENTUM, PatchSelector::All, m0());

        let graph = TaskGraph::build(&[produce, correct, consume], &level).unwrap();
        // correct@P0 (node 2) waits on produce@P0 (node 0); consume@P0
        // (node 4) waits on the modifier, not the producer.
        assert_eq!(graph.nodes[2].waits_on.as_slice(), &[0]);
        assert_eq!(graph.nodes[4].waits_on.as_slice(), &[2]);
    }

    #[test]
    fn selector_naming_a_foreign_patch_rejected() {
        let level = level();
        let stray = noop("stray").computes(MASS, PatchSelector::One(PatchId(99)), m0());
        let err = TaskGraph::build(&[stray], &level).unwrap_err();
        match err {
            GraphError::UnknownPatch { task, patch } => {
                assert_eq!(task, "stray");
                assert_eq!(patch, PatchId(99));
            }
            other => panic!("expected UnknownPatch, got {other}"),
        }
    }

    #[test]
    fn modifier_waits_on_readers_registered_before_it() {
        let level = level();
        let produce = noop("produce").computes(MASS, PatchSelector::All, m0());
        let consume = noop("consume")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MOMENTUM, PatchSelector::All, m0());
        let correct = noop("correct").modifies(MASS, PatchSelector::All, m0());

        let graph = TaskGraph::build(&[produce, consume, correct], &level).unwrap();
        // consume@P0 (node 2) reads mass@P0 after produce@P0 (node 0);
        // correct@P0 (node 4) must wait on both, or the in-place update
        // would race the read.
        assert_eq!(graph.nodes[2].waits_on.as_slice(), &[0]);
        assert_eq!(graph.nodes[4].waits_on.as_slice(), &[0, 2]);
        assert_eq!(graph.nodes[5].waits_on.as_slice(), &[1, 3]);
    }

    #[test]
    fn modifies_without_a_producer_rejected() {
        let level = level();
        let fix = noop("fix").modifies(MASS, PatchSelector::All, m0());
        let err = TaskGraph::build(&[fix], &level).unwrap_err();
        assert!(matches!(err, GraphError::MissingProducer { .. }));
    }

    #[test]
    fn mutual_requirements_form_a_cycle() {
        let level = level();
        let a = noop("a")
            .requires(Generation::New, MOMENTUM, PatchSelector::All, m0(), 0)
            .computes(MASS, PatchSelector::All, m0());
        let b = noop("b")
            .requires(Generation::New, MASS, PatchSelector::All, m0(), 0)
            .computes(MOMENTUM, PatchSelector::All, m0());
        let err = TaskGraph::build(&[a, b], &level).unwrap_err();
        match err {
            GraphError::DependencyCycle { tasks } => {
                assert!(tasks.contains(&"a".to_string()));
                assert!(tasks.contains(&"b".to_string()));
            }
            other => panic!("expected DependencyCycle, got {other}"),
        }
    }

    #[test]
    fn empty_schedule_rejected() {
        let level = level();
        assert!(matches!(
            TaskGraph::build(&[], &level),
            Err(GraphError::EmptyGraph)
        ));
    }

    #[test]
    fn nodes_enter_graph_built_state() {
        let level = level();
        let produce = noop("produce").computes(MASS, PatchSelector::All, m0());
        let graph = TaskGraph::build(&[produce], &level).unwrap();
        assert_eq!(graph.state(0), Some(TaskState::GraphBuilt));
        assert_eq!(graph.state(99), None);
    }
}
