//! Shared fixtures for Strata development.
//!
//! A small two-patch level, a label registry with a scalar and a vector
//! variable, and canned tasks (fills, a one-layer stencil, an in-place
//! scale) used by the scheduler's integration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use strata_core::{
    Generation, LabelRegistry, MaterialId, MaterialSubset, StorageKind, ValueKind, VariableLabel,
};
use strata_exec::{serial_for, BlockRange};
use strata_grid::Level;
use strata_sched::{PatchSelector, Task, TaskContext, TaskVariants};
use strata_warehouse::DataWarehouse;

pub const M0: MaterialId = MaterialId(0);

pub fn mat0() -> MaterialSubset {
    MaterialSubset::one(M0)
}

/// A two-patch x-split level with its label registry.
pub struct Fixture {
    pub level: Arc<Level>,
    pub labels: Arc<LabelRegistry>,
    pub mass: VariableLabel,
    pub momentum: VariableLabel,
}

impl Fixture {
    /// Domain `[0,8)x[0,4)x[0,4)` split into two patches along x, one
    /// extra cell at domain boundaries, up to two ghost layers.
    pub fn two_patch() -> Self {
        let domain = BlockRange::from_extent([0, 0, 0], [8, 4, 4]);
        let level = Level::decompose(domain, [2, 1, 1], 1, 2, [1.0; 3])
            .unwrap_or_else(|e| panic!("fixture level: {e}"));
        let mut labels = LabelRegistry::new();
        let mass = labels
            .get_or_create("mass", StorageKind::Cell, ValueKind::Double)
            .unwrap_or_else(|e| panic!("fixture labels: {e}"));
        let momentum = labels
            .get_or_create("momentum", StorageKind::Cell, ValueKind::Double)
            .unwrap_or_else(|e| panic!("fixture labels: {e}"));
        Self {
            level: Arc::new(level),
            labels: Arc::new(labels),
            mass,
            momentum,
        }
    }

    pub fn warehouse(&self) -> DataWarehouse {
        DataWarehouse::new(Arc::clone(&self.level), Arc::clone(&self.labels))
    }
}

/// A task computing `label` everywhere, every cell set to `value`.
pub fn fill_task(name: &str, label: VariableLabel, value: f64) -> Task {
    let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
        for material in ctx.materials.iter().collect::<Vec<_>>() {
            let mut buf = ctx.warehouse.allocate(label, ctx.patch.id(), material)?;
            buf.fill_with(ctx.policy, |_, _, _| value);
            ctx.warehouse.put(label, ctx.patch.id(), material, buf)?;
        }
        Ok(())
    });
    Task::new(name, body).computes(label, PatchSelector::All, mat0())
}

/// A task computing `label` everywhere with a position-dependent value,
/// so tests can tell cells apart.
pub fn fill_index_task(name: &str, label: VariableLabel) -> Task {
    let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
        for material in ctx.materials.iter().collect::<Vec<_>>() {
            let mut buf = ctx.warehouse.allocate(label, ctx.patch.id(), material)?;
            buf.fill_with(ctx.policy, |i, j, k| (i * 100 + j * 10 + k) as f64);
            ctx.warehouse.put(label, ctx.patch.id(), material, buf)?;
        }
        Ok(())
    });
    Task::new(name, body).computes(label, PatchSelector::All, mat0())
}

/// A one-layer x stencil: `output(i) = input(i-1) + input(i+1)`, read
/// through a ghost-inclusive view of this timestep's `input`.
pub fn x_stencil_task(name: &str, input: VariableLabel, output: VariableLabel) -> Task {
    let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
        for material in ctx.materials.iter().collect::<Vec<_>>() {
            let view = ctx
                .warehouse
                .get(input, ctx.patch.id(), material, 1, Generation::New)?;
            let mut out = ctx.warehouse.allocate(output, ctx.patch.id(), material)?;
            serial_for(ctx.patch.interior(), |i, j, k| {
                out.set(i, j, k, view.get(i - 1, j, k) + view.get(i + 1, j, k));
            });
            ctx.warehouse.put(output, ctx.patch.id(), material, out)?;
        }
        Ok(())
    });
    Task::new(name, body)
        .requires(Generation::New, input, PatchSelector::All, mat0(), 1)
        .computes(output, PatchSelector::All, mat0())
}

/// A task carrying `input` forward across the timestep boundary:
/// `output = input` read from the old generation.
pub fn copy_old_task(name: &str, input: VariableLabel, output: VariableLabel) -> Task {
    let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
        for material in ctx.materials.iter().collect::<Vec<_>>() {
            let view = ctx
                .warehouse
                .get(input, ctx.patch.id(), material, 0, Generation::Old)?;
            let mut out = ctx.warehouse.allocate(output, ctx.patch.id(), material)?;
            out.fill_with(ctx.policy, |i, j, k| view.get(i, j, k));
            ctx.warehouse.put(output, ctx.patch.id(), material, out)?;
        }
        Ok(())
    });
    Task::new(name, body)
        .requires(Generation::Old, input, PatchSelector::All, mat0(), 0)
        .computes(output, PatchSelector::All, mat0())
}

/// An in-place update: every committed cell of `label` scaled by
/// `factor`.
pub fn scale_in_place_task(name: &str, label: VariableLabel, factor: f64) -> Task {
    let body = TaskVariants::uniform(move |ctx: &mut TaskContext<'_>| {
        for material in ctx.materials.iter().collect::<Vec<_>>() {
            let buf = ctx.warehouse.get_modifiable(label, ctx.patch.id(), material)?;
            let window = buf.window();
            serial_for(window, |i, j, k| {
                let v = buf.get(i, j, k);
                buf.set(i, j, k, v * factor);
            });
        }
        Ok(())
    });
    Task::new(name, body).modifies(label, PatchSelector::All, mat0())
}
