//! The [`DataWarehouse`]: generation-rotated variable storage.

use std::mem;
use std::sync::Arc;

use indexmap::IndexMap;

use strata_core::{Generation, LabelRegistry, MaterialId, PatchId, TimestepId, VariableLabel};
use strata_grid::{ghost_regions, Level, Patch};

use crate::buffer::GridBuffer;
use crate::error::WarehouseError;
use crate::key::Key;
use crate::view::GridView;

/// Variable storage for one level, split into an old and a new
/// generation.
///
/// The new generation is written by this timestep's tasks under a
/// single-writer discipline: every key is committed exactly once per
/// step, and a second `put` is a fatal graph defect. The old generation
/// holds the previous step's committed state and is read-only. The
/// scheduler rotates the two when a step completes.
#[derive(Debug)]
pub struct DataWarehouse {
    level: Arc<Level>,
    labels: Arc<LabelRegistry>,
    old: IndexMap<Key, Arc<GridBuffer>>,
    new: IndexMap<Key, Arc<GridBuffer>>,
    timestep: TimestepId,
}

impl DataWarehouse {
    /// A warehouse with both generations empty at timestep zero.
    pub fn new(level: Arc<Level>, labels: Arc<LabelRegistry>) -> Self {
        Self {
            level,
            labels,
            old: IndexMap::new(),
            new: IndexMap::new(),
            timestep: TimestepId(0),
        }
    }

    /// The level this warehouse stores data for.
    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    /// The label registry this warehouse resolves names through.
    pub fn labels(&self) -> &Arc<LabelRegistry> {
        &self.labels
    }

    /// The current timestep, incremented by [`DataWarehouse::rotate`].
    pub fn timestep(&self) -> TimestepId {
        self.timestep
    }

    fn patch(&self, id: PatchId) -> Result<&Patch, WarehouseError> {
        self.level
            .patch(id)
            .ok_or(WarehouseError::UnknownPatch { patch: id })
    }

    fn components(&self, label: VariableLabel) -> Result<usize, WarehouseError> {
        self.labels
            .def(label)
            .map(|d| d.value.components() as usize)
            .ok_or(WarehouseError::UnknownLabel { label })
    }

    fn generation(&self, gen: Generation) -> &IndexMap<Key, Arc<GridBuffer>> {
        match gen {
            Generation::Old => &self.old,
            Generation::New => &self.new,
        }
    }

    /// A fresh zeroed buffer sized to the patch's allocation range.
    ///
    /// Allocation does not touch the store: the buffer is uncommitted
    /// until [`DataWarehouse::put`], and two allocates for one key
    /// return independent buffers.
    pub fn allocate(
        &self,
        label: VariableLabel,
        patch: PatchId,
        _material: MaterialId,
    ) -> Result<GridBuffer, WarehouseError> {
        let components = self.components(label)?;
        let patch = self.patch(patch)?;
        Ok(GridBuffer::new(patch.allocation_range(), components))
    }

    /// Commit a buffer to the new generation, exactly once per key.
    pub fn put(
        &mut self,
        label: VariableLabel,
        patch: PatchId,
        material: MaterialId,
        buffer: GridBuffer,
    ) -> Result<(), WarehouseError> {
        self.patch(patch)?;
        let key = Key::new(label, patch, material);
        if self.new.contains_key(&key) {
            return Err(WarehouseError::DoubleWrite {
                name: self.labels.name(label).to_string(),
                key,
            });
        }
        self.new.insert(key, Arc::new(buffer));
        Ok(())
    }

    /// A read-only view of committed data, optionally ghost-inclusive.
    ///
    /// With `ghost == 0` this is a cheap handle clone. With `ghost > 0`
    /// the view's window is the interior grown by `ghost`, clipped to
    /// the level's extra-cell bounds at domain boundaries; the halo is
    /// assembled synchronously from the neighbors' committed buffers in
    /// the same generation. A missing key, on this patch or a neighbor,
    /// means an upstream producer never ran and is fatal.
    pub fn get(
        &self,
        label: VariableLabel,
        patch: PatchId,
        material: MaterialId,
        ghost: i32,
        generation: Generation,
    ) -> Result<GridView, WarehouseError> {
        let key = Key::new(label, patch, material);
        if ghost > self.level.max_ghost() {
            return Err(WarehouseError::GhostExceeded {
                key,
                requested: ghost,
                max: self.level.max_ghost(),
            });
        }
        let patch = self.patch(patch)?;
        let store = self.generation(generation);
        let own = store.get(&key).ok_or_else(|| WarehouseError::GetMissing {
            name: self.labels.name(label).to_string(),
            key,
            generation,
        })?;
        if ghost <= 0 {
            return Ok(GridView::new(Arc::clone(own)));
        }

        let window = self.level.ghost_window(patch, ghost);
        let mut assembled = GridBuffer::new(window, own.components());
        assembled.copy_region_from(own, own.window());
        for region in ghost_regions(&self.level, patch, ghost) {
            let neighbor_key = Key::new(label, region.source, material);
            let neighbor = store
                .get(&neighbor_key)
                .ok_or_else(|| WarehouseError::GetMissing {
                    name: self.labels.name(label).to_string(),
                    key: neighbor_key,
                    generation,
                })?;
            assembled.copy_region_from(neighbor, region.region);
        }
        Ok(GridView::new(Arc::new(assembled)))
    }

    /// Mutable access to a buffer already committed to the new
    /// generation, for in-place `modifies` updates.
    pub fn get_modifiable(
        &mut self,
        label: VariableLabel,
        patch: PatchId,
        material: MaterialId,
    ) -> Result<&mut GridBuffer, WarehouseError> {
        let key = Key::new(label, patch, material);
        match self.new.get_mut(&key) {
            Some(buffer) => Ok(Arc::make_mut(buffer)),
            None => Err(WarehouseError::GetMissing {
                name: self.labels.name(label).to_string(),
                key,
                generation: Generation::New,
            }),
        }
    }

    /// Rotate generations at the end of a timestep: new becomes old,
    /// and a fresh empty new generation opens.
    pub fn rotate(&mut self) {
        self.old = mem::take(&mut self.new);
        self.timestep = TimestepId(self.timestep.0 + 1);
    }

    /// Whether a key is committed in the given generation.
    pub fn contains(
        &self,
        label: VariableLabel,
        patch: PatchId,
        material: MaterialId,
        generation: Generation,
    ) -> bool {
        self.generation(generation)
            .contains_key(&Key::new(label, patch, material))
    }

    /// Number of committed keys in the given generation.
    pub fn len(&self, generation: Generation) -> usize {
        self.generation(generation).len()
    }

    /// Whether the given generation holds no committed keys.
    pub fn is_empty(&self, generation: Generation) -> bool {
        self.generation(generation).is_empty()
    }
}
