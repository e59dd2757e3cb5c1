//! Read-only [`GridView`] handed to consumers.

use std::sync::Arc;

use strata_exec::BlockRange;

use crate::buffer::GridBuffer;

/// A read-only view of committed variable data.
///
/// A ghost-free view is a cheap clone of the committed buffer's handle;
/// a ghost-inclusive view owns an assembled copy whose window covers
/// the interior plus the requested halo. Either way the consumer sees
/// one contiguous window and cannot write through it.
#[derive(Clone, Debug)]
pub struct GridView {
    buffer: Arc<GridBuffer>,
}

impl GridView {
    pub(crate) fn new(buffer: Arc<GridBuffer>) -> Self {
        Self { buffer }
    }

    /// The index window the view covers.
    pub fn window(&self) -> BlockRange {
        self.buffer.window()
    }

    /// Values stored per cell.
    pub fn components(&self) -> usize {
        self.buffer.components()
    }

    /// Component 0 at `(i, j, k)`. Panics outside the window.
    pub fn get(&self, i: i32, j: i32, k: i32) -> f64 {
        self.buffer.get(i, j, k)
    }

    /// Component `c` at `(i, j, k)`. Panics outside the window.
    pub fn get_comp(&self, i: i32, j: i32, k: i32, c: usize) -> f64 {
        self.buffer.get_comp(i, j, k, c)
    }
}
