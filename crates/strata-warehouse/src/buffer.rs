//! The [`GridBuffer`]: dense f64 storage over a 3D index window.

use strata_exec::{BlockRange, ExecPolicy};

/// Dense per-cell storage over a rectangular index window.
///
/// Layout is k-major (i fastest, k slowest) with components interleaved
/// per cell, so a run of consecutive k-planes is one contiguous slice.
/// The parallel fill exploits this: disjoint k-plane slices are handed
/// to the worker pool as owned mutable parts.
#[derive(Clone, Debug, PartialEq)]
pub struct GridBuffer {
    window: BlockRange,
    components: usize,
    data: Vec<f64>,
}

impl GridBuffer {
    /// A zeroed buffer covering `window` with `components` values per
    /// cell (minimum 1).
    pub fn new(window: BlockRange, components: usize) -> Self {
        let components = components.max(1);
        Self {
            window,
            components,
            data: vec![0.0; window.size() * components],
        }
    }

    /// The index window this buffer covers.
    pub fn window(&self) -> BlockRange {
        self.window
    }

    /// Values stored per cell.
    pub fn components(&self) -> usize {
        self.components
    }

    fn slot(&self, i: i32, j: i32, k: i32, c: usize) -> usize {
        let d0 = self.window.extent(0) as usize;
        let d1 = self.window.extent(1) as usize;
        let li = (i - self.window.begin(0)) as usize;
        let lj = (j - self.window.begin(1)) as usize;
        let lk = (k - self.window.begin(2)) as usize;
        ((lk * d1 + lj) * d0 + li) * self.components + c
    }

    /// Component 0 at `(i, j, k)`. Panics outside the window.
    pub fn get(&self, i: i32, j: i32, k: i32) -> f64 {
        self.get_comp(i, j, k, 0)
    }

    /// Component `c` at `(i, j, k)`. Panics outside the window.
    pub fn get_comp(&self, i: i32, j: i32, k: i32, c: usize) -> f64 {
        self.data[self.slot(i, j, k, c)]
    }

    /// Store into component 0 at `(i, j, k)`. Panics outside the window.
    pub fn set(&mut self, i: i32, j: i32, k: i32, v: f64) {
        self.set_comp(i, j, k, 0, v);
    }

    /// Store into component `c` at `(i, j, k)`. Panics outside the window.
    pub fn set_comp(&mut self, i: i32, j: i32, k: i32, c: usize, v: f64) {
        let slot = self.slot(i, j, k, c);
        self.data[slot] = v;
    }

    /// Set every stored value (all components) to `v`.
    pub fn fill(&mut self, v: f64) {
        self.data.fill(v);
    }

    /// Fill component 0 of every cell with `f(i, j, k)` under the given
    /// execution policy.
    ///
    /// Under a pooled policy the buffer is split into per-k-plane
    /// slices, which are contiguous and disjoint, and the pool drains
    /// them. Other components are left untouched.
    pub fn fill_with<F>(&mut self, policy: &ExecPolicy, f: F)
    where
        F: Fn(i32, i32, i32) -> f64 + Sync,
    {
        if self.window.is_empty() {
            return;
        }
        let window = self.window;
        let components = self.components;
        let d0 = window.extent(0) as usize;
        let plane = d0 * window.extent(1) as usize * components;

        let write_plane = |k: i32, slab: &mut [f64]| {
            let mut at = 0;
            for j in window.begin(1)..window.end(1) {
                for i in window.begin(0)..window.end(0) {
                    slab[at] = f(i, j, k);
                    at += components;
                }
            }
        };

        match policy.pool() {
            None => {
                for (idx, slab) in self.data.chunks_mut(plane).enumerate() {
                    write_plane(window.begin(2) + idx as i32, slab);
                }
            }
            Some(pool) => {
                let parts: Vec<(i32, &mut [f64])> = self
                    .data
                    .chunks_mut(plane)
                    .enumerate()
                    .map(|(idx, slab)| (window.begin(2) + idx as i32, slab))
                    .collect();
                pool.run_partitioned(parts, |(k, slab)| write_plane(k, slab));
            }
        }
    }

    /// Copy all components over `region` from `src` into this buffer.
    ///
    /// The region is clipped to both windows; returns the number of
    /// cells copied. Both buffers must store the same component count:
    /// every caller derives both sides from one label, so a mismatch is
    /// a bug, not a case to skip.
    pub fn copy_region_from(&mut self, src: &GridBuffer, region: BlockRange) -> usize {
        debug_assert_eq!(
            self.components, src.components,
            "copy between buffers of different component counts"
        );
        let clipped = region
            .intersect(&self.window)
            .intersect(&src.window);
        if clipped.is_empty() || self.components != src.components {
            return 0;
        }
        for k in clipped.begin(2)..clipped.end(2) {
            for j in clipped.begin(1)..clipped.end(1) {
                for i in clipped.begin(0)..clipped.end(0) {
                    for c in 0..self.components {
                        let v = src.get_comp(i, j, k, c);
                        self.set_comp(i, j, k, c, v);
                    }
                }
            }
        }
        clipped.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use strata_exec::WorkerPool;

    #[test]
    fn zeroed_on_allocation() {
        let buf = GridBuffer::new(BlockRange::from_extent([0, 0, 0], [2, 2, 2]), 1);
        assert_eq!(buf.get(1, 1, 1), 0.0);
    }

    #[test]
    fn set_get_roundtrip_with_offset_window() {
        let mut buf = GridBuffer::new(BlockRange::from_extent([-1, -1, -1], [4, 4, 4]), 1);
        buf.set(-1, 2, 0, 3.5);
        assert_eq!(buf.get(-1, 2, 0), 3.5);
        assert_eq!(buf.get(0, 0, 0), 0.0);
    }

    #[test]
    fn components_are_independent() {
        let mut buf = GridBuffer::new(BlockRange::from_extent([0, 0, 0], [2, 2, 2]), 3);
        buf.set_comp(1, 0, 1, 2, 9.0);
        assert_eq!(buf.get_comp(1, 0, 1, 2), 9.0);
        assert_eq!(buf.get_comp(1, 0, 1, 0), 0.0);
    }

    #[test]
    fn fill_with_matches_serial_reference_under_pool() {
        let window = BlockRange::from_extent([-2, 0, 1], [5, 4, 7]);
        let f = |i: i32, j: i32, k: i32| (i * 100 + j * 10 + k) as f64;

        let mut serial = GridBuffer::new(window, 1);
        serial.fill_with(&ExecPolicy::Serial, f);
        let mut pooled = GridBuffer::new(window, 1);
        pooled.fill_with(&ExecPolicy::Threads(Arc::new(WorkerPool::new(4))), f);

        assert_eq!(serial, pooled);
        assert_eq!(serial.get(-2, 3, 5), -200.0 + 30.0 + 5.0);
    }

    #[test]
    fn fill_with_on_empty_window_is_a_no_op() {
        let mut buf = GridBuffer::new(BlockRange::empty(), 1);
        buf.fill_with(&ExecPolicy::Serial, |_, _, _| 1.0);
    }

    #[test]
    fn copy_region_clips_to_both_windows() {
        let mut dst = GridBuffer::new(BlockRange::from_extent([0, 0, 0], [4, 4, 4]), 1);
        let mut src = GridBuffer::new(BlockRange::from_extent([2, 0, 0], [4, 4, 4]), 1);
        src.fill(7.0);

        let copied = dst.copy_region_from(&src, BlockRange::from_extent([0, 0, 0], [8, 4, 4]));
        assert_eq!(copied, 2 * 4 * 4);
        assert_eq!(dst.get(1, 0, 0), 0.0);
        assert_eq!(dst.get(2, 0, 0), 7.0);
        assert_eq!(dst.get(3, 3, 3), 7.0);
    }

    #[test]
    #[should_panic(expected = "different component counts")]
    fn copy_between_mismatched_component_counts_asserts() {
        let mut dst = GridBuffer::new(BlockRange::from_extent([0, 0, 0], [2, 2, 2]), 1);
        let src = GridBuffer::new(BlockRange::from_extent([0, 0, 0], [2, 2, 2]), 3);
        let window = dst.window();
        dst.copy_region_from(&src, window);
    }

    proptest! {
        #[test]
        fn every_slot_stores_independently(
            ox in -4i32..4, oy in -4i32..4, oz in -4i32..4,
            ex in 1i32..5, ey in 1i32..5, ez in 1i32..5,
            comps in 1usize..4,
        ) {
            let window = BlockRange::from_extent([ox, oy, oz], [ex, ey, ez]);
            let mut buf = GridBuffer::new(window, comps);
            let mut v = 1.0;
            for k in window.begin(2)..window.end(2) {
                for j in window.begin(1)..window.end(1) {
                    for i in window.begin(0)..window.end(0) {
                        for c in 0..comps {
                            buf.set_comp(i, j, k, c, v);
                            v += 1.0;
                        }
                    }
                }
            }
            let mut expect = 1.0;
            for k in window.begin(2)..window.end(2) {
                for j in window.begin(1)..window.end(1) {
                    for i in window.begin(0)..window.end(0) {
                        for c in 0..comps {
                            prop_assert_eq!(buf.get_comp(i, j, k, c), expect);
                            expect += 1.0;
                        }
                    }
                }
            }
        }
    }
}
