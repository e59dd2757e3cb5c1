//! The portable loops: [`parallel_for`], [`parallel_reduce_sum`],
//! [`parallel_reduce_min`], and the always-serial [`serial_for`].
//!
//! Each loop invokes its functor once per integer triple in a
//! [`BlockRange`], in unspecified order. The [`ExecPolicy`] decides the
//! backing: an inlined triple loop, or k-slab chunks drained by the
//! worker pool. Reductions seed their accumulator at the operation's
//! identity and combine partials in unspecified order, so consumers may
//! rely on the aggregate value only within floating-point tolerance.

use std::sync::Arc;

use crate::pool::WorkerPool;
use crate::range::BlockRange;
use crate::space::ExecutionSpace;

/// The execution backing resolved for a task at graph-build time.
///
/// Stored on the task's graph node and handed to its body; loop call
/// sites never re-branch on hardware.
#[derive(Clone, Debug)]
pub enum ExecPolicy {
    /// Inline triple loop on the calling thread.
    Serial,
    /// k-slab chunks drained by the shared worker pool.
    Threads(Arc<WorkerPool>),
    /// Device policy. Loop functors execute on the host pool; the
    /// device-resident work of a task lives in its device variant.
    #[cfg(feature = "gpu")]
    Device(Arc<WorkerPool>),
}

impl ExecPolicy {
    /// The execution space this policy realizes.
    pub fn space(&self) -> ExecutionSpace {
        match self {
            Self::Serial => ExecutionSpace::Serial,
            Self::Threads(_) => ExecutionSpace::Threads,
            #[cfg(feature = "gpu")]
            Self::Device(_) => ExecutionSpace::Device,
        }
    }

    /// The worker pool backing this policy, if any.
    pub fn pool(&self) -> Option<&Arc<WorkerPool>> {
        match self {
            Self::Serial => None,
            Self::Threads(pool) => Some(pool),
            #[cfg(feature = "gpu")]
            Self::Device(pool) => Some(pool),
        }
    }
}

fn run_serial<F>(range: BlockRange, f: &F)
where
    F: Fn(i32, i32, i32),
{
    for k in range.begin(2)..range.end(2) {
        for j in range.begin(1)..range.end(1) {
            for i in range.begin(0)..range.end(0) {
                f(i, j, k);
            }
        }
    }
}

/// Split a range into contiguous k-slabs for pool work sharing.
///
/// Produces roughly four slabs per worker so a slow slab self-balances
/// across the pool.
pub(crate) fn k_slabs(range: BlockRange, workers: usize) -> Vec<BlockRange> {
    if range.is_empty() {
        return Vec::new();
    }
    let nk = range.extent(2) as usize;
    let target = (workers.max(1) * 4).min(nk);
    let chunk = nk.div_ceil(target).max(1);

    let mut slabs = Vec::with_capacity(target);
    let mut k = range.begin(2);
    while k < range.end(2) {
        let k_end = (k + chunk as i32).min(range.end(2));
        slabs.push(BlockRange::new(
            [range.begin(0), range.begin(1), k],
            [range.end(0), range.end(1), k_end],
        ));
        k = k_end;
    }
    slabs
}

/// Invoke `f(i, j, k)` once per triple in `range`.
///
/// Invocation order is unspecified and invocations must be
/// independently safe, including under concurrent execution. An empty
/// range performs zero invocations.
pub fn parallel_for<F>(policy: &ExecPolicy, range: BlockRange, f: F)
where
    F: Fn(i32, i32, i32) + Sync,
{
    if range.is_empty() {
        return;
    }
    match policy.pool() {
        None => run_serial(range, &f),
        Some(pool) => {
            let slabs = k_slabs(range, pool.width());
            pool.run_partitioned(slabs, |slab| run_serial(slab, &f));
        }
    }
}

/// Sum `f(i, j, k)` over every triple in `range`.
///
/// The accumulator is seeded at 0.0; an empty range returns exactly
/// 0.0. Partial sums combine in unspecified order.
pub fn parallel_reduce_sum<F>(policy: &ExecPolicy, range: BlockRange, f: F) -> f64
where
    F: Fn(i32, i32, i32) -> f64 + Sync,
{
    reduce(policy, range, 0.0, &f, |a, b| a + b)
}

/// Minimize `f(i, j, k)` over every triple in `range`.
///
/// The accumulator is seeded at `+∞`; an empty range returns exactly
/// `+∞`. Implemented uniformly for every compiled policy.
pub fn parallel_reduce_min<F>(policy: &ExecPolicy, range: BlockRange, f: F) -> f64
where
    F: Fn(i32, i32, i32) -> f64 + Sync,
{
    reduce(policy, range, f64::INFINITY, &f, f64::min)
}

fn reduce<F, C>(policy: &ExecPolicy, range: BlockRange, identity: f64, f: &F, combine: C) -> f64
where
    F: Fn(i32, i32, i32) -> f64 + Sync,
    C: Fn(f64, f64) -> f64 + Copy + Sync,
{
    if range.is_empty() {
        return identity;
    }
    match policy.pool() {
        None => {
            let mut acc = identity;
            for k in range.begin(2)..range.end(2) {
                for j in range.begin(1)..range.end(1) {
                    for i in range.begin(0)..range.end(0) {
                        acc = combine(acc, f(i, j, k));
                    }
                }
            }
            acc
        }
        Some(pool) => {
            let slabs = k_slabs(range, pool.width());
            let partials = pool.run_reduce(slabs, |slab: BlockRange| {
                let mut acc = identity;
                for k in slab.begin(2)..slab.end(2) {
                    for j in slab.begin(1)..slab.end(1) {
                        for i in slab.begin(0)..slab.end(0) {
                            acc = combine(acc, f(i, j, k));
                        }
                    }
                }
                acc
            });
            partials.into_iter().fold(identity, combine)
        }
    }
}

/// Always-serial triple loop, independent of any policy.
///
/// Runs on the calling thread in k-major order, so the functor may
/// mutate captured state. Used by setup and diagnostic code that must
/// not fan out to the pool.
pub fn serial_for<F>(range: BlockRange, mut f: F)
where
    F: FnMut(i32, i32, i32),
{
    for k in range.begin(2)..range.end(2) {
        for j in range.begin(1)..range.end(1) {
            for i in range.begin(0)..range.end(0) {
                f(i, j, k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn policies() -> Vec<ExecPolicy> {
        vec![
            ExecPolicy::Serial,
            ExecPolicy::Threads(Arc::new(WorkerPool::new(4))),
            #[cfg(feature = "gpu")]
            ExecPolicy::Device(Arc::new(WorkerPool::new(4))),
        ]
    }

    #[test]
    fn twenty_seven_invocations_once_each() {
        let range = BlockRange::from_extent([2, 2, 2], [3, 3, 3]);
        for policy in policies() {
            let seen = Mutex::new(Vec::new());
            parallel_for(&policy, range, |i, j, k| {
                seen.lock().unwrap().push((i, j, k));
            });
            let mut seen = seen.into_inner().unwrap();
            seen.sort_unstable();
            assert_eq!(seen.len(), 27, "policy {}", policy.space());
            for &(i, j, k) in &seen {
                assert!((2..5).contains(&i) && (2..5).contains(&j) && (2..5).contains(&k));
            }
            seen.dedup();
            assert_eq!(seen.len(), 27, "duplicate invocation");
        }
    }

    #[test]
    fn zero_extent_performs_zero_invocations() {
        for policy in policies() {
            let range = BlockRange::from_extent([0, 0, 0], [0, 8, 8]);
            let count = AtomicUsize::new(0);
            parallel_for(&policy, range, |_, _, _| {
                count.fetch_add(1, Ordering::Relaxed);
            });
            assert_eq!(count.load(Ordering::Relaxed), 0);
        }
    }

    #[test]
    fn reduce_sum_counts_cells_on_every_policy() {
        let range = BlockRange::from_extent([-1, 0, 3], [7, 5, 9]);
        let n = range.size() as f64;
        for policy in policies() {
            let total = parallel_reduce_sum(&policy, range, |_, _, _| 1.0);
            assert_eq!(total, n, "policy {}", policy.space());
        }
    }

    #[test]
    fn reduce_sum_over_empty_range_is_identity() {
        for policy in policies() {
            let range = BlockRange::empty();
            assert_eq!(parallel_reduce_sum(&policy, range, |_, _, _| 1.0), 0.0);
        }
    }

    #[test]
    fn reduce_min_finds_global_minimum_on_every_policy() {
        let range = BlockRange::from_extent([0, 0, 0], [10, 10, 10]);
        for policy in policies() {
            let min = parallel_reduce_min(&policy, range, |i, j, k| {
                if (i, j, k) == (7, 3, 9) {
                    -5.0
                } else {
                    (i + j + k) as f64
                }
            });
            assert_eq!(min, -5.0, "policy {}", policy.space());
        }
    }

    #[test]
    fn reduce_min_over_empty_range_is_identity() {
        for policy in policies() {
            assert_eq!(
                parallel_reduce_min(&policy, BlockRange::empty(), |_, _, _| 0.0),
                f64::INFINITY
            );
        }
    }

    #[test]
    fn serial_for_visits_in_k_major_order() {
        let range = BlockRange::from_extent([0, 0, 0], [2, 1, 2]);
        let mut seen = Vec::new();
        serial_for(range, |i, j, k| {
            // Serial loop runs on the calling thread; capture directly.
            let _ = j;
            seen.push((i, k));
        });
        assert_eq!(seen, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn slabs_cover_range_without_overlap() {
        let range = BlockRange::from_extent([0, 0, -3], [4, 4, 13]);
        let slabs = k_slabs(range, 3);
        let total: usize = slabs.iter().map(BlockRange::size).sum();
        assert_eq!(total, range.size());
        for pair in slabs.windows(2) {
            assert_eq!(pair[0].end(2), pair[1].begin(2));
        }
    }

    proptest! {
        #[test]
        fn visit_count_matches_size(
            ox in -4i32..4, oy in -4i32..4, oz in -4i32..4,
            ex in 0i32..6, ey in 0i32..6, ez in 0i32..6,
        ) {
            let range = BlockRange::from_extent([ox, oy, oz], [ex, ey, ez]);
            for policy in policies() {
                let count = AtomicUsize::new(0);
                parallel_for(&policy, range, |_, _, _| {
                    count.fetch_add(1, Ordering::Relaxed);
                });
                prop_assert_eq!(count.load(Ordering::Relaxed), range.size());
            }
        }

        #[test]
        fn threaded_sum_matches_serial_reference(
            ex in 0i32..6, ey in 0i32..6, ez in 0i32..6,
        ) {
            let range = BlockRange::from_extent([0, 0, 0], [ex, ey, ez]);
            let f = |i: i32, j: i32, k: i32| (i * 31 + j * 7 + k) as f64;
            let serial = parallel_reduce_sum(&ExecPolicy::Serial, range, f);
            let pool = ExecPolicy::Threads(Arc::new(WorkerPool::new(4)));
            let threaded = parallel_reduce_sum(&pool, range, f);
            prop_assert!((serial - threaded).abs() < 1e-9);
        }
    }
}
