//! Shared-memory worker pool with index-chunk work sharing.
//!
//! Work items are pushed onto a crossbeam channel and scoped workers
//! drain it, so an uneven workload self-balances. The pool owns no
//! long-lived threads: each loop entry spawns scoped workers and joins
//! them before returning, which keeps loop invocations free of
//! suspension points.

use crossbeam_channel::unbounded;

/// A fixed-width shared-memory execution pool.
///
/// Width is chosen once from the run's capabilities at graph-build time
/// and shared by every task resolved to the threaded or device policy.
#[derive(Debug)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    /// Create a pool with the given worker count (minimum 1).
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    /// Number of workers.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Distribute owned work parts across the pool.
    ///
    /// Each part is processed exactly once by some worker; assignment
    /// order is unspecified. Parts must be independently safe — in
    /// practice they carry disjoint index sub-ranges or disjoint
    /// `&mut` sub-slices.
    pub fn run_partitioned<T, F>(&self, parts: Vec<T>, f: F)
    where
        T: Send,
        F: Fn(T) + Sync,
    {
        if parts.is_empty() {
            return;
        }
        let workers = self.width.min(parts.len());
        if workers <= 1 {
            for part in parts {
                f(part);
            }
            return;
        }

        let (tx, rx) = unbounded();
        for part in parts {
            // The receiver outlives the loop; send cannot fail here.
            let _ = tx.send(part);
        }
        drop(tx);

        std::thread::scope(|scope| {
            let f = &f;
            for _ in 0..workers {
                let rx = rx.clone();
                scope.spawn(move || {
                    while let Ok(part) = rx.recv() {
                        f(part);
                    }
                });
            }
        });
    }

    /// Map each part to a partial result and collect the partials.
    ///
    /// Result order is unspecified; callers combine with an
    /// associative, commutative operation.
    pub fn run_reduce<T, R, F>(&self, parts: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        if parts.is_empty() {
            return Vec::new();
        }
        let workers = self.width.min(parts.len());
        if workers <= 1 {
            return parts.into_iter().map(f).collect();
        }

        let (tx, rx) = unbounded();
        for part in parts {
            let _ = tx.send(part);
        }
        drop(tx);

        let (result_tx, result_rx) = unbounded();
        std::thread::scope(|scope| {
            let f = &f;
            for _ in 0..workers {
                let rx = rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(part) = rx.recv() {
                        let _ = result_tx.send(f(part));
                    }
                });
            }
        });
        drop(result_tx);

        result_rx.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_part_processed_once() {
        let pool = WorkerPool::new(4);
        let counter = AtomicUsize::new(0);
        pool.run_partitioned((0..100).collect(), |_part: usize| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn empty_parts_is_a_no_op() {
        let pool = WorkerPool::new(4);
        pool.run_partitioned(Vec::<usize>::new(), |_| panic!("must not run"));
    }

    #[test]
    fn width_clamps_to_one() {
        assert_eq!(WorkerPool::new(0).width(), 1);
    }

    #[test]
    fn run_reduce_collects_all_partials() {
        let pool = WorkerPool::new(3);
        let mut partials = pool.run_reduce((1..=10).collect(), |part: u64| part * 2);
        partials.sort_unstable();
        assert_eq!(partials, (1..=10).map(|v| v * 2).collect::<Vec<_>>());
    }

    #[test]
    fn mutable_slabs_are_disjoint() {
        let pool = WorkerPool::new(4);
        let mut data = vec![0u64; 64];
        let parts: Vec<(usize, &mut [u64])> = data.chunks_mut(16).enumerate().collect();
        pool.run_partitioned(parts, |(idx, slab)| {
            for v in slab.iter_mut() {
                *v = idx as u64 + 1;
            }
        });
        assert!(data[..16].iter().all(|&v| v == 1));
        assert!(data[48..].iter().all(|&v| v == 4));
    }
}
