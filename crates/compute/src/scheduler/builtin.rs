use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use affinity_core::ScheduleKind;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::metrics::{PassStats, WorkerStats};
use super::partition::partition;
use super::task::{Kernel, LoopScheduler, ScheduleError};
use super::types::{Chunk, WorkerId};

/// Baseline loop schedules run on a rayon pool of P threads.
///
/// `static`, `dynamic` and `guided` broadcast one worker loop per pool thread
/// and split the space through a shared cursor (or fixed arithmetic for
/// `static`). `auto` hands the whole range to rayon's adaptive splitting.
pub struct BuiltinScheduler {
    kind: ScheduleKind,
    chunk_size: Option<usize>,
    workers: usize,
    pool: rayon::ThreadPool,
}

impl BuiltinScheduler {
    pub fn new(
        kind: ScheduleKind,
        workers: usize,
        chunk_size: Option<usize>,
    ) -> Result<Self, ScheduleError> {
        if workers == 0 {
            return Err(ScheduleError::NoWorkers);
        }
        if kind == ScheduleKind::Affinity {
            return Err(ScheduleError::UnsupportedSchedule(kind.to_string()));
        }
        if chunk_size == Some(0) {
            return Err(ScheduleError::InvalidChunkSize);
        }
        if chunk_size.is_some() && !kind.accepts_chunk_size() {
            warn!("Chunk size ignored by the {} schedule", kind);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("builtin-worker-{}", i))
            .build()
            .map_err(|e| ScheduleError::ThreadPool(e.to_string()))?;

        debug!("Built {} scheduler with {} workers", kind, workers);
        Ok(Self { kind, chunk_size, workers, pool })
    }

    /// The static block schedule: one contiguous near-equal block per worker.
    pub fn static_blocks(workers: usize) -> Result<Self, ScheduleError> {
        Self::new(ScheduleKind::Static, workers, None)
    }

    fn effective_chunk(&self) -> Option<usize> {
        self.chunk_size.filter(|_| self.kind.accepts_chunk_size())
    }

    fn broadcast_pass(&self, kernel: &dyn Kernel) -> Result<Vec<WorkerStats>, ScheduleError> {
        let n = kernel.iterations();
        let p = self.workers;
        let kind = self.kind;
        // A chunk larger than the space behaves like one covering it.
        let chunk = self.effective_chunk().map(|c| c.min(n.max(1)));
        let blocks = partition(n, p)?;
        let cursor = AtomicUsize::new(0);

        let results: Vec<Result<WorkerStats, ScheduleError>> = self.pool.broadcast(|ctx| {
            let worker = ctx.index();
            let mut stats = WorkerStats::new(worker);
            let mut run = |c: Chunk| -> Result<(), ScheduleError> {
                kernel.execute(c)?;
                stats.record_chunk(c.len(), false);
                Ok(())
            };

            match (kind, chunk) {
                (ScheduleKind::Static, None) => {
                    let block = blocks[worker];
                    if block.remaining > 0 {
                        run(Chunk::new(block.next_start, block.next_start + block.remaining))?;
                    }
                }
                (ScheduleKind::Static, Some(c)) => {
                    for lower in static_chunk_starts(worker, p, c, n) {
                        run(Chunk::new(lower, lower.saturating_add(c).min(n)))?;
                    }
                }
                (ScheduleKind::Dynamic, c) => {
                    let size = c.unwrap_or(1);
                    while let Some(next) = next_dynamic(&cursor, n, size) {
                        run(next)?;
                    }
                }
                (ScheduleKind::Guided, c) => {
                    let min = c.unwrap_or(1);
                    while let Some(next) = next_guided(&cursor, n, p, min) {
                        run(next)?;
                    }
                }
                (other, _) => {
                    return Err(ScheduleError::UnsupportedSchedule(other.to_string()));
                }
            }
            Ok(stats)
        });

        results.into_iter().collect()
    }

    fn auto_pass(&self, kernel: &dyn Kernel) -> Result<Vec<WorkerStats>, ScheduleError> {
        let n = kernel.iterations();
        let chunks: Vec<AtomicUsize> = (0..self.workers).map(|_| AtomicUsize::new(0)).collect();

        self.pool.install(|| {
            (0..n).into_par_iter().try_for_each(|i| {
                kernel.execute(Chunk::new(i, i + 1))?;
                let worker = rayon::current_thread_index().unwrap_or(0);
                chunks[worker].fetch_add(1, Ordering::Relaxed);
                Ok::<(), ScheduleError>(())
            })
        })?;

        Ok(chunks
            .iter()
            .enumerate()
            .map(|(worker, count)| {
                let count = count.load(Ordering::Relaxed);
                WorkerStats { worker, chunks: count, iterations: count, steals: 0 }
            })
            .collect())
    }
}

impl LoopScheduler for BuiltinScheduler {
    fn name(&self) -> String {
        match self.effective_chunk() {
            Some(c) => format!("{},{}", self.kind, c),
            None => self.kind.to_string(),
        }
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn run_pass(&self, kernel: &dyn Kernel) -> Result<PassStats, ScheduleError> {
        let start = Instant::now();
        let workers = match self.kind {
            ScheduleKind::Auto => self.auto_pass(kernel)?,
            _ => self.broadcast_pass(kernel)?,
        };
        Ok(PassStats { workers, elapsed: start.elapsed() })
    }
}

/// Start indices of the fixed-size chunks dealt round-robin to `worker`.
fn static_chunk_starts(
    worker: WorkerId,
    workers: usize,
    chunk: usize,
    n: usize,
) -> impl Iterator<Item = usize> {
    (worker.saturating_mul(chunk)..n).step_by(workers.saturating_mul(chunk))
}

/// Claim the next dynamic chunk of `size` iterations, capped at what is left.
fn next_dynamic(cursor: &AtomicUsize, n: usize, size: usize) -> Option<Chunk> {
    let mut lower = cursor.load(Ordering::Relaxed);
    loop {
        if lower >= n {
            return None;
        }
        let upper = lower.saturating_add(size).min(n);
        match cursor.compare_exchange_weak(lower, upper, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return Some(Chunk::new(lower, upper)),
            Err(actual) => lower = actual,
        }
    }
}

/// Claim the next guided chunk: `max(ceil(remaining / P), min)` iterations,
/// capped at what is left.
fn next_guided(cursor: &AtomicUsize, n: usize, workers: usize, min: usize) -> Option<Chunk> {
    let mut lower = cursor.load(Ordering::Relaxed);
    loop {
        if lower >= n {
            return None;
        }
        let remaining = n - lower;
        let size = remaining.div_ceil(workers).max(min).min(remaining);
        let upper = lower + size;
        match cursor.compare_exchange_weak(lower, upper, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return Some(Chunk::new(lower, upper)),
            Err(actual) => lower = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::RowBuffer;

    struct CountingKernel {
        hits: Vec<AtomicUsize>,
        output: RowBuffer,
    }

    impl CountingKernel {
        fn new(n: usize) -> Self {
            Self {
                hits: (0..n).map(|_| AtomicUsize::new(0)).collect(),
                output: RowBuffer::zeroed(n, 1),
            }
        }

        fn all_once(&self) -> bool {
            self.hits.iter().all(|h| h.load(Ordering::Relaxed) == 1)
        }
    }

    impl Kernel for CountingKernel {
        fn name(&self) -> &str {
            "counting"
        }

        fn iterations(&self) -> usize {
            self.hits.len()
        }

        fn execute(&self, chunk: Chunk) -> Result<(), ScheduleError> {
            for i in chunk.range() {
                self.hits[i].fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        }

        fn output(&self) -> &RowBuffer {
            &self.output
        }
    }

    #[test]
    fn every_schedule_covers_exactly_once() {
        let kinds = [
            ScheduleKind::Static,
            ScheduleKind::Dynamic,
            ScheduleKind::Guided,
            ScheduleKind::Auto,
        ];
        for kind in kinds {
            for chunk in [None, Some(1), Some(3), Some(64)] {
                for (n, p) in [(729, 6), (10, 3), (2, 4), (0, 2)] {
                    let kernel = CountingKernel::new(n);
                    let scheduler = BuiltinScheduler::new(kind, p, chunk).unwrap();
                    let pass = scheduler.run_pass(&kernel).unwrap();
                    assert!(kernel.all_once(), "{kind} chunk={chunk:?} n={n} p={p}");
                    assert_eq!(pass.total_iterations(), n);
                    assert_eq!(pass.total_steals(), 0);
                }
            }
        }
    }

    #[test]
    fn static_blocks_use_one_chunk_per_worker() {
        let kernel = CountingKernel::new(10);
        let scheduler = BuiltinScheduler::static_blocks(3).unwrap();
        let pass = scheduler.run_pass(&kernel).unwrap();
        let mut iterations: Vec<usize> = pass.workers.iter().map(|w| w.iterations).collect();
        iterations.sort_unstable();
        assert_eq!(iterations, vec![3, 3, 4]);
        assert!(pass.workers.iter().all(|w| w.chunks == 1));
    }

    #[test]
    fn static_round_robin_starts() {
        let starts: Vec<usize> = static_chunk_starts(1, 3, 2, 20).collect();
        assert_eq!(starts, vec![2, 8, 14]);
        assert_eq!(static_chunk_starts(2, 3, 4, 5).count(), 0);
    }

    #[test]
    fn oversized_chunks_still_cover_exactly_once() {
        let kinds = [ScheduleKind::Static, ScheduleKind::Dynamic, ScheduleKind::Guided];
        for kind in kinds {
            for chunk in [usize::MAX / 3 + 1, usize::MAX / 4, usize::MAX] {
                let kernel = CountingKernel::new(10);
                let scheduler = BuiltinScheduler::new(kind, 4, Some(chunk)).unwrap();
                let pass = scheduler.run_pass(&kernel).unwrap();
                assert!(kernel.all_once(), "{kind} chunk={chunk}");
                assert_eq!(pass.total_chunks(), 1);
            }
        }
    }

    #[test]
    fn dynamic_chunks_stop_at_the_end() {
        let cursor = AtomicUsize::new(0);
        let chunks: Vec<Chunk> = std::iter::from_fn(|| next_dynamic(&cursor, 10, 4)).collect();
        assert_eq!(chunks, vec![Chunk::new(0, 4), Chunk::new(4, 8), Chunk::new(8, 10)]);
        assert_eq!(cursor.load(Ordering::Relaxed), 10);
        assert!(next_dynamic(&cursor, 10, usize::MAX).is_none());
    }

    #[test]
    fn guided_chunks_shrink() {
        let cursor = AtomicUsize::new(0);
        let sizes: Vec<usize> = std::iter::from_fn(|| next_guided(&cursor, 100, 4, 1))
            .map(|c| c.len())
            .collect();
        assert_eq!(sizes[0], 25);
        assert_eq!(sizes[1], 19);
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(sizes.iter().sum::<usize>(), 100);
    }

    #[test]
    fn guided_respects_minimum_chunk() {
        let cursor = AtomicUsize::new(0);
        let sizes: Vec<usize> = std::iter::from_fn(|| next_guided(&cursor, 30, 4, 5))
            .map(|c| c.len())
            .collect();
        assert_eq!(sizes, vec![8, 6, 5, 5, 5, 1]);
    }

    #[test]
    fn names_include_chunk_size_when_used() {
        let name = |kind, chunk| BuiltinScheduler::new(kind, 2, chunk).unwrap().name();
        assert_eq!(name(ScheduleKind::Dynamic, Some(4)), "dynamic,4");
        assert_eq!(name(ScheduleKind::Guided, None), "guided");
        assert_eq!(name(ScheduleKind::Auto, Some(4)), "auto");
    }

    #[test]
    fn affinity_is_not_a_builtin() {
        assert!(matches!(
            BuiltinScheduler::new(ScheduleKind::Affinity, 2, None),
            Err(ScheduleError::UnsupportedSchedule(_))
        ));
        assert!(matches!(
            BuiltinScheduler::new(ScheduleKind::Static, 0, None),
            Err(ScheduleError::NoWorkers)
        ));
    }
}
