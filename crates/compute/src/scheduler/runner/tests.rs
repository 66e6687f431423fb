use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::kernels::RowBuffer;
use crate::scheduler::runner::AffinityScheduler;
use crate::scheduler::task::{Kernel, LoopScheduler, ScheduleError};
use crate::scheduler::types::Chunk;

/// Mock kernel counting how often each index is executed.
struct CountingKernel {
    hits: Vec<AtomicUsize>,
    /// Rows below this bound sleep before completing.
    slow_below: usize,
    slow_for: Duration,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
    output: RowBuffer,
}

impl CountingKernel {
    fn new(n: usize) -> Self {
        Self {
            hits: (0..n).map(|_| AtomicUsize::new(0)).collect(),
            slow_below: 0,
            slow_for: Duration::ZERO,
            fail_at: None,
            panic_at: None,
            output: RowBuffer::zeroed(n, 1),
        }
    }

    fn with_slow_prefix(mut self, rows: usize, each: Duration) -> Self {
        self.slow_below = rows;
        self.slow_for = each;
        self
    }

    fn hit_counts(&self) -> Vec<usize> {
        self.hits.iter().map(|h| h.load(Ordering::Relaxed)).collect()
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
            if self.fail_at == Some(i) {
                return Err(ScheduleError::KernelFailed(format!("row {}", i)));
            }
            if self.panic_at == Some(i) {
                panic!("row {} blew up", i);
            }
            if i < self.slow_below {
                std::thread::sleep(self.slow_for);
            }
            self.hits[i].fetch_add(1, Ordering::Relaxed);
            self.output.with_row(i, |row| row[0] += 1.0)?;
        }
        Ok(())
    }

    fn output(&self) -> &RowBuffer {
        &self.output
    }
}

#[test]
fn zero_workers_rejected() {
    assert!(matches!(AffinityScheduler::new(0), Err(ScheduleError::NoWorkers)));
}

#[test]
fn scheduler_creation() {
    let scheduler = AffinityScheduler::new(4).unwrap();
    assert_eq!(scheduler.workers(), 4);
    assert_eq!(scheduler.name(), "affinity");
    assert!(!scheduler.coverage_check());
    assert!(scheduler.with_coverage_check(true).coverage_check());
}

#[test]
fn every_index_runs_exactly_once() {
    for (n, p) in [(729, 6), (100, 7), (5, 5), (3, 8), (64, 1), (1, 2)] {
        let kernel = CountingKernel::new(n);
        let scheduler = AffinityScheduler::new(p).unwrap().with_coverage_check(true);
        let pass = scheduler.run_pass(&kernel).unwrap();

        assert!(kernel.hit_counts().iter().all(|&h| h == 1), "n={n} p={p}");
        assert_eq!(pass.total_iterations(), n);
        assert_eq!(pass.workers.len(), p);
        assert_eq!(kernel.output().sum().unwrap(), n as f64);
    }
}

#[test]
fn empty_space_finishes_without_chunks() {
    let kernel = CountingKernel::new(0);
    let scheduler = AffinityScheduler::new(4).unwrap().with_coverage_check(true);
    let pass = scheduler.run_pass(&kernel).unwrap();
    assert_eq!(pass.total_chunks(), 0);
    assert_eq!(pass.workers.len(), 4);
}

#[test]
fn single_worker_never_steals() {
    let kernel = CountingKernel::new(50);
    let scheduler = AffinityScheduler::new(1).unwrap();
    let pass = scheduler.run_pass(&kernel).unwrap();
    assert_eq!(pass.total_steals(), 0);
    // remaining / 1 hands the whole block over in one chunk.
    assert_eq!(pass.total_chunks(), 1);
}

#[test]
fn idle_workers_steal_from_slow_block() {
    // Worker 0 owns rows 0..16, each taking 5ms; the other blocks are instant.
    let kernel = CountingKernel::new(64).with_slow_prefix(16, Duration::from_millis(5));
    let scheduler = AffinityScheduler::new(4).unwrap().with_coverage_check(true);
    let pass = scheduler.run_pass(&kernel).unwrap();

    assert!(pass.total_steals() > 0, "expected idle workers to steal");
    assert!(kernel.hit_counts().iter().all(|&h| h == 1));
}

#[test]
fn workers_are_reported_in_id_order() {
    let kernel = CountingKernel::new(40);
    let scheduler = AffinityScheduler::new(5).unwrap();
    let pass = scheduler.run_pass(&kernel).unwrap();
    let ids: Vec<usize> = pass.workers.iter().map(|w| w.worker).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[test]
fn repeated_passes_use_fresh_state() {
    let kernel = CountingKernel::new(30);
    let scheduler = AffinityScheduler::new(3).unwrap();
    for _ in 0..4 {
        scheduler.run_pass(&kernel).unwrap();
    }
    assert!(kernel.hit_counts().iter().all(|&h| h == 4));
}

#[test]
fn kernel_failure_is_propagated() {
    let mut kernel = CountingKernel::new(20);
    kernel.fail_at = Some(7);
    let scheduler = AffinityScheduler::new(3).unwrap();
    assert!(matches!(scheduler.run_pass(&kernel), Err(ScheduleError::KernelFailed(_))));
}

#[test]
fn worker_panic_is_reported() {
    let mut kernel = CountingKernel::new(20);
    kernel.panic_at = Some(0);
    let scheduler = AffinityScheduler::new(2).unwrap();
    assert!(matches!(scheduler.run_pass(&kernel), Err(ScheduleError::WorkerPanicked(_))));
}
