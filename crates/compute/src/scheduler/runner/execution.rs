use std::thread;
use std::time::Instant;

use tracing::{debug, error};

use crate::scheduler::coverage::verify_coverage;
use crate::scheduler::metrics::{PassStats, WorkerStats};
use crate::scheduler::state::SchedulerState;
use crate::scheduler::task::{Kernel, LoopScheduler, ScheduleError};
use crate::scheduler::types::{Chunk, Claim, WorkerId};

use super::AffinityScheduler;

struct WorkerOutcome {
    stats: WorkerStats,
    chunks: Vec<Chunk>,
}

impl LoopScheduler for AffinityScheduler {
    fn name(&self) -> String {
        "affinity".to_string()
    }

    fn workers(&self) -> usize {
        self.workers
    }

    /// Run one pass: P threads claim and execute chunks until exhaustion.
    fn run_pass(&self, kernel: &dyn Kernel) -> Result<PassStats, ScheduleError> {
        let n = kernel.iterations();
        let state = SchedulerState::new(n, self.workers)?;
        let track = self.check_coverage;
        let start = Instant::now();

        let joined: Vec<Result<WorkerOutcome, ScheduleError>> = thread::scope(|s| {
            let mut results = Vec::with_capacity(self.workers);
            let mut handles = Vec::with_capacity(self.workers);

            for worker in 0..self.workers {
                let state = &state;
                let spawned = thread::Builder::new()
                    .name(format!("affinity-worker-{}", worker))
                    .spawn_scoped(s, move || worker_loop(worker, state, kernel, track));
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(e) => {
                        // Workers already running steal the unclaimed blocks.
                        error!("Failed to spawn worker {}: {}", worker, e);
                        results.push(Err(ScheduleError::ThreadPool(format!(
                            "spawn worker {}: {}",
                            worker, e
                        ))));
                        break;
                    }
                }
            }

            for (worker, handle) in handles {
                results.push(
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(ScheduleError::WorkerPanicked(worker))),
                );
            }
            results
        });
        let elapsed = start.elapsed();

        let mut workers = Vec::with_capacity(self.workers);
        let mut chunks = Vec::new();
        for outcome in joined {
            let outcome = outcome?;
            workers.push(outcome.stats);
            chunks.extend(outcome.chunks);
        }
        workers.sort_by_key(|w| w.worker);

        if track {
            verify_coverage(n, chunks)?;
        }
        debug_assert!(state.is_drained().unwrap_or(false));

        let pass = PassStats { workers, elapsed };
        debug!(
            kernel = kernel.name(),
            chunks = pass.total_chunks(),
            steals = pass.total_steals(),
            elapsed_us = elapsed.as_micros() as u64,
            "affinity pass complete"
        );
        Ok(pass)
    }
}

/// Claim and execute chunks until the shared state reports exhaustion.
fn worker_loop(
    worker: WorkerId,
    state: &SchedulerState,
    kernel: &dyn Kernel,
    track: bool,
) -> Result<WorkerOutcome, ScheduleError> {
    let mut stats = WorkerStats::new(worker);
    let mut chunks = Vec::new();

    loop {
        match state.claim(worker)? {
            Claim::Exhausted => break,
            Claim::Chunk { chunk, donor } => {
                kernel.execute(chunk)?;
                stats.record_chunk(chunk.len(), donor != worker);
                if track {
                    chunks.push(chunk);
                }
            }
        }
    }

    debug!(
        worker,
        chunks = stats.chunks,
        iterations = stats.iterations,
        steals = stats.steals,
        "worker finished"
    );
    Ok(WorkerOutcome { stats, chunks })
}
