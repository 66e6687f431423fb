use std::time::Duration;

use serde::Serialize;

use super::types::WorkerId;

/// What one worker did during a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub worker: WorkerId,
    /// Chunks executed.
    pub chunks: usize,
    /// Iterations executed across all chunks.
    pub iterations: usize,
    /// Chunks taken from another worker's queue.
    pub steals: usize,
}

impl WorkerStats {
    pub fn new(worker: WorkerId) -> Self {
        Self { worker, ..Self::default() }
    }

    pub fn record_chunk(&mut self, len: usize, stolen: bool) {
        self.chunks += 1;
        self.iterations += len;
        if stolen {
            self.steals += 1;
        }
    }
}

/// Result of executing one pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassStats {
    pub workers: Vec<WorkerStats>,
    pub elapsed: Duration,
}

impl PassStats {
    pub fn total_chunks(&self) -> usize {
        self.workers.iter().map(|w| w.chunks).sum()
    }

    pub fn total_iterations(&self) -> usize {
        self.workers.iter().map(|w| w.iterations).sum()
    }

    pub fn total_steals(&self) -> usize {
        self.workers.iter().map(|w| w.steals).sum()
    }
}

/// Aggregated statistics across the repeated passes of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    pub passes: u64,
    pub chunks: usize,
    pub iterations: usize,
    pub steals: usize,
    pub total_duration: Duration,
    pub avg_pass_duration: Duration,
    /// Chunks executed per worker, summed over all passes.
    pub chunks_per_worker: Vec<usize>,
}

impl RunMetrics {
    /// Fold one pass into the aggregate.
    pub fn record_pass(&mut self, pass: &PassStats) {
        self.passes += 1;
        self.chunks += pass.total_chunks();
        self.iterations += pass.total_iterations();
        self.steals += pass.total_steals();
        self.total_duration += pass.elapsed;

        if self.chunks_per_worker.len() < pass.workers.len() {
            self.chunks_per_worker.resize(pass.workers.len(), 0);
        }
        for w in &pass.workers {
            self.chunks_per_worker[w.worker] += w.chunks;
        }

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        self.avg_pass_duration = if self.passes == 1 {
            pass.elapsed
        } else {
            let prev_nanos = self.avg_pass_duration.as_nanos() as f64;
            let cur_nanos = pass.elapsed.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / self.passes as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
    }
}
