use tracing::info;

use crate::scheduler::task::ScheduleError;

/// Affinity self-scheduler over a fixed pool of P OS threads.
///
/// Every pass builds a fresh [`SchedulerState`](crate::scheduler::SchedulerState),
/// spawns one thread per worker, and joins them once the shared queues are
/// exhausted. Workers coordinate only through `claim`.
#[derive(Debug, Clone)]
pub struct AffinityScheduler {
    pub(super) workers: usize,
    /// Record every chunk and verify exact coverage after the pass.
    pub(super) check_coverage: bool,
}

impl AffinityScheduler {
    /// Create a scheduler with `workers` threads per pass.
    pub fn new(workers: usize) -> Result<Self, ScheduleError> {
        if workers == 0 {
            return Err(ScheduleError::NoWorkers);
        }
        info!("Affinity scheduler configured with {} workers", workers);
        Ok(Self { workers, check_coverage: false })
    }

    /// Enable the post-pass coverage check.
    pub fn with_coverage_check(mut self, enabled: bool) -> Self {
        self.check_coverage = enabled;
        self
    }

    pub fn coverage_check(&self) -> bool {
        self.check_coverage
    }
}
