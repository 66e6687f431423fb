use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace};

use super::partition::partition;
use super::task::ScheduleError;
use super::types::{Chunk, Claim, LocalQueue, WorkerId};

/// Global countdown of unclaimed iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalRemaining {
    /// Equal to the sum of every local queue's `remaining`.
    Count(usize),
    /// Terminal state, entered once the count hit zero and a claim observed it.
    Drained,
}

#[derive(Debug)]
struct Queues {
    local: Vec<LocalQueue>,
    global: GlobalRemaining,
}

/// Shared bookkeeping for one affinity-scheduled pass.
///
/// Holds one [`LocalQueue`] per worker plus the global remaining count, all
/// behind a single mutex. The only mutation is [`claim`](Self::claim), which
/// updates the donor queue and the global count in one critical section, so
/// the sum invariant can never be observed half-applied.
///
/// Single use: build a fresh instance for every pass.
#[derive(Debug)]
pub struct SchedulerState {
    workers: usize,
    queues: Mutex<Queues>,
}

impl SchedulerState {
    /// Partition `[0, n)` across `workers` local queues.
    pub fn new(n: usize, workers: usize) -> Result<Self, ScheduleError> {
        let local = partition(n, workers)?;
        if workers == 1 {
            debug!("single-worker pool, no rebalancing possible");
        }
        Ok(Self {
            workers,
            queues: Mutex::new(Queues { local, global: GlobalRemaining::Count(n) }),
        })
    }

    /// Claim the next chunk for `worker`.
    ///
    /// Draws from the worker's own queue while it has work, otherwise from the
    /// most loaded queue (first maximum in worker-id order). The chunk is
    /// `max(1, remaining / P)` iterations, capped at `remaining`. Once every
    /// queue is empty, this and all later calls return [`Claim::Exhausted`].
    pub fn claim(&self, worker: WorkerId) -> Result<Claim, ScheduleError> {
        if worker >= self.workers {
            return Err(ScheduleError::UnknownWorker { worker, workers: self.workers });
        }
        let mut queues = self.lock()?;
        let claim = queues.claim(worker, self.workers);
        match claim {
            Claim::Chunk { chunk, donor } => {
                trace!(worker, donor, lower = chunk.lower, upper = chunk.upper, "claimed chunk");
            }
            Claim::Exhausted => trace!(worker, "queues exhausted"),
        }
        Ok(claim)
    }

    /// Unclaimed iterations, or `None` once the pass has drained.
    pub fn global_remaining(&self) -> Result<Option<usize>, ScheduleError> {
        Ok(match self.lock()?.global {
            GlobalRemaining::Count(n) => Some(n),
            GlobalRemaining::Drained => None,
        })
    }

    pub fn is_drained(&self) -> Result<bool, ScheduleError> {
        Ok(self.global_remaining()?.is_none())
    }

    /// Copy of the local queues, for diagnostics and tests.
    pub fn snapshot(&self) -> Result<Vec<LocalQueue>, ScheduleError> {
        Ok(self.lock()?.local.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Queues>, ScheduleError> {
        self.queues
            .lock()
            .map_err(|e| ScheduleError::LockPoisoned(format!("SchedulerState: {}", e)))
    }
}

impl Queues {
    fn claim(&mut self, worker: WorkerId, workers: usize) -> Claim {
        let donor = if self.local[worker].remaining > 0 {
            worker
        } else {
            most_loaded(&self.local)
        };

        let queue = &mut self.local[donor];
        if queue.remaining == 0 {
            // Every queue is empty, so the count must already be zero.
            debug_assert!(matches!(
                self.global,
                GlobalRemaining::Count(0) | GlobalRemaining::Drained
            ));
            if self.global == GlobalRemaining::Count(0) {
                debug!("pass drained");
                self.global = GlobalRemaining::Drained;
            }
            return Claim::Exhausted;
        }

        let size = (queue.remaining / workers).max(1).min(queue.remaining);
        let chunk = Chunk::new(queue.next_start, queue.next_start + size);
        queue.next_start += size;
        queue.remaining -= size;

        if let GlobalRemaining::Count(n) = &mut self.global {
            *n -= size;
        }

        Claim::Chunk { chunk, donor }
    }
}

/// Index of the queue with the strictly largest `remaining`; ties go to the
/// lowest worker id.
fn most_loaded(queues: &[LocalQueue]) -> WorkerId {
    let mut best = 0;
    for (idx, queue) in queues.iter().enumerate().skip(1) {
        if queue.remaining > queues[best].remaining {
            best = idx;
        }
    }
    best
}
