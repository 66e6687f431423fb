use super::task::ScheduleError;
use super::types::LocalQueue;

/// Split `[0, n)` into `workers` contiguous blocks in worker-id order.
///
/// The first `n % workers` blocks hold `ceil(n / workers)` iterations and the
/// rest `floor(n / workers)`, so sizes differ by at most one and sum to `n`.
/// Blocks may be empty when `n < workers`.
pub fn partition(n: usize, workers: usize) -> Result<Vec<LocalQueue>, ScheduleError> {
    if workers == 0 {
        return Err(ScheduleError::NoWorkers);
    }

    let base = n / workers;
    let extra = n % workers;

    let mut next_start = 0;
    let queues = (0..workers)
        .map(|w| {
            let remaining = if w < extra { base + 1 } else { base };
            let queue = LocalQueue { remaining, next_start };
            next_start += remaining;
            queue
        })
        .collect();

    Ok(queues)
}
