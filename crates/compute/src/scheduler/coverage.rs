//! Exactly-once coverage checks and a single-threaded claim driver.

use super::state::SchedulerState;
use super::task::ScheduleError;
use super::types::{Chunk, Claim, WorkerId};

/// One successful claim, in the order it was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimRecord {
    pub worker: WorkerId,
    pub donor: WorkerId,
    pub chunk: Chunk,
}

/// Claims made while draining a pass without threads.
#[derive(Debug, Clone, Default)]
pub struct ClaimTrace {
    pub records: Vec<ClaimRecord>,
    /// Total calls to `claim`, including the ones that returned `Exhausted`.
    pub calls: usize,
}

impl ClaimTrace {
    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        self.records.iter().map(|r| r.chunk)
    }

    pub fn claimed(&self) -> usize {
        self.chunks().map(|c| c.len()).sum()
    }
}

/// Check that `chunks` tile `[0, n)` with no gaps, overlaps or empty chunks.
pub fn verify_coverage<I>(n: usize, chunks: I) -> Result<(), ScheduleError>
where
    I: IntoIterator<Item = Chunk>,
{
    let mut chunks: Vec<Chunk> = chunks.into_iter().collect();
    chunks.sort_unstable();

    let mut expected = 0;
    for chunk in chunks {
        if chunk.is_empty() {
            return Err(ScheduleError::CoverageViolation {
                index: chunk.lower,
                reason: "empty chunk".to_string(),
            });
        }
        if chunk.lower < expected {
            return Err(ScheduleError::CoverageViolation {
                index: chunk.lower,
                reason: format!("chunk {} overlaps previous chunk", chunk),
            });
        }
        if chunk.lower > expected {
            return Err(ScheduleError::CoverageViolation {
                index: expected,
                reason: format!("gap before chunk {}", chunk),
            });
        }
        expected = chunk.upper;
    }

    if expected != n {
        return Err(ScheduleError::CoverageViolation {
            index: expected,
            reason: format!("iterations {}..{} never claimed", expected, n),
        });
    }
    Ok(())
}

/// Drain a fresh pass over `[0, n)` from a single thread using the same claim
/// protocol as the threaded workers.
///
/// `pick(active)` chooses which of the `active` still-running workers claims
/// next (the result is taken modulo `active`), which lets tests replay any
/// interleaving. A worker retires after it observes `Exhausted`.
pub fn drain_sequential<F>(
    n: usize,
    workers: usize,
    mut pick: F,
) -> Result<ClaimTrace, ScheduleError>
where
    F: FnMut(usize) -> usize,
{
    let state = SchedulerState::new(n, workers)?;
    let mut active: Vec<WorkerId> = (0..workers).collect();
    let mut trace = ClaimTrace::default();

    while !active.is_empty() {
        let slot = pick(active.len()) % active.len();
        let worker = active[slot];
        trace.calls += 1;
        match state.claim(worker)? {
            Claim::Chunk { chunk, donor } => {
                trace.records.push(ClaimRecord { worker, donor, chunk });
            }
            Claim::Exhausted => {
                active.swap_remove(slot);
            }
        }
    }

    Ok(trace)
}

/// [`drain_sequential`] with workers taking turns in id order.
pub fn drain_round_robin(n: usize, workers: usize) -> Result<ClaimTrace, ScheduleError> {
    let mut turn = 0;
    drain_sequential(n, workers, move |active| {
        turn += 1;
        (turn - 1) % active
    })
}
