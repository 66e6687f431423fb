use crate::kernels::RowBuffer;

use super::metrics::PassStats;
use super::types::Chunk;

/// Error type for scheduling and kernel execution.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Worker pool must have at least one worker")]
    NoWorkers,
    #[error("Worker {worker} is outside a pool of {workers}")]
    UnknownWorker { worker: usize, workers: usize },
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,
    #[error("Unsupported schedule: {0}")]
    UnsupportedSchedule(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("Kernel failed: {0}")]
    KernelFailed(String),
    #[error("Checksum mismatch for {kernel}: {actual} vs reference {expected}")]
    ChecksumMismatch { kernel: String, expected: f64, actual: f64 },
    #[error("Coverage violation at index {index}: {reason}")]
    CoverageViolation { index: usize, reason: String },
}

/// An iteration body driven by a scheduler.
///
/// `execute` is called concurrently from several workers, always on disjoint
/// chunks. Implementations must only write output rows inside the chunk they
/// were given and only read shared inputs.
pub trait Kernel: Send + Sync {
    /// Human-readable name for logging and reports.
    fn name(&self) -> &str;

    /// Size N of the iteration space.
    fn iterations(&self) -> usize;

    /// Run iterations `[chunk.lower, chunk.upper)`.
    fn execute(&self, chunk: Chunk) -> Result<(), ScheduleError>;

    /// Output rows written by `execute`.
    fn output(&self) -> &RowBuffer;

    /// Zero the output so a fresh run can start.
    fn reset(&self) -> Result<(), ScheduleError> {
        self.output().fill(0.0)
    }
}

/// A strategy that executes one full pass of a kernel over its iteration space.
///
/// Every strategy must cover each index exactly once, so kernels and the
/// validator stay unchanged when one scheduler is swapped for another.
pub trait LoopScheduler: Send + Sync {
    /// Label used in reports (e.g. `affinity`, `guided,4`).
    fn name(&self) -> String;

    /// Number of workers P.
    fn workers(&self) -> usize;

    /// Execute a single pass, returning per-worker statistics.
    fn run_pass(&self, kernel: &dyn Kernel) -> Result<PassStats, ScheduleError>;
}
