pub mod bench;
pub mod kernels;
pub mod report;
pub mod scheduler;
pub mod validate;

pub use bench::{build_scheduler, run_passes, BenchError, Benchmark, KernelReport};
pub use kernels::{build_kernel, IrregularLogSum, RowBuffer, TriangularCosine};
pub use scheduler::{
    AffinityScheduler, BuiltinScheduler, Chunk, Claim, Kernel, LocalQueue, LoopScheduler,
    PassStats, RunMetrics, ScheduleError, SchedulerState, WorkerStats,
};
pub use validate::{checksum, Checksum, REFERENCE_DIGITS};
