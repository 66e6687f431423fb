//! Loop schedulers for a flat iteration space split across a fixed worker pool.
//!
//! [`AffinityScheduler`] gives each worker a contiguous block, hands out
//! chunks of `remaining / P` from the worker's own block, and lets idle
//! workers steal from the most loaded block. [`BuiltinScheduler`] provides the
//! static/dynamic/guided/auto baselines behind the same [`LoopScheduler`]
//! trait.

pub mod builtin;
pub mod coverage;
pub mod metrics;
pub mod partition;
pub mod runner;
pub mod state;
pub mod task;
pub mod types;

pub use builtin::BuiltinScheduler;
pub use coverage::{ClaimRecord, ClaimTrace, drain_round_robin, drain_sequential, verify_coverage};
pub use metrics::{PassStats, RunMetrics, WorkerStats};
pub use partition::partition;
pub use runner::AffinityScheduler;
pub use state::SchedulerState;
pub use task::{Kernel, LoopScheduler, ScheduleError};
pub use types::{Chunk, Claim, LocalQueue, WorkerId};
