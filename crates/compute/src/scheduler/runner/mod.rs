//! Affinity scheduler runner: spawns the worker pool for one pass.
//!
//! Split into focused submodules:
//! - `core`: AffinityScheduler struct and construction
//! - `execution`: per-pass thread pool and the claim/execute worker loop

mod core;
mod execution;
#[cfg(test)]
mod tests;

pub use self::core::AffinityScheduler;
