use std::time::Instant;

use affinity_core::{BenchConfig, ConfigError, KernelKind, ScheduleKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::kernels::build_kernel;
use crate::scheduler::{
    AffinityScheduler, BuiltinScheduler, Kernel, LoopScheduler, RunMetrics, ScheduleError,
};
use crate::validate::{checksum, Checksum, REFERENCE_DIGITS};

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Outcome of running one kernel for `reps` passes under one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct KernelReport {
    pub kernel: KernelKind,
    pub loop_number: u8,
    pub schedule: ScheduleKind,
    /// Scheduler label, including the chunk size when one applies.
    pub scheduler: String,
    pub chunk_size: Option<usize>,
    pub threads: usize,
    pub size: usize,
    pub reps: usize,
    pub elapsed_secs: f64,
    pub checksum: f64,
    /// Static block checksum, present when verification ran.
    pub reference_checksum: Option<f64>,
    pub metrics: RunMetrics,
    pub started_at: DateTime<Utc>,
}

/// Build the scheduler named by `kind`.
pub fn build_scheduler(
    kind: ScheduleKind,
    workers: usize,
    chunk_size: Option<usize>,
    check_coverage: bool,
) -> Result<Box<dyn LoopScheduler>, ScheduleError> {
    match kind {
        ScheduleKind::Affinity => Ok(Box::new(
            AffinityScheduler::new(workers)?.with_coverage_check(check_coverage),
        )),
        other => Ok(Box::new(BuiltinScheduler::new(other, workers, chunk_size)?)),
    }
}

/// Run `reps` passes of `kernel` under `scheduler`, accumulating into its output.
pub fn run_passes(
    scheduler: &dyn LoopScheduler,
    kernel: &dyn Kernel,
    reps: usize,
) -> Result<RunMetrics, ScheduleError> {
    let mut metrics = RunMetrics::default();
    for _ in 0..reps {
        let pass = scheduler.run_pass(kernel)?;
        metrics.record_pass(&pass);
    }
    Ok(metrics)
}

/// Repeated-trial driver: runs every configured kernel and validates the result.
pub struct Benchmark {
    config: BenchConfig,
    threads: usize,
}

impl Benchmark {
    /// Validate `config`. Configuration errors surface here, before any pass runs.
    pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let threads = config.resolved_threads();
        Ok(Self { config, threads })
    }

    pub fn run(&self) -> Result<Vec<KernelReport>, BenchError> {
        let scheduler = build_scheduler(
            self.config.schedule,
            self.threads,
            self.config.chunk_size,
            self.config.verify,
        )?;
        info!(
            "Running {} kernels with {} on {} workers",
            self.config.kernels.len(),
            scheduler.name(),
            scheduler.workers()
        );

        self.config
            .kernels
            .iter()
            .map(|&kind| self.run_kernel(scheduler.as_ref(), kind))
            .collect()
    }

    fn run_kernel(
        &self,
        scheduler: &dyn LoopScheduler,
        kind: KernelKind,
    ) -> Result<KernelReport, BenchError> {
        let size = self.config.size;
        let reps = self.config.reps;

        let kernel = build_kernel(kind, size);
        let started_at = Utc::now();
        let start = Instant::now();
        let metrics = run_passes(scheduler, kernel.as_ref(), reps)?;
        let elapsed = start.elapsed();
        let sum = checksum(kernel.as_ref())?;

        info!(
            "Loop {} ({}) done in {:.3}s: checksum={:.6}, chunks={}, steals={}",
            kind.loop_number(),
            kind,
            elapsed.as_secs_f64(),
            sum.value,
            metrics.chunks,
            metrics.steals
        );

        let reference_checksum = if self.config.verify {
            let reference = self.reference_checksum(kernel.as_ref())?;
            sum.verify_against(&reference, REFERENCE_DIGITS)?;
            info!("Loop {} checksum matches static reference", kind.loop_number());
            Some(reference.value)
        } else {
            None
        };

        Ok(KernelReport {
            kernel: kind,
            loop_number: kind.loop_number(),
            schedule: self.config.schedule,
            scheduler: scheduler.name(),
            chunk_size: self
                .config
                .chunk_size
                .filter(|_| self.config.schedule.accepts_chunk_size()),
            threads: self.threads,
            size,
            reps,
            elapsed_secs: elapsed.as_secs_f64(),
            checksum: sum.value,
            reference_checksum,
            metrics,
            started_at,
        })
    }

    /// Reset `kernel` and rerun it under the static block schedule.
    fn reference_checksum(&self, kernel: &dyn Kernel) -> Result<Checksum, ScheduleError> {
        kernel.reset()?;
        let reference = BuiltinScheduler::static_blocks(self.threads)?;
        run_passes(&reference, kernel, self.config.reps)?;
        checksum(kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(schedule: ScheduleKind) -> BenchConfig {
        BenchConfig {
            size: 60,
            threads: 3,
            reps: 2,
            schedule,
            verify: true,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let config = BenchConfig { size: 4, threads: 8, ..BenchConfig::default() };
        assert!(matches!(
            Benchmark::new(config),
            Err(BenchError::Config(ConfigError::ThreadsExceedIterations { .. }))
        ));
    }

    #[test]
    fn verified_run_reports_both_kernels() {
        let bench = Benchmark::new(small_config(ScheduleKind::Affinity)).unwrap();
        let reports = bench.run().unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].kernel, KernelKind::Cosine);
        assert_eq!(reports[1].loop_number, 2);
        for report in &reports {
            assert_eq!(report.scheduler, "affinity");
            assert_eq!(report.metrics.passes, 2);
            assert_eq!(report.metrics.iterations, 120);
            assert_eq!(report.reference_checksum, Some(report.checksum));
        }
    }

    #[test]
    fn chunk_size_only_reported_when_used() {
        let mut config = small_config(ScheduleKind::Dynamic);
        config.chunk_size = Some(4);
        config.kernels = vec![KernelKind::Logsum];
        let reports = Benchmark::new(config).unwrap().run().unwrap();
        assert_eq!(reports[0].chunk_size, Some(4));
        assert_eq!(reports[0].scheduler, "dynamic,4");

        let mut config = small_config(ScheduleKind::Affinity);
        config.chunk_size = Some(4);
        config.kernels = vec![KernelKind::Logsum];
        let reports = Benchmark::new(config).unwrap().run().unwrap();
        assert_eq!(reports[0].chunk_size, None);
    }

    #[test]
    fn build_scheduler_dispatches_by_kind() {
        let affinity = build_scheduler(ScheduleKind::Affinity, 2, None, false).unwrap();
        assert_eq!(affinity.name(), "affinity");
        let guided = build_scheduler(ScheduleKind::Guided, 2, Some(3), false).unwrap();
        assert_eq!(guided.name(), "guided,3");
        assert!(matches!(
            build_scheduler(ScheduleKind::Auto, 0, None, false),
            Err(ScheduleError::NoWorkers)
        ));
    }
}
