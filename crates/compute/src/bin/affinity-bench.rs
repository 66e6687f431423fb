//! affinity-bench: run the reference kernels under a chosen loop schedule.
//!
//! Configuration is layered: defaults, then `--config` TOML, then `AFFINITY_*`
//! environment variables (including `.env`), then command-line flags.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use affinity_compute::report;
use affinity_compute::Benchmark;
use affinity_core::{load_dotenv, BenchConfig, KernelKind, OutputFormat, ScheduleKind};

/// Benchmark affinity self-scheduling against the static/dynamic/guided/auto baselines.
#[derive(Parser, Debug)]
#[command(name = "affinity-bench", version, about)]
struct Cli {
    /// Worker threads (0 = available parallelism).
    #[arg(env = "AFFINITY_THREADS")]
    threads: Option<usize>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// affinity, static, dynamic, guided or auto.
    #[arg(long, env = "AFFINITY_SCHEDULE")]
    schedule: Option<ScheduleKind>,

    /// Chunk size for static, dynamic and guided.
    #[arg(long, env = "AFFINITY_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Passes per kernel.
    #[arg(long, env = "AFFINITY_REPS")]
    reps: Option<usize>,

    /// Iteration space size.
    #[arg(long, env = "AFFINITY_SIZE")]
    size: Option<usize>,

    /// Kernels to run, comma separated (cosine, logsum).
    #[arg(long, value_delimiter = ',')]
    kernels: Option<Vec<KernelKind>>,

    /// text, json or csv.
    #[arg(long, env = "AFFINITY_FORMAT")]
    format: Option<OutputFormat>,

    /// Re-run each kernel under static blocks and fail on checksum mismatch.
    #[arg(long)]
    verify: bool,

    /// Print the CSV header row.
    #[arg(long)]
    csv_header: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(BenchConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => BenchConfig::default(),
        };
        config.apply_env()?;

        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(schedule) = self.schedule {
            config.schedule = schedule;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = Some(chunk_size);
        }
        if let Some(reps) = self.reps {
            config.reps = reps;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(kernels) = self.kernels {
            config.kernels = kernels;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config.verify |= self.verify;

        Ok((config, self.csv_header))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let (config, csv_header) = cli.into_config()?;
    config.log_summary();

    let format = config.format;
    let bench = Benchmark::new(config)?;
    let reports = bench.run()?;
    info!("Completed {} kernel runs", reports.len());

    print!("{}", report::render(&reports, format, csv_header)?);
    Ok(())
}
