use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kind::{KernelKind, OutputFormat, ScheduleKind};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_value<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value })
}

/// Benchmark configuration, typically parsed from TOML and then
/// overridden by `AFFINITY_*` environment variables and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Size of the iteration space (N).
    #[serde(default = "default_size")]
    pub size: usize,
    /// Number of worker threads (P). 0 = available parallelism.
    #[serde(default)]
    pub threads: usize,
    /// Passes per kernel.
    #[serde(default = "default_reps")]
    pub reps: usize,
    #[serde(default = "default_schedule")]
    pub schedule: ScheduleKind,
    /// Chunk size for static/dynamic/guided. Ignored by the other strategies.
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default = "default_kernels")]
    pub kernels: Vec<KernelKind>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Re-run each kernel under the static block schedule and compare checksums.
    #[serde(default)]
    pub verify: bool,
}

fn default_size() -> usize { 729 }
fn default_reps() -> usize { 100 }
fn default_schedule() -> ScheduleKind { ScheduleKind::Affinity }
fn default_kernels() -> Vec<KernelKind> { vec![KernelKind::Cosine, KernelKind::Logsum] }

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            threads: 0,
            reps: default_reps(),
            schedule: default_schedule(),
            chunk_size: None,
            kernels: default_kernels(),
            format: OutputFormat::default(),
            verify: false,
        }
    }
}

impl BenchConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply `AFFINITY_*` overrides from the process environment
    /// (call `load_dotenv()` first).
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(env_opt)
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("AFFINITY_SIZE") {
            self.size = parse_value("AFFINITY_SIZE", v)?;
        }
        if let Some(v) = lookup("AFFINITY_THREADS") {
            self.threads = parse_value("AFFINITY_THREADS", v)?;
        }
        if let Some(v) = lookup("AFFINITY_REPS") {
            self.reps = parse_value("AFFINITY_REPS", v)?;
        }
        if let Some(v) = lookup("AFFINITY_SCHEDULE") {
            self.schedule = v.parse()?;
        }
        if let Some(v) = lookup("AFFINITY_CHUNK_SIZE") {
            self.chunk_size = Some(parse_value("AFFINITY_CHUNK_SIZE", v)?);
        }
        if let Some(v) = lookup("AFFINITY_FORMAT") {
            self.format = v.parse()?;
        }
        Ok(())
    }

    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.threads
        }
    }

    /// Reject configurations that cannot run a pass. Called before any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threads = self.resolved_threads();
        if self.size > 0 && threads > self.size {
            return Err(ConfigError::ThreadsExceedIterations { threads, size: self.size });
        }
        if self.reps == 0 {
            return Err(ConfigError::InvalidReps);
        }
        if self.chunk_size == Some(0) {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        tracing::info!("Benchmark config:");
        tracing::info!(
            "  size={}, threads={}, reps={}",
            self.size,
            self.resolved_threads(),
            self.reps
        );
        tracing::info!(
            "  schedule={}, chunk_size={}",
            self.schedule,
            self.chunk_size.map_or_else(|| "(default)".to_string(), |c| c.to_string())
        );
        tracing::info!("  kernels={:?}, verify={}", self.kernels, self.verify);
    }
}
