use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Loop scheduling strategy used to distribute a pass across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// Affinity self-scheduling with per-worker local queues.
    Affinity,
    /// Contiguous blocks, or fixed chunks dealt round-robin.
    Static,
    /// Fixed-size chunks handed out first come, first served.
    Dynamic,
    /// Chunks proportional to the remaining work, never below the chunk size.
    Guided,
    /// Whatever the thread pool decides.
    Auto,
}

impl ScheduleKind {
    /// Whether the strategy honours an explicit chunk size.
    pub fn accepts_chunk_size(&self) -> bool {
        matches!(self, ScheduleKind::Static | ScheduleKind::Dynamic | ScheduleKind::Guided)
    }
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleKind::Affinity => write!(f, "affinity"),
            ScheduleKind::Static => write!(f, "static"),
            ScheduleKind::Dynamic => write!(f, "dynamic"),
            ScheduleKind::Guided => write!(f, "guided"),
            ScheduleKind::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for ScheduleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "affinity" => Ok(ScheduleKind::Affinity),
            "static" => Ok(ScheduleKind::Static),
            "dynamic" => Ok(ScheduleKind::Dynamic),
            "guided" => Ok(ScheduleKind::Guided),
            "auto" => Ok(ScheduleKind::Auto),
            other => Err(ConfigError::UnknownSchedule(other.to_string())),
        }
    }
}

/// Reference workloads driven by the schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Triangular cosine accumulation (loop 1).
    Cosine,
    /// Irregular triangular log-weighted sum (loop 2).
    Logsum,
}

impl KernelKind {
    /// 1-based loop number used in reports and CSV output.
    pub fn loop_number(&self) -> u8 {
        match self {
            KernelKind::Cosine => 1,
            KernelKind::Logsum => 2,
        }
    }
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelKind::Cosine => write!(f, "cosine"),
            KernelKind::Logsum => write!(f, "logsum"),
        }
    }
}

impl FromStr for KernelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" | "1" | "loop1" => Ok(KernelKind::Cosine),
            "logsum" | "2" | "loop2" => Ok(KernelKind::Logsum),
            other => Err(ConfigError::UnknownKernel(other.to_string())),
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// `schedule,chunksize,num_threads,loop,time` rows.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}
