use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Worker count {threads} exceeds iteration space size {size}")]
    ThreadsExceedIterations { threads: usize, size: usize },

    #[error("Repetition count must be at least 1")]
    InvalidReps,

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Unknown schedule: {0}")]
    UnknownSchedule(String),

    #[error("Unknown kernel: {0}")]
    UnknownKernel(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
