use thiserror::Error;

/// Batch-level and configuration errors.
///
/// Per-unit failures never surface here; they are absorbed into error
/// records by the orchestrator. See [`WorkerError`].
#[derive(Debug, Error)]
pub enum FanoutError {
    #[error("invalid task count {0}: must be at least 1")]
    InvalidTaskCount(usize),

    #[error("task count {count} out of range: must be between {min} and {max}")]
    TaskCountOutOfRange { count: i64, min: usize, max: usize },

    #[error("execution pool is closed: cannot submit unit {0}")]
    PoolClosed(usize),

    #[error("no async runtime available to submit unit {0}")]
    NoRuntime(usize),

    #[error("invalid time format '{0}'")]
    InvalidTimeFormat(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FanoutError>;

/// Failure of a single worker unit.
///
/// The `Display` text is what ends up after `"Thread error: "` in the error
/// record that replaces the unit's result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("unit {0} was cancelled")]
    Cancelled(usize),

    #[error("unit {index} panicked: {message}")]
    Panicked { index: usize, message: String },

    #[error("unit {index} interrupted: {reason}")]
    Interrupted { index: usize, reason: String },
}

impl WorkerError {
    pub fn index(&self) -> usize {
        match self {
            Self::Cancelled(index) => *index,
            Self::Panicked { index, .. } | Self::Interrupted { index, .. } => *index,
        }
    }
}
