//! Error types for trainwatch.

/// Result type alias for trainwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for trainwatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// GPU status program could not be started.
    #[error("failed to run GPU status command '{program}'")]
    GpuQuerySpawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// GPU status program exited unsuccessfully.
    #[error("GPU status command '{program}' failed ({status}): {stderr}")]
    GpuQueryFailed {
        /// Program that was invoked.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// GPU status output was not the expected JSON.
    #[error("failed to parse GPU status output")]
    GpuStatusParse {
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// GPU status listed no devices.
    #[error("GPU status command reported no GPUs")]
    NoGpusReported,

    /// GPU memory cache could not be released.
    #[error("failed to release cached GPU memory: {reason}")]
    CacheRelease {
        /// Description of the failure.
        reason: String,
    },

    /// Failed to read the training log.
    #[error("failed to read training log '{path}'")]
    LogRead {
        /// Path to the log file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to launch a pinned child command.
    #[error("failed to launch '{program}'")]
    CommandSpawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON output")]
    JsonSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}
