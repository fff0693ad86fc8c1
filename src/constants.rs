//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "trainwatch";

/// GPU status query defaults.
pub mod gpu {
    /// Program invoked to report per-GPU status as JSON.
    pub const STATUS_PROGRAM: &str = "gpustat";

    /// Arguments passed to the status program.
    pub const STATUS_ARGS: &[&str] = &["--json"];

    /// Environment variable that restricts which devices a CUDA process sees.
    pub const DEVICE_ENV_VAR: &str = "CUDA_VISIBLE_DEVICES";
}

/// Training log markers.
pub mod markers {
    /// Substring printed once the run starts producing per-step throughput.
    pub const FPS_STEP: &str = "fps step:";

    /// Substring (and line prefix) of an unhandled Python error.
    pub const TRACEBACK: &str = "Traceback";

    /// Hint line Hydra prints after a traceback. Ends the extracted block.
    pub const HYDRA_FULL_ERROR: &str = "Set the environment variable HYDRA_FULL_ERROR=1";

    /// Substrings whose presence means the training run has finished.
    pub const COMPLETION_INDICATORS: &[&str] = &[
        "Training completed",
        "Final evaluation",
        "Best reward",
        "Tensorboard Directory:",
        "wandb: Run finished",
    ];
}

/// Training wait timing defaults.
pub mod wait {
    /// Hard ceiling for the completion phase, in seconds.
    pub const TIMEOUT_SECS: u64 = 3600;

    /// Interval between completion checks, in seconds.
    pub const POLL_INTERVAL_SECS: u64 = 5;

    /// Interval between start checks, in milliseconds.
    pub const START_POLL_INTERVAL_MS: u64 = 100;

    /// Upper bound accepted for the start poll interval, in milliseconds.
    pub const MAX_START_POLL_INTERVAL_MS: u64 = 60_000;
}

/// Process exit codes for the `wait` command.
pub mod exit_code {
    /// Run started and completed.
    pub const COMPLETED: i32 = 0;
    /// Run logged a traceback.
    pub const FAILED: i32 = 2;
    /// Run did not complete within the timeout.
    pub const TIMED_OUT: i32 = 3;
    /// Interrupted by Ctrl+C (128 + SIGINT).
    pub const INTERRUPTED: i32 = 130;
}
