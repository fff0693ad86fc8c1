//! Configuration type definitions.

use crate::constants::{gpu, markers, wait};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GPU status query settings.
    #[serde(default)]
    pub gpu: GpuConfig,

    /// Training log wait settings.
    #[serde(default)]
    pub wait: WaitConfig,

    /// Traceback extraction settings.
    #[serde(default)]
    pub traceback: TracebackConfig,
}

/// GPU status query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// Program that prints GPU status JSON.
    pub status_program: String,

    /// Arguments passed to the status program.
    pub status_args: Vec<String>,

    /// Environment variable used to pin a child process to a device.
    pub device_env_var: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            status_program: gpu::STATUS_PROGRAM.to_string(),
            status_args: gpu::STATUS_ARGS.iter().map(ToString::to_string).collect(),
            device_env_var: gpu::DEVICE_ENV_VAR.to_string(),
        }
    }
}

/// Training log wait settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Ceiling for the completion phase, in seconds.
    pub timeout_secs: u64,

    /// Interval between completion checks, in seconds.
    pub poll_interval_secs: u64,

    /// Interval between start checks, in milliseconds.
    pub start_poll_interval_ms: u64,

    /// Substring that marks the run as started.
    pub start_marker: String,

    /// Substring that marks the run as failed.
    pub error_marker: String,

    /// Substrings that mark the run as finished.
    pub completion_indicators: Vec<String>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: wait::TIMEOUT_SECS,
            poll_interval_secs: wait::POLL_INTERVAL_SECS,
            start_poll_interval_ms: wait::START_POLL_INTERVAL_MS,
            start_marker: markers::FPS_STEP.to_string(),
            error_marker: markers::TRACEBACK.to_string(),
            completion_indicators: markers::COMPLETION_INDICATORS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl WaitConfig {
    /// Completion-phase ceiling.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Completion-phase poll interval.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Start-phase poll interval.
    pub const fn start_poll_interval(&self) -> Duration {
        Duration::from_millis(self.start_poll_interval_ms)
    }
}

/// Traceback extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TracebackConfig {
    /// Line prefix that opens a traceback block.
    pub marker: String,

    /// Substring of the line that closes the block (excluded from output).
    pub sentinel: String,
}

impl Default for TracebackConfig {
    fn default() -> Self {
        Self {
            marker: markers::TRACEBACK.to_string(),
            sentinel: markers::HYDRA_FULL_ERROR.to_string(),
        }
    }
}
