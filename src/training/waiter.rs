//! Blocking wait on a training run's log file.
//!
//! The wait has two phases:
//!
//! 1. **Start**: poll until the log shows either the step marker (`fps step:`)
//!    or a traceback. A traceback ends the wait as [`WaitOutcome::Failed`].
//!    This phase has no timeout.
//! 2. **Completion**: poll every `poll_interval` until one of the completion
//!    indicators shows up ([`WaitOutcome::Completed`]) or `timeout` elapses
//!    ([`WaitOutcome::TimedOut`]).
//!
//! The log is re-read in full on every poll; there is no cursor.

use super::log::read_log;
use crate::config::WaitConfig;
use crate::error::Result;
use indicatif::ProgressBar;
use std::fmt;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How a training wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The run started and a completion indicator appeared.
    Completed,
    /// A traceback appeared before training started.
    Failed,
    /// The run started but did not complete before the timeout.
    TimedOut,
}

impl WaitOutcome {
    /// Lowercase name used in CLI output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the run in status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLabel {
    /// Whether to emit per-run status messages.
    pub log_status: bool,
    /// Optimisation iteration the run belongs to.
    pub iteration: i64,
    /// Index of the candidate response within the iteration.
    pub response_id: i64,
}

impl Default for RunLabel {
    fn default() -> Self {
        Self {
            log_status: false,
            iteration: -1,
            response_id: -1,
        }
    }
}

/// Timing and markers for a wait.
#[derive(Debug, Clone)]
pub struct WaitSettings {
    /// Ceiling for the completion phase.
    pub timeout: Duration,
    /// Interval between completion checks.
    pub poll_interval: Duration,
    /// Interval between start checks.
    pub start_poll_interval: Duration,
    /// Substring that marks the run as started.
    pub start_marker: String,
    /// Substring that marks the run as failed.
    pub error_marker: String,
    /// Substrings that mark the run as finished.
    pub completion_indicators: Vec<String>,
}

impl From<&WaitConfig> for WaitSettings {
    fn from(config: &WaitConfig) -> Self {
        Self {
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            start_poll_interval: config.start_poll_interval(),
            start_marker: config.start_marker.clone(),
            error_marker: config.error_marker.clone(),
            completion_indicators: config.completion_indicators.clone(),
        }
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

/// What the start phase saw in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartSignal {
    Started,
    Errored,
}

/// Blocks until a training log reports start and completion.
#[derive(Clone, Default)]
pub struct TrainingWaiter {
    settings: WaitSettings,
    progress: Option<ProgressBar>,
}

impl TrainingWaiter {
    /// Create a waiter with the given settings.
    pub fn new(settings: WaitSettings) -> Self {
        Self {
            settings,
            progress: None,
        }
    }

    /// Show wait state on a spinner.
    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Settings in use.
    pub const fn settings(&self) -> &WaitSettings {
        &self.settings
    }

    /// Wait for the run logging to `path` to start, then to finish.
    ///
    /// Read failures propagate; a missing log is not waited for.
    pub fn wait(&self, path: &Path, label: &RunLabel) -> Result<WaitOutcome> {
        debug!("Waiting for training log {}", path.display());

        if self.wait_for_start(path, label)? == StartSignal::Errored {
            return Ok(WaitOutcome::Failed);
        }

        self.wait_for_completion(path, label)
    }

    fn wait_for_start(&self, path: &Path, label: &RunLabel) -> Result<StartSignal> {
        self.set_message("waiting for training to start");

        loop {
            let log = read_log(path)?;
            if let Some(signal) = self.start_signal(&log) {
                if label.log_status {
                    match signal {
                        StartSignal::Started => info!(
                            "Iteration {}: Code Run {} successfully training!",
                            label.iteration, label.response_id
                        ),
                        StartSignal::Errored => error!(
                            "Iteration {}: Code Run {} execution error!",
                            label.iteration, label.response_id
                        ),
                    }
                }
                return Ok(signal);
            }
            self.tick();
            thread::sleep(self.settings.start_poll_interval);
        }
    }

    fn wait_for_completion(&self, path: &Path, label: &RunLabel) -> Result<WaitOutcome> {
        let start = Instant::now();
        let timeout = self.settings.timeout;

        while start.elapsed() < timeout {
            let log = read_log(path)?;
            if self.is_complete(&log) {
                if label.log_status {
                    info!(
                        "Iteration {}: Code Run {} completed successfully!",
                        label.iteration, label.response_id
                    );
                }
                return Ok(WaitOutcome::Completed);
            }

            self.set_message(&format!(
                "training ({}s elapsed)",
                start.elapsed().as_secs()
            ));
            let remaining = timeout.saturating_sub(start.elapsed());
            thread::sleep(self.settings.poll_interval.min(remaining));
        }

        if label.log_status {
            warn!(
                "Iteration {}: Code Run {} timed out after {} seconds!",
                label.iteration,
                label.response_id,
                timeout.as_secs()
            );
        }
        Ok(WaitOutcome::TimedOut)
    }

    /// The error marker wins when both markers are present.
    fn start_signal(&self, log: &str) -> Option<StartSignal> {
        if log.contains(&self.settings.error_marker) {
            Some(StartSignal::Errored)
        } else if log.contains(&self.settings.start_marker) {
            Some(StartSignal::Started)
        } else {
            None
        }
    }

    fn is_complete(&self, log: &str) -> bool {
        self.settings
            .completion_indicators
            .iter()
            .filter(|indicator| !indicator.is_empty())
            .any(|indicator| log.contains(indicator.as_str()))
    }

    fn set_message(&self, message: &str) {
        if let Some(pb) = &self.progress {
            pb.set_message(message.to_string());
        }
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.tick();
        }
    }
}

/// Wait with default settings.
pub fn block_until_training(path: &Path, label: &RunLabel) -> Result<WaitOutcome> {
    TrainingWaiter::default().wait(path, label)
}
