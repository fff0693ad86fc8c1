//! Configuration validation.

use crate::config::{Config, GpuConfig, TracebackConfig, WaitConfig};
use crate::constants::wait::MAX_START_POLL_INTERVAL_MS;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_gpu(&config.gpu)?;
    validate_wait(&config.wait)?;
    validate_traceback(&config.traceback)?;
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Validate GPU query settings.
pub fn validate_gpu(gpu: &GpuConfig) -> Result<()> {
    if gpu.status_program.trim().is_empty() {
        return Err(invalid("gpu.status_program must not be empty"));
    }

    if gpu.device_env_var.is_empty() || gpu.device_env_var.contains(['=', '\0']) {
        return Err(invalid(format!(
            "gpu.device_env_var is not a valid variable name: '{}'",
            gpu.device_env_var
        )));
    }

    Ok(())
}

/// Validate wait settings.
pub fn validate_wait(wait: &WaitConfig) -> Result<()> {
    if wait.poll_interval_secs == 0 {
        return Err(invalid("wait.poll_interval_secs must be at least 1"));
    }

    // The waiter clamps its last sleep to the remaining time, so a timeout
    // shorter than the poll interval is fine.
    if wait.timeout_secs == 0 {
        return Err(invalid("wait.timeout_secs must be at least 1"));
    }

    if wait.start_poll_interval_ms == 0 || wait.start_poll_interval_ms > MAX_START_POLL_INTERVAL_MS
    {
        return Err(invalid(format!(
            "wait.start_poll_interval_ms must be between 1 and {MAX_START_POLL_INTERVAL_MS}, got {}",
            wait.start_poll_interval_ms
        )));
    }

    if wait.start_marker.is_empty() || wait.error_marker.is_empty() {
        return Err(invalid("wait.start_marker and wait.error_marker must not be empty"));
    }

    if wait.completion_indicators.iter().all(String::is_empty) {
        return Err(invalid(
            "wait.completion_indicators must contain at least one non-empty entry",
        ));
    }

    Ok(())
}

/// Validate traceback extraction settings.
pub fn validate_traceback(traceback: &TracebackConfig) -> Result<()> {
    if traceback.marker.is_empty() || traceback.sentinel.is_empty() {
        return Err(invalid("traceback.marker and traceback.sentinel must not be empty"));
    }
    Ok(())
}
