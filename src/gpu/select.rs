//! Freest-GPU selection and device pinning.

use super::status::{GpuRecord, StatusCommand, query_status};
use crate::error::{Error, Result};
use std::process::Command;
use tracing::info;

/// Pick the record with the least used memory.
///
/// Ties go to the record listed first. Returns `None` for an empty slice.
pub fn freest_gpu(gpus: &[GpuRecord]) -> Option<&GpuRecord> {
    // `min_by_key` keeps the first of equal minima.
    gpus.iter().min_by_key(|gpu| gpu.memory_used)
}

/// Query GPU status and return the index of the GPU with least used memory.
pub fn get_freest_gpu(cmd: &StatusCommand) -> Result<u32> {
    let status = query_status(cmd)?;
    freest_gpu(&status.gpus)
        .map(|gpu| gpu.index)
        .ok_or(Error::NoGpusReported)
}

/// A device chosen for a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAssignment {
    /// Variable the child reads its visible devices from.
    pub env_var: String,
    /// Selected device index.
    pub index: u32,
}

impl DeviceAssignment {
    /// Create an assignment for `index` exposed through `env_var`.
    pub fn new(env_var: impl Into<String>, index: u32) -> Self {
        Self {
            env_var: env_var.into(),
            index,
        }
    }

    /// Value written to the variable.
    pub fn value(&self) -> String {
        self.index.to_string()
    }

    /// Set the variable on a single child command, leaving this process untouched.
    pub fn apply<'a>(&self, command: &'a mut Command) -> &'a mut Command {
        command.env(&self.env_var, self.value())
    }
}

/// Select the freest GPU for use by child commands.
///
/// Nothing is written to the process environment; use
/// [`DeviceAssignment::apply`] on each child that should be pinned.
pub fn pin_freest_gpu(cmd: &StatusCommand, env_var: &str) -> Result<DeviceAssignment> {
    let index = get_freest_gpu(cmd)?;
    info!("Using GPU {index}");
    Ok(DeviceAssignment::new(env_var, index))
}

/// Select the freest GPU and export it through the process environment.
///
/// Every child spawned afterwards inherits the variable. Mutating the
/// environment is only sound while no other thread reads or writes it, so
/// call this before starting worker threads. Prefer [`pin_freest_gpu`].
#[allow(unsafe_code)]
pub fn set_freest_gpu(cmd: &StatusCommand, env_var: &str) -> Result<u32> {
    let index = get_freest_gpu(cmd)?;
    // SAFETY: documented single-threaded precondition of this function.
    unsafe {
        std::env::set_var(env_var, index.to_string());
    }
    info!("Using GPU {index}");
    Ok(index)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unsafe_code)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn record(index: u32, memory_used: u64) -> GpuRecord {
        GpuRecord {
            index,
            memory_used,
            memory_total: None,
            name: None,
            uuid: None,
            utilization: None,
            temperature: None,
        }
    }

    #[test]
    fn test_freest_gpu_first_minimum_wins() {
        let gpus = [record(0, 500), record(1, 100), record(2, 100)];
        assert_eq!(freest_gpu(&gpus).map(|g| g.index), Some(1));
    }

    #[test]
    fn test_freest_gpu_uses_reported_index_not_position() {
        let gpus = [record(4, 900), record(7, 10)];
        assert_eq!(freest_gpu(&gpus).map(|g| g.index), Some(7));
    }

    #[test]
    fn test_freest_gpu_empty() {
        assert!(freest_gpu(&[]).is_none());
    }

    #[test]
    fn test_assignment_applies_to_child_only() {
        let assignment = DeviceAssignment::new("TRAINWATCH_TEST_DEVICES", 3);
        let mut command = Command::new("true");
        assignment.apply(&mut command);

        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].0, "TRAINWATCH_TEST_DEVICES");
        assert_eq!(envs[0].1.and_then(|v| v.to_str()), Some("3"));
        assert!(std::env::var("TRAINWATCH_TEST_DEVICES").is_err());
    }

    #[cfg(unix)]
    fn fake_status(json: &str) -> StatusCommand {
        StatusCommand::new("sh", ["-c".to_string(), format!("echo '{json}'")])
    }

    #[cfg(unix)]
    #[test]
    fn test_get_freest_gpu_from_command() {
        let cmd = fake_status(
            r#"{"gpus": [{"index": 0, "memory.used": 500}, {"index": 1, "memory.used": 100}, {"index": 2, "memory.used": 100}]}"#,
        );
        assert_eq!(get_freest_gpu(&cmd).unwrap(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_get_freest_gpu_no_gpus() {
        let cmd = fake_status(r#"{"gpus": []}"#);
        assert!(matches!(get_freest_gpu(&cmd), Err(Error::NoGpusReported)));
    }

    #[cfg(unix)]
    #[test]
    fn test_get_freest_gpu_invalid_json() {
        let cmd = fake_status("gpustat: command output garbled");
        assert!(matches!(
            get_freest_gpu(&cmd),
            Err(Error::GpuStatusParse { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_get_freest_gpu_failing_command() {
        let cmd = StatusCommand::new("sh", ["-c", "exit 1"]);
        assert!(matches!(
            get_freest_gpu(&cmd),
            Err(Error::GpuQueryFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_pin_freest_gpu_does_not_touch_environment() {
        let cmd = fake_status(r#"{"gpus": [{"index": 5, "memory.used": 1}]}"#);
        let assignment = pin_freest_gpu(&cmd, "TRAINWATCH_PIN_TEST").unwrap();
        assert_eq!(assignment, DeviceAssignment::new("TRAINWATCH_PIN_TEST", 5));
        assert!(std::env::var("TRAINWATCH_PIN_TEST").is_err());
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_set_freest_gpu_exports_index() {
        let cmd = fake_status(
            r#"{"gpus": [{"index": 0, "memory.used": 20}, {"index": 1, "memory.used": 10}]}"#,
        );
        let index = set_freest_gpu(&cmd, "TRAINWATCH_SET_TEST").unwrap();
        assert_eq!(index, 1);
        assert_eq!(std::env::var("TRAINWATCH_SET_TEST").unwrap(), "1");

        unsafe {
            std::env::remove_var("TRAINWATCH_SET_TEST");
        }
    }
}
