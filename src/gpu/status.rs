//! GPU status query via an external JSON-emitting tool.
//!
//! The default tool is `gpustat --json`, which prints an object of the form:
//!
//! ```json
//! {"hostname": "node1", "gpus": [{"index": 0, "memory.used": 512, ...}]}
//! ```
//!
//! Only `index` and `memory.used` are required per record.

use crate::config::GpuConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::debug;

/// Status of a single GPU as reported by the status tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuRecord {
    /// Device index.
    pub index: u32,

    /// Used memory in MiB.
    #[serde(rename = "memory.used")]
    pub memory_used: u64,

    /// Total memory in MiB.
    #[serde(rename = "memory.total", default, skip_serializing_if = "Option::is_none")]
    pub memory_total: Option<u64>,

    /// Product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Device UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Utilization in percent.
    #[serde(rename = "utilization.gpu", default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<u32>,

    /// Temperature in degrees Celsius.
    #[serde(rename = "temperature.gpu", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<u32>,
}

impl GpuRecord {
    /// Free memory in MiB, when the total is known.
    pub fn memory_free(&self) -> Option<u64> {
        self.memory_total
            .map(|total| total.saturating_sub(self.memory_used))
    }
}

/// Full status report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuStatus {
    /// Host the report came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// NVIDIA driver version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,

    /// Per-device records, in the order the tool listed them.
    pub gpus: Vec<GpuRecord>,
}

/// External command that prints [`GpuStatus`] JSON on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCommand {
    /// Program to run.
    pub program: String,
    /// Arguments to pass.
    pub args: Vec<String>,
}

impl StatusCommand {
    /// Create a status command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the status command described by configuration.
    pub fn from_config(config: &GpuConfig) -> Self {
        Self::new(config.status_program.clone(), config.status_args.clone())
    }
}

impl Default for StatusCommand {
    fn default() -> Self {
        Self::from_config(&GpuConfig::default())
    }
}

/// Run the status command and parse its output.
///
/// Blocks until the command exits; there is no timeout.
pub fn query_status(cmd: &StatusCommand) -> Result<GpuStatus> {
    debug!("Querying GPU status: {} {:?}", cmd.program, cmd.args);

    let output = Command::new(&cmd.program)
        .args(&cmd.args)
        .output()
        .map_err(|e| Error::GpuQuerySpawn {
            program: cmd.program.clone(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(Error::GpuQueryFailed {
            program: cmd.program.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_status(&output.stdout)
}

/// Parse status JSON as printed by `gpustat --json`.
pub fn parse_status(raw: &[u8]) -> Result<GpuStatus> {
    serde_json::from_slice(raw).map_err(|e| Error::GpuStatusParse { source: e })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const GPUSTAT_SAMPLE: &str = r#"{
        "hostname": "trainer-01",
        "driver_version": "535.104.05",
        "query_time": "2024-05-01T10:00:00.000000",
        "gpus": [
            {
                "index": 0,
                "uuid": "GPU-aaaa",
                "name": "NVIDIA A100-SXM4-80GB",
                "temperature.gpu": 41,
                "utilization.gpu": 97,
                "memory.used": 61234,
                "memory.total": 81920,
                "processes": []
            },
            {
                "index": 1,
                "uuid": "GPU-bbbb",
                "name": "NVIDIA A100-SXM4-80GB",
                "temperature.gpu": 30,
                "utilization.gpu": 0,
                "memory.used": 4,
                "memory.total": 81920,
                "processes": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_gpustat_output() {
        let status = parse_status(GPUSTAT_SAMPLE.as_bytes()).unwrap();
        assert_eq!(status.hostname.as_deref(), Some("trainer-01"));
        assert_eq!(status.gpus.len(), 2);
        assert_eq!(status.gpus[0].memory_used, 61234);
        assert_eq!(status.gpus[1].index, 1);
        assert_eq!(status.gpus[1].memory_free(), Some(81916));
        assert_eq!(status.gpus[1].utilization, Some(0));
    }

    #[test]
    fn test_parse_minimal_records() {
        let status =
            parse_status(br#"{"gpus": [{"index": 3, "memory.used": 100}]}"#).unwrap();
        assert_eq!(status.gpus[0].index, 3);
        assert_eq!(status.gpus[0].memory_total, None);
        assert_eq!(status.gpus[0].memory_free(), None);
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let result = parse_status(b"not json");
        assert!(matches!(result, Err(Error::GpuStatusParse { .. })));
    }

    #[test]
    fn test_parse_missing_memory_field_fails() {
        let result = parse_status(br#"{"gpus": [{"index": 0}]}"#);
        assert!(matches!(result, Err(Error::GpuStatusParse { .. })));
    }

    #[test]
    fn test_default_command_is_gpustat_json() {
        let cmd = StatusCommand::default();
        assert_eq!(cmd.program, "gpustat");
        assert_eq!(cmd.args, vec!["--json".to_string()]);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let cmd = StatusCommand::new("trainwatch-no-such-program", Vec::<String>::new());
        let result = query_status(&cmd);
        assert!(matches!(result, Err(Error::GpuQuerySpawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_query_error() {
        let cmd = StatusCommand::new("sh", ["-c", "echo boom >&2; exit 3"]);
        match query_status(&cmd) {
            Err(Error::GpuQueryFailed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_query_reads_stdout() {
        let cmd = StatusCommand::new(
            "sh",
            ["-c", r#"echo '{"gpus": [{"index": 0, "memory.used": 7}]}'"#],
        );
        let status = query_status(&cmd).unwrap();
        assert_eq!(status.gpus[0].memory_used, 7);
    }
}
