//! CLI argument definitions.

use super::validators::{parse_interval_secs, parse_timeout_secs};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GPU selection and training-log helpers for RL pipelines.
#[derive(Debug, Parser)]
#[command(name = "trainwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "TRAINWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and select GPUs.
    Gpu {
        /// GPU action to perform.
        #[command(subcommand)]
        action: GpuAction,
    },
    /// Block until a training log shows the run started and finished.
    Wait(WaitArgs),
    /// Print the first traceback found in a log.
    Traceback {
        /// Log file to scan (reads stdin when omitted).
        input: Option<PathBuf>,
    },
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// GPU subcommand actions.
#[derive(Debug, Subcommand)]
pub enum GpuAction {
    /// List GPUs reported by the status command.
    List {
        /// Print the raw status as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the index of the GPU with the least used memory.
    Freest,
    /// Report whether CUDA runtime libraries are installed.
    ///
    /// Releasing cached device memory needs the allocator of the process that
    /// owns it, so it is only available from the library
    /// (`trainwatch::gpu::clear_gpu_memory`), not as a command.
    Runtime,
    /// Run a command pinned to the GPU with the least used memory.
    Exec {
        /// Command and arguments to run.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the wait command.
#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Training log file written by the run.
    pub log: PathBuf,

    /// Seconds to wait for completion once training has started.
    #[arg(long, value_parser = parse_timeout_secs, env = "TRAINWATCH_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Seconds between completion checks.
    #[arg(long, value_parser = parse_interval_secs, env = "TRAINWATCH_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Iteration number shown in status messages.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub iteration: i64,

    /// Response index shown in status messages.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub response_id: i64,

    /// Do not log per-run status messages.
    #[arg(long)]
    pub no_status: bool,

    /// Do not show the spinner.
    #[arg(long)]
    pub no_progress: bool,
}
