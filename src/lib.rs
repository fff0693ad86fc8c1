//! Trainwatch - operational helpers for RL training pipelines.
//!
//! Picks the least-loaded GPU, releases cached device memory, extracts
//! Python tracebacks from log text, and waits for training runs to start
//! and finish by polling their log files.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod output;
pub mod training;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, GpuAction, WaitArgs};
use config::{Config, config_file_path, load_config_file, load_default_config, write_config_template};
use constants::exit_code;
use gpu::{StatusCommand, pin_freest_gpu};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use training::{RunLabel, TrainingWaiter, WaitOutcome, WaitSettings};

pub use error::{Error, Result};

/// Main entry point for the trainwatch CLI.
///
/// Returns the process exit code on success.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = ctrlc::set_handler(|| {
        output::progress::abandon_active_spinner();
        std::process::exit(exit_code::INTERRUPTED);
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_default_config()?,
    };

    handle_command(cli.command, config, cli.quiet)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter_str = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    // stdout carries command results; diagnostics go to stderr, around any spinner.
    fmt()
        .with_env_filter(filter)
        .with_writer(output::progress::SpinnerAwareStderr::default)
        .init();
}

fn handle_command(command: Command, mut config: Config, quiet: bool) -> Result<i32> {
    match command {
        Command::Gpu { action } => {
            config::validate_gpu(&config.gpu)?;
            handle_gpu_command(action, &config)
        }
        Command::Wait(args) => {
            apply_wait_overrides(&args, &mut config);
            config::validate_wait(&config.wait)?;
            handle_wait(&args, &config, quiet)
        }
        Command::Traceback { input } => {
            config::validate_traceback(&config.traceback)?;
            handle_traceback(input.as_deref(), &config)?;
            Ok(0)
        }
        Command::Config { action } => {
            handle_config_command(action, &config)?;
            Ok(0)
        }
    }
}

fn handle_gpu_command(action: GpuAction, config: &Config) -> Result<i32> {
    let status_cmd = StatusCommand::from_config(&config.gpu);

    match action {
        GpuAction::List { json } => {
            let status = gpu::query_status(&status_cmd)?;
            if json {
                let out = serde_json::to_string_pretty(&status)
                    .map_err(|e| Error::JsonSerialize { source: e })?;
                println!("{out}");
            } else if status.gpus.is_empty() {
                println!("No GPUs reported.");
            } else {
                let freest = gpu::freest_gpu(&status.gpus).map(|g| g.index);
                for record in &status.gpus {
                    let total = record
                        .memory_total
                        .map_or_else(|| "?".to_string(), |t| t.to_string());
                    let util = record
                        .utilization
                        .map_or_else(String::new, |u| format!(", {u}% util"));
                    println!(
                        "  [{}] {} - {} / {} MiB{}{}",
                        record.index,
                        record.name.as_deref().unwrap_or("unknown"),
                        record.memory_used,
                        total,
                        util,
                        if freest == Some(record.index) {
                            " [freest]"
                        } else {
                            ""
                        }
                    );
                }
            }
            Ok(0)
        }
        GpuAction::Freest => {
            let index = gpu::get_freest_gpu(&status_cmd)?;
            println!("{index}");
            Ok(0)
        }
        GpuAction::Runtime => {
            let available = gpu::is_cuda_available();
            println!(
                "CUDA runtime: {}",
                if available { "available" } else { "not found" }
            );
            println!("Patterns: {}", gpu::cuda_library_patterns().join(", "));
            for path in gpu::library_search_paths() {
                debug!("Searched: {}", path.display());
            }
            Ok(0)
        }
        GpuAction::Exec { command } => {
            let assignment = pin_freest_gpu(&status_cmd, &config.gpu.device_env_var)?;
            run_pinned(&command, &assignment)
        }
    }
}

/// Run `command` with only the assigned device visible and return its exit code.
fn run_pinned(command: &[String], assignment: &gpu::DeviceAssignment) -> Result<i32> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::ConfigValidation {
            message: "no command given".to_string(),
        });
    };

    info!(
        "Running {} with {}={}",
        program,
        assignment.env_var,
        assignment.value()
    );

    let mut child = std::process::Command::new(program);
    child.args(args);
    assignment.apply(&mut child);

    let status = child.status().map_err(|e| Error::CommandSpawn {
        program: program.clone(),
        source: e,
    })?;

    // Killed by a signal leaves no code.
    Ok(status.code().unwrap_or(1))
}

fn apply_wait_overrides(args: &WaitArgs, config: &mut Config) {
    if let Some(timeout) = args.timeout {
        config.wait.timeout_secs = timeout;
    }
    if let Some(interval) = args.poll_interval {
        config.wait.poll_interval_secs = interval;
    }
}

fn handle_wait(args: &WaitArgs, config: &Config, quiet: bool) -> Result<i32> {
    use crate::output::progress;

    let label = RunLabel {
        log_status: !args.no_status,
        iteration: args.iteration,
        response_id: args.response_id,
    };

    let spinner = progress::create_wait_spinner(&args.log, !quiet && !args.no_progress);
    let waiter = TrainingWaiter::new(WaitSettings::from(&config.wait)).with_progress(spinner.clone());

    let outcome = match waiter.wait(&args.log, &label) {
        Ok(outcome) => outcome,
        Err(e) => {
            progress::finish_progress(spinner, "error");
            return Err(e);
        }
    };
    progress::finish_progress(spinner, outcome.as_str());

    println!("{outcome}");

    Ok(match outcome {
        WaitOutcome::Completed => exit_code::COMPLETED,
        WaitOutcome::Failed => exit_code::FAILED,
        WaitOutcome::TimedOut => exit_code::TIMED_OUT,
    })
}

fn handle_traceback(input: Option<&Path>, config: &Config) -> Result<()> {
    let text = match input {
        Some(path) => training::read_log(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            String::from_utf8_lossy(&buf).into_owned()
        }
    };

    let traceback =
        training::filter_traceback_with(&text, &config.traceback.marker, &config.traceback.sentinel);

    if traceback.is_empty() {
        debug!("No traceback found");
    } else {
        println!("{traceback}");
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if write_config_template(&Config::default(), &path)? {
                println!("Created configuration file: {}", path.display());
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            if let Err(e) = config::validate_config(config) {
                warn!("{e}");
            }
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
