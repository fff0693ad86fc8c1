//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config_file, load_default_config, write_config_template};
pub use paths::{config_dir, config_file_path};
pub use types::{Config, GpuConfig, TracebackConfig, WaitConfig};
pub use validate::{validate_config, validate_gpu, validate_traceback, validate_wait};
