//! Configuration file loading.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load configuration from the default platform-specific path.
///
/// Returns default config if no config file exists.
pub fn load_default_config() -> Result<Config> {
    super::config_file_path().map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))
}

/// Header written above the generated settings.
const TEMPLATE_HEADER: &str = "# trainwatch configuration\n\
# Every key is optional; missing keys fall back to the built-in defaults.\n\n";

/// Write `config` to `path` as a starter configuration file.
///
/// Parent directories are created as needed. Returns `Ok(false)` and leaves
/// the file untouched if one already exists at `path`.
pub fn write_config_template(config: &Config, path: &Path) -> Result<bool> {
    let write_err = |e: std::io::Error| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let body = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(write_err(e)),
    };

    file.write_all(TEMPLATE_HEADER.as_bytes())
        .and_then(|()| file.write_all(body.as_bytes()))
        .map_err(write_err)?;
    Ok(true)
}
