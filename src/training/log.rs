//! Training log access.

use crate::error::{Error, Result};
use std::path::Path;

/// Read the whole training log.
///
/// The trainer may be mid-write, so a truncated UTF-8 sequence at the end is
/// replaced rather than treated as an error; the next read sees the rest.
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::LogRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
