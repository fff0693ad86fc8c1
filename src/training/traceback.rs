//! Traceback extraction from training output.

use crate::constants::markers::{HYDRA_FULL_ERROR, TRACEBACK};

/// Extract the first Python traceback from `text`.
///
/// The block starts at the first line beginning with `Traceback` and runs
/// up to, but not including, Hydra's `HYDRA_FULL_ERROR` hint line (or the
/// end of the text). Returns an empty string when there is no traceback.
pub fn filter_traceback(text: &str) -> String {
    filter_traceback_with(text, TRACEBACK, HYDRA_FULL_ERROR)
}

/// Like [`filter_traceback`] with a custom start prefix and end sentinel.
pub fn filter_traceback_with(text: &str, marker: &str, sentinel: &str) -> String {
    text.split('\n')
        .skip_while(|line| !line.starts_with(marker))
        .take_while(|line| !line.contains(sentinel))
        .collect::<Vec<_>>()
        .join("\n")
}
