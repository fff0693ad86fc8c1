//! Spinner for long training waits.
//!
//! The spinner draws on stderr, which is also where log lines go. While a
//! spinner is active, log output written through [`SpinnerAwareStderr`] is
//! printed with the spinner suspended so the two never interleave.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

static ACTIVE_SPINNER: LazyLock<Mutex<Option<ProgressBar>>> = LazyLock::new(|| Mutex::new(None));

fn active_spinner() -> Option<ProgressBar> {
    ACTIVE_SPINNER.lock().ok().and_then(|active| active.clone())
}

fn set_active_spinner(pb: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_SPINNER.lock() {
        *active = pb;
    }
}

/// Create a spinner that shows which log is being watched.
///
/// The spinner becomes the active one until [`finish_progress`] is called.
pub fn create_wait_spinner(log_path: &Path, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let name = log_path
        .file_name()
        .map_or_else(|| log_path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] {name}: {{msg}}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    set_active_spinner(Some(pb.clone()));
    Some(pb)
}

/// Finish a spinner with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        set_active_spinner(None);
        pb.finish_with_message(message.to_string());
    }
}

/// Stop the active spinner, leaving its last line in place. Called on signal.
pub fn abandon_active_spinner() {
    if let Ok(mut active) = ACTIVE_SPINNER.lock()
        && let Some(pb) = active.take()
    {
        pb.abandon_with_message("interrupted");
    }
}

/// Stderr writer that suspends the active spinner while writing.
///
/// Pass `SpinnerAwareStderr::default` to `tracing_subscriber`'s `with_writer`.
#[derive(Debug, Default)]
pub struct SpinnerAwareStderr;

impl Write for SpinnerAwareStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active_spinner() {
            Some(pb) => pb.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match active_spinner() {
            Some(pb) => pb.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_disabled_spinner_is_none() {
        assert!(create_wait_spinner(Path::new("run.log"), false).is_none());
    }

    #[test]
    fn test_finish_none_is_noop() {
        finish_progress(None, "done");
    }

    #[test]
    #[serial]
    fn test_spinner_registered_until_finished() {
        let pb = create_wait_spinner(Path::new("/tmp/run.log"), true);
        assert!(active_spinner().is_some());

        finish_progress(pb, "completed");
        assert!(active_spinner().is_none());
    }

    #[test]
    #[serial]
    fn test_abandon_clears_active_spinner() {
        let pb = create_wait_spinner(Path::new("run.log"), true).unwrap();
        abandon_active_spinner();

        assert!(active_spinner().is_none());
        assert!(pb.is_finished());
    }

    #[test]
    #[serial]
    fn test_writer_works_with_and_without_spinner() {
        let mut writer = SpinnerAwareStderr;
        writer.write_all(b"").unwrap();

        let pb = create_wait_spinner(Path::new("run.log"), true);
        writer.write_all(b"").unwrap();
        writer.flush().unwrap();
        finish_progress(pb, "done");
    }
}
