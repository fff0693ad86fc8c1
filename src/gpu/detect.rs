//! CUDA runtime detection.
//!
//! Decides whether a GPU runtime is usable on this host by looking for the
//! CUDA runtime shared library in the platform's library search paths:
//!
//! - **Linux**: `LD_LIBRARY_PATH`, `/usr/local/cuda/lib64` and the usual system lib dirs
//! - **macOS**: `DYLD_LIBRARY_PATH`, `/usr/lib`, `/usr/local/lib`
//! - **Windows**: `PATH`

use std::path::PathBuf;
use tracing::debug;

/// CUDA runtime library filename patterns for the current platform.
///
/// Version-agnostic: any `cudart` major version counts.
pub fn cuda_library_patterns() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["cudart64_*.dll"]
    }
    #[cfg(target_os = "macos")]
    {
        &["libcudart.*.dylib"]
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        &["libcudart.so.*"]
    }
}

fn paths_from_env(var: &str, separator: char) -> Vec<PathBuf> {
    match std::env::var(var) {
        Ok(value) => value
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(std::env::VarError::NotUnicode(_)) => {
            debug!("{var} contains invalid Unicode, ignoring");
            Vec::new()
        }
        Err(std::env::VarError::NotPresent) => {
            debug!("{var} not set");
            Vec::new()
        }
    }
}

/// Directories searched for the CUDA runtime, environment paths first.
pub fn library_search_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        paths_from_env("PATH", ';')
    }
    #[cfg(target_os = "macos")]
    {
        let mut paths = paths_from_env("DYLD_LIBRARY_PATH", ':');
        paths.extend(["/usr/lib", "/usr/local/lib"].map(PathBuf::from));
        paths
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let mut paths = paths_from_env("LD_LIBRARY_PATH", ':');
        paths.extend(
            [
                "/usr/local/cuda/lib64",
                "/usr/lib",
                "/usr/local/lib",
                "/usr/lib/x86_64-linux-gnu",
                "/usr/lib64",
            ]
            .map(PathBuf::from),
        );
        paths
    }
}

/// Whether any file in `dirs` matches one of `patterns`.
///
/// Missing or unreadable directories are skipped.
pub fn library_matches_any(dirs: &[PathBuf], patterns: &[&str]) -> bool {
    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping search path {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(pattern) = patterns.iter().find(|p| glob_match(name, p)) {
                debug!("Found library matching '{}': {}", pattern, path.display());
                return true;
            }
        }
    }
    false
}

/// Whether the CUDA runtime library is installed.
pub fn is_cuda_available() -> bool {
    let found = library_matches_any(&library_search_paths(), cuda_library_patterns());
    debug!(
        "CUDA runtime libraries {}",
        if found { "found" } else { "not found" }
    );
    found
}

/// Match a filename against a glob with `*` (any run) and `?` (one byte).
fn glob_match(name: &str, pattern: &str) -> bool {
    glob_match_bytes(name.as_bytes(), pattern.as_bytes())
}

fn glob_match_bytes(name: &[u8], pattern: &[u8]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((b'*', rest)) => (0..=name.len()).any(|skip| glob_match_bytes(&name[skip..], rest)),
        Some((b'?', rest)) => !name.is_empty() && glob_match_bytes(&name[1..], rest),
        Some((c, rest)) => name.first() == Some(c) && glob_match_bytes(&name[1..], rest),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_glob_match_star() {
        assert!(glob_match("libcudart.so.12", "libcudart.so.*"));
        assert!(glob_match("libcudart.so.11.8.89", "libcudart.so.*"));
        assert!(glob_match("cudart64_12.dll", "cudart64_*.dll"));
        assert!(!glob_match("libcudnn.so.8", "libcudart.so.*"));
    }

    #[test]
    fn test_glob_match_question_and_exact() {
        assert!(glob_match("cudart64_11.dll", "cudart64_??.dll"));
        assert!(!glob_match("cudart64_8.dll", "cudart64_??.dll"));
        assert!(glob_match("exact.so", "exact.so"));
        assert!(!glob_match("exact.so.1", "exact.so"));
    }

    #[test]
    fn test_library_matches_any_in_tempdir() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("libcudart.so.12")).unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        assert!(library_matches_any(&dirs, &["libcudart.so.*"]));
        assert!(!library_matches_any(&dirs, &["libnvinfer.so.*"]));
    }

    #[test]
    fn test_library_matches_any_skips_missing_dirs() {
        let dirs = vec![PathBuf::from("/nonexistent/trainwatch/lib")];
        assert!(!library_matches_any(&dirs, &["*"]));
    }

    #[test]
    fn test_directories_are_not_libraries() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("libcudart.so.12")).unwrap();
        assert!(!library_matches_any(
            &[dir.path().to_path_buf()],
            &["libcudart.so.*"]
        ));
    }

    #[test]
    fn test_search_paths_include_system_dirs() {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        assert!(library_search_paths().contains(&PathBuf::from("/usr/lib")));
    }
}
