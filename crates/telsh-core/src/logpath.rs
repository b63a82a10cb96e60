//! Transcript log file naming.
//!
//! One file per session, `<sanitized-host>_<YYYYMMDD_HHMMSS>.log` inside a
//! caller-chosen directory. The host string the user typed may carry
//! characters that are unsafe in a file name, or even terminal escape
//! sequences pasted from a styled prompt; both are stripped before the name
//! is formed.

use chrono::{DateTime, Local};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Characters never allowed in a log file name. The `.` entry folds
/// dotted IP addresses into a compact name (`10.0.0.5` → `10005`).
const PROHIBITED: &[char] = &[
    '[', ']', '<', '>', '#', '%', '$', ':', ';', '~', '.', '\r', ' ', '\n', '\t',
];

// Prompt-styling artifacts (powerline and friends) that can ride along in a
// copy-pasted host string.
static ESC_H: LazyLock<Regex> = LazyLock::new(|| Regex::new("\x1b.*h").unwrap());
static ESC_M: LazyLock<Regex> = LazyLock::new(|| Regex::new("\x1b.*m").unwrap());

/// Strip prohibited characters and embedded escape sequences from a host
/// string. Idempotent: sanitizing twice yields the same result.
pub fn sanitize_host(host: &str) -> String {
    let mut result: String = host.chars().filter(|c| !PROHIBITED.contains(c)).collect();

    if result.contains('\x1b') {
        result = ESC_H.replace_all(&result, "").into_owned();
        result = ESC_M.replace_all(&result, "").into_owned();
    }

    result
}

/// Derive the log file path for a session against `host` started at `now`,
/// creating `dir` (recursively) if it does not yet exist.
///
/// Uniqueness is second-granular: two sessions to the same host within the
/// same second get the same path. Known limitation, left as-is.
pub fn resolve_log_path(
    host: &str,
    dir: &Path,
    now: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let name = format!("{}_{}.log", sanitize_host(host), now.format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    debug!(path = %path.display(), "resolved log path");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_removes_prohibited_characters() {
        let dirty = "[host]<>:#;%$~ name\r\n";
        let clean = sanitize_host(dirty);
        for c in PROHIBITED {
            assert!(!clean.contains(*c), "still contains {c:?}");
        }
        assert_eq!(clean, "hostname");
    }

    #[test]
    fn sanitize_folds_dotted_addresses() {
        assert_eq!(sanitize_host("10.0.0.5"), "10005");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for s in ["10.0.0.5", "[a]b:c", "\x1b[31mred\x1b[0mhost", "plain"] {
            let once = sanitize_host(s);
            assert_eq!(sanitize_host(&once), once);
        }
    }

    #[test]
    fn sanitize_strips_escape_sequences() {
        // A powerline-style prompt fragment pasted into the host argument.
        let clean = sanitize_host("\x1b[?2004hrouter");
        assert!(!clean.contains('\x1b'));
        assert!(clean.ends_with("router"));
    }

    #[test]
    fn sanitize_leaves_plain_hosts_alone() {
        assert_eq!(sanitize_host("router-1_lab"), "router-1_lab");
    }

    #[test]
    fn resolve_creates_directory_and_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("log").join("nested");
        assert!(!dir.exists());

        let now = Local.with_ymd_and_hms(2026, 8, 27, 13, 5, 9).unwrap();
        let path = resolve_log_path("10.0.0.5", &dir, now).unwrap();

        assert!(dir.is_dir());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "10005_20260827_130509.log"
        );
    }

    #[test]
    fn resolve_is_a_noop_on_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 8, 27, 13, 5, 9).unwrap();
        resolve_log_path("host", tmp.path(), now).unwrap();
        // Second resolution against the same directory must not fail.
        resolve_log_path("host", tmp.path(), now).unwrap();
    }
}
