//! Transcript sink: stdout mirroring plus best-effort file logging.
//!
//! Every decoded chunk goes to stdout exactly as received (no framing
//! added — the remote controls line endings). When a log file is open the
//! same text is appended with the variant's strip pattern removed; a
//! failed file write prints a diagnostic inline with the transcript and
//! the session carries on. Only remote output is ever logged, never local
//! keystrokes.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Sink for decoded remote output.
pub struct TranscriptSink {
    log: Option<(PathBuf, File)>,
    strip: Option<&'static str>,
}

impl TranscriptSink {
    /// Sink that mirrors to stdout only. Used with `--disable-log`.
    pub fn stdout_only() -> Self {
        Self {
            log: None,
            strip: None,
        }
    }

    /// Sink that mirrors to stdout and appends to a log file, removing
    /// every occurrence of `strip` from the file copy only.
    ///
    /// The file is truncated on open: a second session to the same host in
    /// the same second overwrites the first. Known limitation, left as-is.
    pub fn with_log_file(path: PathBuf, strip: Option<&'static str>) -> std::io::Result<Self> {
        let file = File::create(&path)?;
        debug!(path = %path.display(), "transcript log opened");
        Ok(Self {
            log: Some((path, file)),
            strip,
        })
    }

    /// Path of the open log file, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(|(path, _)| path.as_path())
    }

    /// Write one decoded chunk. Stdout is unconditional; the log write is
    /// best-effort and never fails the session.
    pub fn emit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();

        if let Some((path, file)) = self.log.as_mut() {
            let stripped;
            let to_write = match self.strip {
                Some(pat) if text.contains(pat) => {
                    stripped = text.replace(pat, "");
                    stripped.as_str()
                }
                _ => text,
            };
            if let Err(e) = file.write_all(to_write.as_bytes()) {
                // Diagnostic goes inline with the transcript; the
                // interactive session takes priority over the log.
                println!("\n{e}");
                error!(path = %path.display(), error = %e, "transcript write failed");
            }
        }
    }

    /// Flush and release the log file. Idempotent.
    pub fn close(&mut self) {
        if let Some((path, mut file)) = self.log.take() {
            let _ = file.flush();
            debug!(path = %path.display(), "transcript log closed");
        }
    }
}

impl Drop for TranscriptSink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_log_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.log");
        let mut sink = TranscriptSink::with_log_file(path.clone(), None).unwrap();
        sink.emit("login: ");
        sink.emit("ok\r\n");
        sink.close();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "login: ok\r\n");
    }

    #[test]
    fn strip_applies_to_file_only() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.log");
        let mut sink = TranscriptSink::with_log_file(path.clone(), Some("\n")).unwrap();
        sink.emit("line one\r\nline two\r\n");
        sink.close();
        // The file keeps the remote's native \r framing.
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "line one\rline two\r"
        );
    }

    #[test]
    fn stdout_only_creates_no_file() {
        let mut sink = TranscriptSink::stdout_only();
        assert!(sink.log_path().is_none());
        sink.emit("not logged anywhere");
        sink.close();
    }

    #[test]
    fn close_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.log");
        let mut sink = TranscriptSink::with_log_file(path, None).unwrap();
        sink.emit("x");
        sink.close();
        sink.close();
    }

    #[test]
    fn empty_text_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.log");
        let mut sink = TranscriptSink::with_log_file(path.clone(), None).unwrap();
        sink.emit("");
        sink.close();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
