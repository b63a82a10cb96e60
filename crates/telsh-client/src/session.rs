//! The session loop: one control flow cooperatively interleaving the
//! remote stream and the local keyboard.
//!
//! Each iteration polls the remote with a short timeout, pushes any
//! decoded output through the transcript sink, then forwards whatever
//! keystrokes have queued up on the input channel. Nothing here ever
//! blocks longer than one poll interval, so input latency is bounded by
//! roughly 10ms without threads sharing mutable state.
//!
//! Interrupt policy: a user interrupt never terminates the session. In
//! raw terminal mode Ctrl-C reaches this loop as the 0x03 keystroke on the
//! input channel and is forwarded to the remote shell like any other byte;
//! only peer closure or an unrecoverable I/O error ends the loop.

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, warn};

use telsh_core::decode;

use crate::stream::{PollOutput, RemoteStream};
use crate::transcript::TranscriptSink;

/// Per-variant loop timing and log stripping.
#[derive(Debug, Clone)]
pub struct SessionTuning {
    /// How long one remote poll may wait.
    pub poll_timeout: Duration,
    /// Extra sleep when a poll comes back empty, so a tight poll timeout
    /// does not busy-spin an idle session.
    pub idle_sleep: Option<Duration>,
    /// Pattern removed from the transcript's file copy.
    pub strip: Option<&'static str>,
}

impl SessionTuning {
    /// TELNET: eager 1ms polls, throttled by an explicit idle sleep. The
    /// log keeps only the remote's native `\r` line endings.
    pub fn telnet() -> Self {
        Self {
            poll_timeout: Duration::from_millis(1),
            idle_sleep: Some(Duration::from_millis(10)),
            strip: Some("\n"),
        }
    }

    /// SSH: the 10ms poll interval is itself the throttle; no stripping.
    pub fn ssh() -> Self {
        Self {
            poll_timeout: Duration::from_millis(10),
            idle_sleep: None,
            strip: None,
        }
    }
}

/// Drive the session until the remote closes or a fatal I/O error occurs,
/// then drain leftover output and release the stream and sink.
///
/// `input` carries raw keystroke byte sequences from the terminal reader;
/// a closed input channel just means no more keystrokes, not session end.
pub async fn run_session(
    stream: &mut dyn RemoteStream,
    input: &mut Receiver<Vec<u8>>,
    sink: &mut TranscriptSink,
    tuning: &SessionTuning,
) -> telsh_core::TelshResult<()> {
    debug!(?tuning, "session loop started");

    'session: loop {
        match stream.poll_output(tuning.poll_timeout).await {
            Ok(PollOutput::Data(bytes)) => {
                sink.emit(&decode(&bytes));
            }
            Ok(PollOutput::Empty) => {
                if let Some(pause) = tuning.idle_sleep {
                    tokio::time::sleep(pause).await;
                }
            }
            Ok(PollOutput::Eof) => {
                debug!("remote closed the connection");
                break 'session;
            }
            Err(e) => {
                println!("\n{e}");
                warn!(error = %e, "fatal read error, ending session");
                break 'session;
            }
        }

        loop {
            match input.try_recv() {
                Ok(bytes) => {
                    if let Err(e) = stream.write(&bytes).await {
                        println!("\n{e}");
                        warn!(error = %e, "fatal write error, ending session");
                        break 'session;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    drain(stream, sink, tuning).await;

    let _ = stream.close().await;
    sink.close();
    debug!("session loop finished");
    Ok(())
}

/// Post-loop drain: keep polling until two consecutive empty reads, EOF,
/// or an error, so buffered remote bytes are not lost on shutdown.
async fn drain(stream: &mut dyn RemoteStream, sink: &mut TranscriptSink, tuning: &SessionTuning) {
    let mut consecutive_empty = 0u32;
    while !stream.is_closed() {
        match stream.poll_output(tuning.poll_timeout).await {
            Ok(PollOutput::Data(bytes)) => {
                consecutive_empty = 0;
                sink.emit(&decode(&bytes));
            }
            Ok(PollOutput::Empty) => {
                consecutive_empty += 1;
                if consecutive_empty >= 2 {
                    break;
                }
            }
            Ok(PollOutput::Eof) | Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use telsh_core::{TelshError, TelshResult};
    use tokio::sync::mpsc;

    /// Scripted remote: plays back a fixed sequence of poll results and
    /// records every write.
    struct FakeStream {
        script: VecDeque<TelshResult<PollOutput>>,
        written: Vec<Vec<u8>>,
        closed: bool,
    }

    impl FakeStream {
        fn new(script: Vec<TelshResult<PollOutput>>) -> Self {
            Self {
                script: script.into(),
                written: Vec::new(),
                closed: false,
            }
        }
    }

    #[async_trait]
    impl RemoteStream for FakeStream {
        async fn poll_output(&mut self, _timeout: Duration) -> TelshResult<PollOutput> {
            // Past the end of the script the remote is simply gone.
            self.script.pop_front().unwrap_or(Ok(PollOutput::Eof))
        }

        async fn write(&mut self, bytes: &[u8]) -> TelshResult<()> {
            self.written.push(bytes.to_vec());
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed
        }

        async fn close(&mut self) -> TelshResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn file_sink(dir: &tempfile::TempDir) -> (TranscriptSink, std::path::PathBuf) {
        let path = dir.path().join("session.log");
        let sink = TranscriptSink::with_log_file(path.clone(), None).unwrap();
        (sink, path)
    }

    #[tokio::test]
    async fn emits_chunks_in_order_then_terminates() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sink, path) = file_sink(&tmp);
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Data(b"hello\n".to_vec())),
            Ok(PollOutput::Empty),
            Ok(PollOutput::Data(b"world".to_vec())),
            Ok(PollOutput::Eof),
        ]);
        let (_tx, mut rx) = mpsc::channel(8);

        let tuning = SessionTuning::ssh();
        let run = run_session(&mut stream, &mut rx, &mut sink, &tuning);
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("session loop hung")
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\nworld");
        assert!(stream.closed);
    }

    #[tokio::test]
    async fn forwarded_interrupt_does_not_end_the_session() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sink, path) = file_sink(&tmp);
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Data(b"$ ".to_vec())),
            Ok(PollOutput::Empty),
            Ok(PollOutput::Data(b"^C\r\n$ ".to_vec())),
            Ok(PollOutput::Eof),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        // Ctrl-C arrives as an ordinary keystroke byte.
        tx.send(vec![0x03]).await.unwrap();

        run_session(&mut stream, &mut rx, &mut sink, &SessionTuning::ssh())
            .await
            .unwrap();

        // The interrupt was forwarded, not acted on: output after the 0x03
        // was still emitted and the loop only ended on EOF.
        assert_eq!(stream.written, vec![vec![0x03]]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "$ ^C\r\n$ ");
    }

    #[tokio::test]
    async fn drain_recovers_bytes_buffered_past_eof() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sink, path) = file_sink(&tmp);
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Eof),
            Ok(PollOutput::Data(b"tail".to_vec())),
            Ok(PollOutput::Empty),
            Ok(PollOutput::Empty),
            // Anything past two consecutive empties must never be polled.
            Ok(PollOutput::Data(b"unreachable".to_vec())),
        ]);
        let (_tx, mut rx) = mpsc::channel(8);

        run_session(&mut stream, &mut rx, &mut sink, &SessionTuning::ssh())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "tail");
    }

    #[tokio::test]
    async fn fatal_read_error_ends_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sink, path) = file_sink(&tmp);
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Data(b"partial".to_vec())),
            Err(TelshError::Transport("connection reset".into())),
        ]);
        let (_tx, mut rx) = mpsc::channel(8);

        run_session(&mut stream, &mut rx, &mut sink, &SessionTuning::ssh())
            .await
            .unwrap();

        // Output seen before the failure survives; the stream is released.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "partial");
        assert!(stream.closed);
    }

    #[tokio::test]
    async fn keystrokes_are_forwarded_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut sink, _path) = file_sink(&tmp);
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Empty),
            Ok(PollOutput::Empty),
            Ok(PollOutput::Eof),
        ]);
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(b"ls".to_vec()).await.unwrap();
        tx.send(b"\r".to_vec()).await.unwrap();

        run_session(&mut stream, &mut rx, &mut sink, &SessionTuning::ssh())
            .await
            .unwrap();

        assert_eq!(stream.written, vec![b"ls".to_vec(), b"\r".to_vec()]);
    }

    #[tokio::test]
    async fn telnet_tuning_strips_newlines_from_the_log() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.log");
        let tuning = SessionTuning::telnet();
        let mut sink = TranscriptSink::with_log_file(path.clone(), tuning.strip).unwrap();
        let mut stream = FakeStream::new(vec![
            Ok(PollOutput::Data(b"a\r\nb\r\n".to_vec())),
            Ok(PollOutput::Eof),
        ]);
        let (_tx, mut rx) = mpsc::channel(8);

        run_session(&mut stream, &mut rx, &mut sink, &tuning).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\rb\r");
    }
}
