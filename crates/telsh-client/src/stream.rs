//! Abstract remote stream trait for telsh.
//!
//! Both the TELNET and SSH adapters must satisfy this trait; the session
//! loop only ever talks to the trait. The contract is deliberately
//! poll-shaped: no call may suspend longer than the timeout handed to it,
//! because the caller still has a keyboard to service.

use async_trait::async_trait;
use std::time::Duration;
use telsh_core::TelshResult;

/// Upper bound on the bytes returned by a single poll.
pub const MAX_CHUNK: usize = 655_360;

/// Result of one bounded poll of the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutput {
    /// Bytes arrived. Never empty.
    Data(Vec<u8>),
    /// Nothing available within the timeout.
    Empty,
    /// The peer closed the connection (or channel); no more data will come
    /// beyond what later polls can still drain.
    Eof,
}

/// A live transport session to the remote host.
///
/// Lifecycle is `Open → Eof → Closed`. After `Eof` the stream must keep
/// answering `poll_output` so buffered bytes can be drained; after
/// `close()` no read or write is attempted (`is_closed` guards this).
#[async_trait]
pub trait RemoteStream: Send {
    /// Read whatever is immediately available, waiting at most `timeout`.
    ///
    /// An `Err` here means an unrecoverable transport failure, not merely
    /// an empty read.
    async fn poll_output(&mut self, timeout: Duration) -> TelshResult<PollOutput>;

    /// Forward raw input bytes for immediate, unbuffered transmission.
    async fn write(&mut self, bytes: &[u8]) -> TelshResult<()>;

    /// Whether `close()` has released this stream.
    fn is_closed(&self) -> bool;

    /// Release the transport. Idempotent.
    async fn close(&mut self) -> TelshResult<()>;
}
