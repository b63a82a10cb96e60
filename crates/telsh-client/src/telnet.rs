//! TELNET stream adapter.
//!
//! Raw TCP passthrough with just enough IAC handling to keep a real TELNET
//! server happy: every option the peer offers or demands is refused
//! (DO → WONT, WILL → DONT), subnegotiations are skipped, and command
//! bytes never reach the transcript. Full option negotiation is out of
//! scope on purpose.
//!
//! Connection setup is a single attempt; a TELNET dial failure is treated
//! as a configuration error (bad host/port) and is fatal.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use telsh_core::{ConnectionInfo, TelshError, TelshResult};

use crate::stream::{PollOutput, RemoteStream, MAX_CHUNK};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IacState {
    /// Plain text.
    Text,
    /// Saw IAC, expecting a command byte.
    Command,
    /// Saw IAC DO/DONT/WILL/WONT, expecting an option byte.
    Option(u8),
    /// Inside an IAC SB ... IAC SE subnegotiation.
    Subneg,
    /// Saw IAC inside a subnegotiation.
    SubnegIac,
}

/// Incremental IAC scanner. State is carried across reads so a command
/// split over two chunks is still recognized.
#[derive(Debug)]
struct IacScanner {
    state: IacState,
}

impl IacScanner {
    fn new() -> Self {
        Self {
            state: IacState::Text,
        }
    }

    /// Separate incoming bytes into displayable text and the refuse-all
    /// replies owed to the peer.
    fn feed(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut out = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &b in input {
            self.state = match self.state {
                IacState::Text => {
                    if b == IAC {
                        IacState::Command
                    } else {
                        out.push(b);
                        IacState::Text
                    }
                }
                IacState::Command => match b {
                    IAC => {
                        // Escaped 0xFF data byte.
                        out.push(IAC);
                        IacState::Text
                    }
                    DO | DONT | WILL | WONT => IacState::Option(b),
                    SB => IacState::Subneg,
                    _ => IacState::Text, // NOP, GA, and friends
                },
                IacState::Option(verb) => {
                    match verb {
                        DO => replies.extend_from_slice(&[IAC, WONT, b]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, b]),
                        _ => {} // DONT/WONT need no answer from a refuser
                    }
                    IacState::Text
                }
                IacState::Subneg => {
                    if b == IAC {
                        IacState::SubnegIac
                    } else {
                        IacState::Subneg
                    }
                }
                IacState::SubnegIac => match b {
                    SE => IacState::Text,
                    _ => IacState::Subneg,
                },
            };
        }

        (out, replies)
    }
}

/// TELNET variant of [`RemoteStream`].
#[derive(Debug)]
pub struct TelnetStream {
    stream: TcpStream,
    scanner: IacScanner,
    buf: Vec<u8>,
    closed: bool,
}

impl TelnetStream {
    /// Dial `host:port`. Single attempt, bounded by `info.timeout`.
    pub async fn connect(info: &ConnectionInfo) -> TelshResult<Self> {
        let stream = tokio::time::timeout(
            info.timeout,
            TcpStream::connect((info.host.as_str(), info.port)),
        )
        .await
        .map_err(|_| {
            TelshError::Connect(format!("connection to {}:{} timed out", info.host, info.port))
        })?
        .map_err(|e| TelshError::Connect(format!("{}:{}: {e}", info.host, info.port)))?;

        // Keystrokes must go out immediately, not sit in Nagle's buffer.
        stream.set_nodelay(true)?;

        debug!(host = %info.host, port = info.port, "telnet connected");
        Ok(Self {
            stream,
            scanner: IacScanner::new(),
            buf: vec![0u8; MAX_CHUNK],
            closed: false,
        })
    }
}

#[async_trait]
impl RemoteStream for TelnetStream {
    async fn poll_output(&mut self, timeout: Duration) -> TelshResult<PollOutput> {
        if self.closed {
            return Err(TelshError::StreamClosed);
        }

        match tokio::time::timeout(timeout, self.stream.read(&mut self.buf)).await {
            Err(_) => Ok(PollOutput::Empty),
            Ok(Ok(0)) => Ok(PollOutput::Eof),
            Ok(Ok(n)) => {
                let chunk = self.buf[..n].to_vec();
                let (data, replies) = self.scanner.feed(&chunk);
                if !replies.is_empty() {
                    trace!(len = replies.len(), "answering telnet negotiation");
                    self.stream.write_all(&replies).await?;
                }
                if data.is_empty() {
                    // Chunk was pure negotiation traffic.
                    Ok(PollOutput::Empty)
                } else {
                    Ok(PollOutput::Data(data))
                }
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> TelshResult<()> {
        if self.closed {
            return Err(TelshError::StreamClosed);
        }

        if bytes.contains(&IAC) {
            // 0xFF on the wire must be doubled.
            let mut escaped = Vec::with_capacity(bytes.len() + 1);
            for &b in bytes {
                escaped.push(b);
                if b == IAC {
                    escaped.push(IAC);
                }
            }
            self.stream.write_all(&escaped).await?;
        } else {
            self.stream.write_all(bytes).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> TelshResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // Peer may already be gone; shutdown failure is uninteresting.
        let _ = self.stream.shutdown().await;
        debug!("telnet stream closed");
        Ok(())
    }
}
