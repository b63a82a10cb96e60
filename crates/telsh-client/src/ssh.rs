//! SSH stream adapter.
//!
//! Wraps a russh interactive shell channel behind [`RemoteStream`]. Host
//! keys are accepted unconditionally (trust-on-first-use without the
//! remembering part) — a deliberate simplicity trade-off for a logging
//! client, not a security recommendation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::keys::ssh_key;
use russh::{Channel, ChannelMsg, Disconnect};
use tracing::{debug, warn};

use telsh_core::{ConnectionInfo, TelshError, TelshResult};

use crate::stream::{PollOutput, RemoteStream};

/// Handler that accepts whatever host key the server presents.
struct AcceptAllHandler;

impl client::Handler for AcceptAllHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        warn!("accepting server host key without verification");
        Ok(true)
    }
}

/// SSH variant of [`RemoteStream`].
pub struct SshStream {
    handle: client::Handle<AcceptAllHandler>,
    channel: Channel<client::Msg>,
    closed: bool,
}

impl SshStream {
    /// One full setup attempt: connect, password-authenticate, open an
    /// interactive channel with a pty and shell. Retrying is the
    /// bootstrapper's job, not this function's.
    pub async fn connect(info: &ConnectionInfo, cols: u16, rows: u16) -> TelshResult<Self> {
        let config = Arc::new(client::Config::default());

        let mut handle = tokio::time::timeout(
            info.timeout,
            client::connect(config, (info.host.as_str(), info.port), AcceptAllHandler),
        )
        .await
        .map_err(|_| {
            TelshError::Connect(format!("connection to {}:{} timed out", info.host, info.port))
        })?
        .map_err(|e| TelshError::Connect(format!("{}:{}: {e}", info.host, info.port)))?;

        let auth = handle
            .authenticate_password(&info.username, &info.password)
            .await
            .map_err(|e| TelshError::Auth(e.to_string()))?;
        match auth {
            client::AuthResult::Success => {}
            client::AuthResult::Failure { .. } => {
                return Err(TelshError::Auth(format!(
                    "server rejected password for {}",
                    info.username
                )));
            }
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| TelshError::Transport(e.to_string()))?;
        channel
            .request_pty(false, "xterm-256color", cols as u32, rows as u32, 0, 0, &[])
            .await
            .map_err(|e| TelshError::Transport(e.to_string()))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| TelshError::Transport(e.to_string()))?;

        debug!(host = %info.host, user = %info.username, "ssh shell opened");
        Ok(Self {
            handle,
            channel,
            closed: false,
        })
    }
}

#[async_trait]
impl RemoteStream for SshStream {
    async fn poll_output(&mut self, timeout: Duration) -> TelshResult<PollOutput> {
        if self.closed {
            return Err(TelshError::StreamClosed);
        }

        match tokio::time::timeout(timeout, self.channel.wait()).await {
            Err(_) => Ok(PollOutput::Empty),
            Ok(None) => Ok(PollOutput::Eof),
            Ok(Some(msg)) => match msg {
                ChannelMsg::Data { data } => {
                    if data.is_empty() {
                        Ok(PollOutput::Empty)
                    } else {
                        Ok(PollOutput::Data(data.to_vec()))
                    }
                }
                ChannelMsg::ExtendedData { data, .. } => {
                    // Stderr of the remote shell belongs in the transcript too.
                    if data.is_empty() {
                        Ok(PollOutput::Empty)
                    } else {
                        Ok(PollOutput::Data(data.to_vec()))
                    }
                }
                ChannelMsg::Eof | ChannelMsg::Close => Ok(PollOutput::Eof),
                ChannelMsg::ExitStatus { exit_status } => {
                    debug!(exit_status, "remote shell exited");
                    Ok(PollOutput::Empty)
                }
                _ => Ok(PollOutput::Empty),
            },
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> TelshResult<()> {
        if self.closed {
            return Err(TelshError::StreamClosed);
        }
        self.channel
            .data(bytes)
            .await
            .map_err(|e| TelshError::Transport(e.to_string()))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> TelshResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The channel and session may already be torn down by the peer.
        let _ = self.channel.eof().await;
        let _ = self
            .handle
            .disconnect(Disconnect::ByApplication, "session end", "en")
            .await;
        debug!("ssh stream closed");
        Ok(())
    }
}
