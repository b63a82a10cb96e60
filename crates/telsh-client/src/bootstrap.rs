//! Connection bootstrapping and protocol-variant dispatch.
//!
//! Port 22 selects the SSH variant, anything else TELNET. TELNET dials
//! once and a failure is fatal; SSH setup (connect + authenticate + open
//! shell) is retried up to [`SSH_MAX_ATTEMPTS`] times before giving up.

use std::future::Future;

use tracing::{info, warn};

use telsh_core::{ConnectionInfo, TelshResult};

use crate::session::SessionTuning;
use crate::ssh::SshStream;
use crate::stream::RemoteStream;
use crate::telnet::TelnetStream;

/// SSH setup attempts before the process aborts.
pub const SSH_MAX_ATTEMPTS: u32 = 3;

/// Establish the transport for `info`, returning the live stream and the
/// variant's session tuning. `cols`/`rows` size the SSH pty.
pub async fn establish(
    info: &ConnectionInfo,
    cols: u16,
    rows: u16,
) -> TelshResult<(Box<dyn RemoteStream>, SessionTuning)> {
    if info.is_ssh() {
        info!(host = %info.host, "establishing ssh session");
        let stream =
            with_retry(SSH_MAX_ATTEMPTS, || SshStream::connect(info, cols, rows)).await?;
        Ok((Box::new(stream), SessionTuning::ssh()))
    } else {
        info!(host = %info.host, port = info.port, "establishing telnet session");
        let stream = TelnetStream::connect(info).await?;
        Ok((Box::new(stream), SessionTuning::telnet()))
    }
}

/// Run `attempt` until it succeeds or `max_attempts` consecutive failures
/// have accumulated; the last error is returned. Each failure is printed
/// inline so the user sees why a retry happened.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut attempt: F) -> TelshResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TelshResult<T>>,
{
    let mut failures = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                failures += 1;
                println!("{e}");
                warn!(attempt = failures, max_attempts, error = %e, "setup attempt failed");
                if failures >= max_attempts {
                    return Err(e);
                }
            }
        }
    }
}
