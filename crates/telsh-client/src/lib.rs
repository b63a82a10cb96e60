//! telsh-client: session engine for the telsh remote-session client.
//!
//! Provides the `RemoteStream` capability trait with TELNET and SSH
//! implementations, the connection bootstrapper (with SSH retry), the
//! transcript sink, and the cooperative session loop that ties them
//! together.
//!
//! # Quick Start
//!
//! ```no_run
//! use telsh_client::{bootstrap, session, TranscriptSink};
//! use telsh_core::ConnectionInfo;
//!
//! # async fn example() -> telsh_core::TelshResult<()> {
//! let info = ConnectionInfo::new("10.0.0.5", 23);
//! let (mut stream, tuning) = bootstrap::establish(&info, 80, 24).await?;
//!
//! let (_tx, mut input) = tokio::sync::mpsc::channel(64);
//! let mut sink = TranscriptSink::stdout_only();
//! session::run_session(stream.as_mut(), &mut input, &mut sink, &tuning).await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod session;
pub mod ssh;
pub mod stream;
pub mod telnet;
pub mod transcript;

// Re-export primary public types.
pub use bootstrap::{establish, SSH_MAX_ATTEMPTS};
pub use session::{run_session, SessionTuning};
pub use ssh::SshStream;
pub use stream::{PollOutput, RemoteStream, MAX_CHUNK};
pub use telnet::TelnetStream;
pub use transcript::TranscriptSink;

// Re-export telsh-core error types for convenience.
pub use telsh_core::{TelshError, TelshResult};
