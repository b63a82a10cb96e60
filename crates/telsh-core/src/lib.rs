//! telsh-core: shared types for the telsh remote-session client.
//!
//! Provides the error enum, connection parameters, the multi-encoding
//! text decoder, and host sanitization / log path resolution.

pub mod decode;
pub mod error;
pub mod logpath;

use std::time::Duration;

// Re-export commonly used items at crate root.
pub use decode::{decode, decode_with, TextEncoding, DEFAULT_ENCODINGS};
pub use error::{TelshError, TelshResult};
pub use logpath::{resolve_log_path, sanitize_host};

/// Parameters for one connection, assembled before dialing.
///
/// `username` and `password` stay empty for TELNET; for SSH they are
/// filled in by the credential prompt just before the first attempt.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Destination hostname or IP address.
    pub host: String,
    /// Destination port. Port 22 selects the SSH variant, anything else TELNET.
    pub port: u16,
    /// Login name (SSH only).
    pub username: String,
    /// Login password (SSH only). Held in memory for the lifetime of the run.
    pub password: String,
    /// Dial timeout.
    pub timeout: Duration,
}

impl ConnectionInfo {
    /// Build connection info for a host/port pair with the default dial timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Whether this connection uses the SSH variant.
    pub fn is_ssh(&self) -> bool {
        self.port == 22
    }
}
