//! Remote session error types
//!
//! Connection failures carry a closed variant set so callers can tell
//! retryable network noise apart from credential failures without string
//! sniffing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for remote session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// How a connection attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// Credentials rejected by the device. Always surfaced.
    AuthFailed,
    /// The connect bound elapsed.
    Timeout,
    /// Refused, reset or aborted by the peer.
    Reset,
    /// Resolution failure or any other transport-fatal condition.
    Fatal,
}

impl ConnectErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectErrorKind::AuthFailed => "authentication failed",
            ConnectErrorKind::Timeout => "timed out",
            ConnectErrorKind::Reset => "connection reset",
            ConnectErrorKind::Fatal => "transport failure",
        }
    }
}

/// Remote session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("device '{name}' has no {field} configured")]
    InvalidDevice { name: String, field: &'static str },

    #[error("connect to {host}:{port} failed ({}): {detail}", kind.as_str())]
    Connect {
        host: String,
        port: u16,
        kind: ConnectErrorKind,
        detail: String,
    },

    #[error("command `{command}` failed: {detail}")]
    Command { command: String, detail: String },

    #[error("transfer channel could not be opened: {detail}")]
    TransferChannel { detail: String },

    #[error("backup succeeded on the device but retrieving {remote} failed: {detail}")]
    Transfer { remote: String, detail: String },

    #[error("local I/O at {path}: {source}")]
    LocalIo { path: PathBuf, source: io::Error },

    #[error("session worker failed: {0}")]
    Worker(String),
}

impl SessionError {
    /// Retryable network conditions: timeouts, resets and other transport
    /// failures. Used to suppress repeated log and alert noise; a clean
    /// authentication failure is never flaky.
    pub fn is_network_flaky(&self) -> bool {
        matches!(
            self,
            SessionError::Connect {
                kind: ConnectErrorKind::Timeout | ConnectErrorKind::Reset | ConnectErrorKind::Fatal,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect_err(kind: ConnectErrorKind) -> SessionError {
        SessionError::Connect {
            host: "192.0.2.1".to_string(),
            port: 22,
            kind,
            detail: "test".to_string(),
        }
    }

    #[test]
    fn test_flaky_classification() {
        assert!(connect_err(ConnectErrorKind::Timeout).is_network_flaky());
        assert!(connect_err(ConnectErrorKind::Reset).is_network_flaky());
        assert!(connect_err(ConnectErrorKind::Fatal).is_network_flaky());
        assert!(!connect_err(ConnectErrorKind::AuthFailed).is_network_flaky());
    }

    #[test]
    fn test_command_error_is_not_flaky() {
        let err = SessionError::Command {
            command: "/export".to_string(),
            detail: "exit code 1".to_string(),
        };
        assert!(!err.is_network_flaky());
    }
}
