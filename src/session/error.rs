use std::io;
use thiserror::Error;
use tokio::time::error::Elapsed as TimeElapsed;

/// Failures reported by a [`Session`](super::Session) backend
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The server answered with an error
    #[error("SFTP: {0}")]
    Sftp(String),
    /// Any errors of the SSH transport
    #[error("SSH: {0}")]
    Ssh(String),
    /// Any errors related to local or stream I/O
    #[error("I/O: {0}")]
    IO(String),
    /// Time limit for the operation exceeded
    #[error("Timeout")]
    Timeout,
    /// The progress callback asked to stop
    #[error("Cancelled")]
    Cancelled,
    /// The remote side was already modified when the operation failed
    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl SessionError {
    /// Marks a failure that happened after the remote side was modified.
    #[must_use]
    pub fn interrupted(self) -> Self {
        match self {
            Self::Interrupted(_) => self,
            other => Self::Interrupted(other.to_string()),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

impl From<russh::Error> for SessionError {
    fn from(error: russh::Error) -> Self {
        Self::Ssh(error.to_string())
    }
}

impl From<russh_sftp::client::error::Error> for SessionError {
    fn from(error: russh_sftp::client::error::Error) -> Self {
        match error {
            russh_sftp::client::error::Error::Timeout => Self::Timeout,
            russh_sftp::client::error::Error::IO(msg) => Self::IO(msg),
            other => Self::Sftp(other.to_string()),
        }
    }
}

impl From<TimeElapsed> for SessionError {
    fn from(_: TimeElapsed) -> Self {
        Self::Timeout
    }
}
