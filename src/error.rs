use std::fmt;
use thiserror::Error;

/// Which step of a create-style operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The server rejected the change before anything was modified.
    Apply,
    /// The change started but did not complete, for instance an upload that
    /// created the remote file and then failed while copying. The remote
    /// item may exist with partial content.
    Interrupted,
    /// The change was applied but reading back its metadata failed.
    /// The remote item exists even though the operation reports failure.
    Confirm,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => write!(f, "rejected by server"),
            Self::Interrupted => write!(f, "interrupted after the remote side was modified"),
            Self::Confirm => write!(f, "applied, but the result could not be verified"),
        }
    }
}

/// Outcome kinds reported by [`SftpConnection`](crate::SftpConnection).
///
/// The set is flat and none of the kinds is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Transport level connect failure
    #[error("Unable to connect via SSH.")]
    Connect,
    /// Credentials rejected
    #[error("Unable to authenticate via SSH.")]
    Authentication,
    /// The SFTP subsystem could not be started on a live SSH session
    #[error("Unable to connect via SFTP.")]
    Subsystem,
    #[error("Unable to list directory.")]
    CantListDirectory,
    /// Failed download other than a cancellation
    #[error("Unable to download file.")]
    Download,
    /// See [`Step`] for the meaning of [`Step::Interrupted`] and [`Step::Confirm`]
    #[error("Unable to upload file: {0}.")]
    Upload(Step),
    #[error("Unable to move item.")]
    Move,
    /// See [`Step`] for the meaning of [`Step::Confirm`]
    #[error("Unable to create directory: {0}.")]
    CreateDirectory(Step),
    #[error("Unable to delete item.")]
    Delete,
    /// A download was cancelled through its [`Progress`](crate::Progress)
    #[error("Download was cancelled.")]
    Cancelled,
    /// The connection worker is gone and the request was not answered
    #[error("Connection is closed.")]
    Closed,
}

impl Error {
    /// Returns `true` when the remote side effect happened despite the failure.
    ///
    /// Callers should verify remote state before retrying such an operation.
    #[must_use]
    pub const fn remote_changed(&self) -> bool {
        matches!(
            self,
            Self::Upload(Step::Interrupted | Step::Confirm)
                | Self::CreateDirectory(Step::Interrupted | Step::Confirm)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
