//! Session adapter.
//!
//! A [`Session`] owns one authenticated file-transfer session and exposes the
//! primitives the connection needs. Calls are made one at a time by the
//! connection worker; implementations never see concurrent use.

mod error;
mod ssh;

use bytes::Bytes;
use std::path::Path;

pub use error::{SessionError, SessionResult};
pub use ssh::SshSession;

/// Progress callback of [`Session::read_file`].
///
/// Receives `(done, total)` in bytes and returns whether to continue.
pub type OnProgress<'a> = &'a mut (dyn FnMut(u64, u64) -> bool + Send);

/// Directory or stat entry as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    /// Unix seconds
    pub modified: Option<u32>,
    /// Unix seconds
    pub created: Option<u32>,
}

/// Primitive remote operations over one authenticated session.
#[async_trait]
pub trait Session: Send + 'static {
    /// Lists the entries of a directory, excluding `.` and `..`.
    async fn list(&mut self, path: &str) -> SessionResult<Vec<RawEntry>>;

    /// Queries the entry at `path`.
    async fn stat(&mut self, path: &str) -> SessionResult<RawEntry>;

    /// Reads a whole file.
    ///
    /// `on_progress` is called with `(0, total)` before the first chunk and
    /// after every chunk. Returning `false` aborts with [`SessionError::Cancelled`].
    async fn read_file(&mut self, path: &str, on_progress: OnProgress<'_>)
        -> SessionResult<Bytes>;

    /// Writes a local file to `remote`, creating or truncating it.
    ///
    /// A failure after the remote file was created or truncated is reported
    /// as [`SessionError::Interrupted`].
    async fn write_file(&mut self, local: &Path, remote: &str) -> SessionResult<()>;

    async fn rename(&mut self, from: &str, to: &str) -> SessionResult<()>;

    async fn mkdir(&mut self, path: &str) -> SessionResult<()>;

    async fn remove_file(&mut self, path: &str) -> SessionResult<()>;

    async fn remove_dir(&mut self, path: &str) -> SessionResult<()>;

    /// Ends the session. Called once, after the last request.
    async fn close(&mut self) -> SessionResult<()> {
        Ok(())
    }
}
