//! Connection to an SFTP server for file browsers.
//!
//! Every operation is queued on a single worker task that owns the session, so
//! requests on one connection run one at a time, in the order they were made.
//! Operations return immediately with a [`Pending`] outcome; only
//! [`SftpConnection::connect`] waits for the server.

mod pending;
mod worker;

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::{mpsc, oneshot};

pub use pending::{Download, Pending};

use self::worker::{Reply, Request};
use crate::{
    config::Config,
    error::{Error, Result, Step},
    item::{ItemType, RemoteFile, RemoteFolder, RemoteItem},
    path,
    progress::Progress,
    properties::ServerConnectionProperties,
    session::{Session, SshSession},
};

pub struct SftpConnection {
    tx: mpsc::UnboundedSender<Request>,
}

impl SftpConnection {
    pub const PROPERTIES: ServerConnectionProperties = ServerConnectionProperties {
        display_name: "SFTP",
        default_port: 22,
        allows_custom_port: true,
        service_type: Some("_ssh._tcp"),
    };

    /// Connects and authenticates with the default [`Config`].
    pub async fn connect(address: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        Self::connect_with_config(address, port, username, password, &Config::default()).await
    }

    /// Connects and authenticates.
    ///
    /// Completes once the SFTP subsystem is running. A failed attempt is final,
    /// it is not retried.
    pub async fn connect_with_config(
        address: &str,
        port: u16,
        username: &str,
        password: &str,
        config: &Config,
    ) -> Result<Self> {
        let session = SshSession::connect(address, port, username, password, config).await?;
        Ok(Self::with_session(session))
    }

    /// Serves the connection from an already established session.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn with_session<S: Session>(session: S) -> Self {
        Self {
            tx: worker::run(Box::new(session)),
        }
    }

    fn submit<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> Pending<T> {
        let (reply, receiver) = oneshot::channel();
        if self.tx.send(request(reply)).is_err() {
            warn!("request on a closed connection");
            return Pending::ready(Err(Error::Closed));
        }
        Pending::waiting(receiver)
    }

    /// Lists the contents of `directory`, in the order the server reports them.
    pub fn list_directory(&self, directory: &str) -> Pending<Vec<RemoteItem>> {
        debug!("listing {directory}");
        self.submit(|reply| Request::List {
            path: directory.to_owned(),
            reply,
        })
    }

    /// Downloads `file` into the local `destination`.
    ///
    /// The file is read completely, written next to the destination with a
    /// `.part` suffix and then moved onto it. A failed or cancelled download
    /// leaves an existing destination untouched.
    pub fn download(&self, file: &str, destination: impl Into<PathBuf>) -> Download {
        let progress = Arc::new(Progress::new(destination.into(), true));
        debug!(
            "downloading {file} to {}",
            progress.destination().display()
        );

        let result = self.submit(|reply| Request::Download {
            path: file.to_owned(),
            progress: progress.clone(),
            reply,
        });
        Download::new(progress, result)
    }

    /// Uploads a local file into `destination`, named `rename_to` or after
    /// the local file. A local name that is not valid UTF-8 is rejected with
    /// [`Step::Apply`] rather than altered.
    ///
    /// The uploaded file is stat'ed afterwards. If that fails the outcome is
    /// [`Error::Upload`] with [`Step::Confirm`] although the file was written.
    /// A transfer that breaks off after the remote file was created gives
    /// [`Step::Interrupted`].
    pub fn upload(
        &self,
        file: impl AsRef<Path>,
        rename_to: Option<&str>,
        destination: &str,
    ) -> Pending<RemoteFile> {
        let local = file.as_ref();
        let name = rename_to.or_else(|| local.file_name().and_then(OsStr::to_str));

        let Some(name) = name.filter(|name| path::is_valid_name(name)) else {
            warn!("no valid upload name for {}", local.display());
            return Pending::ready(Err(Error::Upload(Step::Apply)));
        };

        let remote = path::join(destination, name);
        debug!("uploading {} to {remote}", local.display());

        self.submit(|reply| Request::Upload {
            local: local.to_path_buf(),
            remote,
            reply,
        })
    }

    /// Moves `item` into the `destination` directory, keeping its name.
    pub fn move_item(&self, item: &str, destination: &str) -> Pending<()> {
        let name = path::file_name(item);
        if !path::is_valid_name(name) {
            warn!("cannot move {item:?}");
            return Pending::ready(Err(Error::Move));
        }

        self.relocate(item, path::join(destination, name))
    }

    /// Renames `item` within its directory. This is a move, failures are [`Error::Move`].
    pub fn rename(&self, item: &str, new_name: &str) -> Pending<()> {
        if !path::is_valid_name(new_name) {
            warn!("invalid name {new_name:?} for {item}");
            return Pending::ready(Err(Error::Move));
        }

        self.relocate(item, path::join(path::parent(item), new_name))
    }

    fn relocate(&self, item: &str, to: String) -> Pending<()> {
        debug!("moving {item} to {to}");
        self.submit(|reply| Request::Move {
            from: item.to_owned(),
            to,
            reply,
        })
    }

    /// Creates `name` in `parent` and returns the created folder.
    ///
    /// As for [`upload`](Self::upload), a failed stat of the new folder gives
    /// [`Error::CreateDirectory`] with [`Step::Confirm`].
    pub fn create_directory(&self, parent: &str, name: &str) -> Pending<RemoteFolder> {
        if !path::is_valid_name(name) {
            warn!("invalid directory name {name:?}");
            return Pending::ready(Err(Error::CreateDirectory(Step::Apply)));
        }

        let path = path::join(parent, name);
        debug!("creating directory {path}");
        self.submit(|reply| Request::CreateDirectory { path, reply })
    }

    /// Deletes the file or (empty) folder at `path`.
    ///
    /// The caller tells which one it is since the server has a primitive for each.
    pub fn delete(&self, path: &str, item_type: ItemType) -> Pending<()> {
        debug!("deleting {path}");
        self.submit(|reply| Request::Delete {
            path: path.to_owned(),
            item_type,
            reply,
        })
    }

    /// Closes the session after the requests queued so far.
    ///
    /// Dropping the connection has the same effect without reporting the outcome.
    pub fn close(&self) -> Pending<()> {
        debug!("closing connection");
        self.submit(|reply| Request::Close { reply })
    }
}
