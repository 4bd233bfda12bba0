use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::mpsc, sync::oneshot};

use crate::{
    error::{Error, Result, Step},
    item::{ItemType, RemoteFile, RemoteFolder, RemoteItem},
    progress::Progress,
    session::{Session, SessionError},
};

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Work queued on a connection. Paths are already composed.
pub(crate) enum Request {
    List {
        path: String,
        reply: Reply<Vec<RemoteItem>>,
    },
    Download {
        path: String,
        progress: Arc<Progress>,
        reply: Reply<()>,
    },
    Upload {
        local: PathBuf,
        remote: String,
        reply: Reply<RemoteFile>,
    },
    Move {
        from: String,
        to: String,
        reply: Reply<()>,
    },
    CreateDirectory {
        path: String,
        reply: Reply<RemoteFolder>,
    },
    Delete {
        path: String,
        item_type: ItemType,
        reply: Reply<()>,
    },
    Close {
        reply: Reply<()>,
    },
}

macro_rules! answer {
    ($reply:ident, $result:expr) => {
        if $reply.send($result).is_err() {
            debug!("request outcome dropped by caller");
        }
    };
}

/// Spawns the worker owning `session` and returns its queue.
///
/// Requests are executed one at a time in the order they were queued. The
/// worker stops when every sender is gone or after a `Close` request, closing
/// the session in both cases. Every close request is answered with the
/// outcome of that one session close.
pub(crate) fn run(session: Box<dyn Session>) -> mpsc::UnboundedSender<Request> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
    let mut worker = Worker { session };

    let _join_handle = tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let Some(reply) = worker.execute(request).await else {
                continue;
            };

            rx.close();
            let mut closing = vec![reply];
            while let Some(request) = rx.recv().await {
                closing.extend(worker.execute(request).await);
            }

            let result = worker.close().await;
            for reply in closing {
                answer!(reply, result);
            }
            debug!("connection worker ended");
            return;
        }

        let _ = worker.close().await;
        debug!("connection worker ended");
    });

    tx
}

struct Worker {
    session: Box<dyn Session>,
}

impl Worker {
    /// Runs `request`, except for a close whose reply is handed back.
    async fn execute(&mut self, request: Request) -> Option<Reply<()>> {
        match request {
            Request::List { path, reply } => answer!(reply, self.list(&path).await),
            Request::Download {
                path,
                progress,
                reply,
            } => answer!(reply, self.download(&path, &progress).await),
            Request::Upload {
                local,
                remote,
                reply,
            } => answer!(reply, self.upload(&local, &remote).await),
            Request::Move { from, to, reply } => answer!(reply, self.move_item(&from, &to).await),
            Request::CreateDirectory { path, reply } => {
                answer!(reply, self.create_directory(&path).await);
            }
            Request::Delete {
                path,
                item_type,
                reply,
            } => answer!(reply, self.delete(&path, item_type).await),
            Request::Close { reply } => return Some(reply),
        }
        None
    }

    async fn list(&mut self, path: &str) -> Result<Vec<RemoteItem>> {
        let entries = self.session.list(path).await.map_err(|err| {
            warn!("listing {path} failed: {err}");
            Error::CantListDirectory
        })?;

        Ok(entries.into_iter().map(RemoteItem::from_entry).collect())
    }

    async fn download(&mut self, path: &str, progress: &Progress) -> Result<()> {
        let mut report = |done: u64, total: u64| progress.update(done, total);

        let data = match self.session.read_file(path, &mut report).await {
            Ok(data) => data,
            Err(SessionError::Cancelled) => {
                debug!("download of {path} cancelled");
                return Err(Error::Cancelled);
            }
            Err(err) => {
                warn!("reading {path} failed: {err}");
                return Err(Error::Download);
            }
        };

        if progress.is_cancelled() {
            debug!("download of {path} cancelled before writing");
            return Err(Error::Cancelled);
        }

        store(progress.destination(), &data).await.map_err(|err| {
            warn!("writing {} failed: {err}", progress.destination().display());
            Error::Download
        })
    }

    async fn upload(&mut self, local: &Path, remote: &str) -> Result<RemoteFile> {
        match self.session.write_file(local, remote).await {
            Ok(()) => {}
            Err(err @ SessionError::Interrupted(_)) => {
                warn!("uploading {} to {remote} left it incomplete: {err}", local.display());
                return Err(Error::Upload(Step::Interrupted));
            }
            Err(err) => {
                warn!("uploading {} to {remote} failed: {err}", local.display());
                return Err(Error::Upload(Step::Apply));
            }
        }

        let entry = self.session.stat(remote).await.map_err(|err| {
            warn!("uploaded {remote} but stat failed: {err}");
            Error::Upload(Step::Confirm)
        })?;

        RemoteItem::from_entry(entry).into_file().ok_or_else(|| {
            warn!("uploaded {remote} is not a file");
            Error::Upload(Step::Confirm)
        })
    }

    async fn move_item(&mut self, from: &str, to: &str) -> Result<()> {
        self.session.rename(from, to).await.map_err(|err| {
            warn!("moving {from} to {to} failed: {err}");
            Error::Move
        })
    }

    async fn create_directory(&mut self, path: &str) -> Result<RemoteFolder> {
        if let Err(err) = self.session.mkdir(path).await {
            warn!("creating directory {path} failed: {err}");
            return Err(Error::CreateDirectory(Step::Apply));
        }

        let entry = self.session.stat(path).await.map_err(|err| {
            warn!("created {path} but stat failed: {err}");
            Error::CreateDirectory(Step::Confirm)
        })?;

        RemoteItem::from_entry(entry).into_folder().ok_or_else(|| {
            warn!("created {path} is not a folder");
            Error::CreateDirectory(Step::Confirm)
        })
    }

    async fn delete(&mut self, path: &str, item_type: ItemType) -> Result<()> {
        let result = match item_type {
            ItemType::Folder => self.session.remove_dir(path).await,
            ItemType::File => self.session.remove_file(path).await,
        };

        result.map_err(|err| {
            warn!("deleting {path} failed: {err}");
            Error::Delete
        })
    }

    async fn close(&mut self) -> Result<()> {
        self.session.close().await.map_err(|err| {
            warn!("closing session failed: {err}");
            Error::Closed
        })
    }
}

/// Sibling of `destination` a download is written to before it is moved in place.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Replaces `destination` with `data` so that it is never left half written.
async fn store(destination: &Path, data: &[u8]) -> io::Result<()> {
    let partial = partial_path(destination);
    let written = async {
        fs::write(&partial, data).await?;
        fs::rename(&partial, destination).await
    }
    .await;

    if written.is_err() && fs::remove_file(&partial).await.is_ok() {
        debug!("removed {}", partial.display());
    }
    written
}
