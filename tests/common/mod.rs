#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use sftp_connection::{
    path,
    session::{OnProgress, RawEntry, Session, SessionError, SessionResult},
    SftpConnection,
};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::Notify;

/// Bytes handed to the progress callback per chunk.
pub const CHUNK: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    List,
    Stat,
    Read,
    Write,
    /// Data transfer of a write, after the remote file was truncated
    Copy,
    Rename,
    Mkdir,
    RemoveFile,
    RemoveDir,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Stat(String),
    Read(String),
    Write(String, String),
    Rename(String, String),
    Mkdir(String),
    RemoveFile(String),
    RemoveDir(String),
    Close,
}

#[derive(Debug, Clone)]
struct Node {
    path: String,
    is_dir: bool,
    data: Vec<u8>,
    modified: Option<u32>,
}

/// In-memory server shared by the test and its sessions.
#[derive(Default)]
pub struct Remote {
    nodes: Mutex<Vec<Node>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<Vec<Op>>,
    active: AtomicUsize,
    overlapped: AtomicBool,
    pause_reads: AtomicBool,
    /// Notified once a paused read delivered its first chunk
    pub chunk_reached: Notify,
    /// Lets a paused read continue
    pub resume: Notify,
}

struct Active<'a>(&'a Remote);

impl Drop for Active<'_> {
    fn drop(&mut self) {
        let _ = self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Remote {
    pub fn new() -> Arc<Self> {
        let remote = Arc::new(Self::default());
        remote.add_dir("/");
        remote
    }

    pub fn connection(self: &Arc<Self>) -> SftpConnection {
        let _ = env_logger::builder().is_test(true).try_init();
        SftpConnection::with_session(MockSession {
            remote: self.clone(),
        })
    }

    pub fn add_dir(&self, path: &str) {
        self.insert(Node {
            path: path.to_owned(),
            is_dir: true,
            data: Vec::new(),
            modified: None,
        });
    }

    pub fn add_file(&self, path: &str, data: &[u8]) {
        self.insert(Node {
            path: path.to_owned(),
            is_dir: false,
            data: data.to_vec(),
            modified: Some(1_700_000_000),
        });
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().push(op);
    }

    pub fn pause_reads(&self) {
        self.pause_reads.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn data(&self, path: &str) -> Option<Vec<u8>> {
        self.find(path).map(|node| node.data)
    }

    /// Whether two calls were ever in flight at the same time.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn insert(&self, node: Node) {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|n| n.path != node.path);
        nodes.push(node);
    }

    fn find(&self, path: &str) -> Option<Node> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.path == path)
            .cloned()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.find(path).is_some_and(|n| n.is_dir)
    }

    fn failing(&self, op: Op) -> bool {
        self.failing.lock().unwrap().contains(&op)
    }

    fn enter(&self, call: Call, op: Op) -> SessionResult<Active<'_>> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let active = Active(self);

        self.calls.lock().unwrap().push(call);
        if self.failing(op) {
            return Err(SessionError::Sftp("injected failure".to_owned()));
        }
        Ok(active)
    }
}

fn entry(node: &Node) -> RawEntry {
    RawEntry {
        name: path::file_name(&node.path).to_owned(),
        is_dir: node.is_dir,
        size: if node.is_dir {
            None
        } else {
            Some(node.data.len() as u64)
        },
        modified: node.modified,
        created: None,
    }
}

fn no_such_file() -> SessionError {
    SessionError::Sftp("No such file".to_owned())
}

pub struct MockSession {
    remote: Arc<Remote>,
}

#[async_trait]
impl Session for MockSession {
    async fn list(&mut self, dir: &str) -> SessionResult<Vec<RawEntry>> {
        let _active = self.remote.enter(Call::List(dir.to_owned()), Op::List)?;
        // Leave room for another call to sneak in.
        tokio::time::sleep(Duration::from_millis(5)).await;

        if !self.remote.is_dir(dir) {
            return Err(no_such_file());
        }

        let nodes = self.remote.nodes.lock().unwrap().clone();
        Ok(nodes
            .iter()
            .filter(|n| n.path != dir && path::parent(&n.path) == dir)
            .map(entry)
            .collect())
    }

    async fn stat(&mut self, path: &str) -> SessionResult<RawEntry> {
        let _active = self.remote.enter(Call::Stat(path.to_owned()), Op::Stat)?;
        self.remote.find(path).map(|n| entry(&n)).ok_or_else(no_such_file)
    }

    async fn read_file(
        &mut self,
        path: &str,
        on_progress: OnProgress<'_>,
    ) -> SessionResult<Bytes> {
        let _active = self.remote.enter(Call::Read(path.to_owned()), Op::Read)?;
        let node = self
            .remote
            .find(path)
            .filter(|n| !n.is_dir)
            .ok_or_else(no_such_file)?;

        let total = node.data.len() as u64;
        if !on_progress(0, total) {
            return Err(SessionError::Cancelled);
        }

        let mut done = 0;
        for (index, chunk) in node.data.chunks(CHUNK).enumerate() {
            done += chunk.len() as u64;
            if !on_progress(done, total) {
                return Err(SessionError::Cancelled);
            }

            if index == 0 && self.remote.pause_reads.load(Ordering::SeqCst) {
                self.remote.chunk_reached.notify_one();
                self.remote.resume.notified().await;
            }
        }

        Ok(Bytes::from(node.data))
    }

    async fn write_file(&mut self, local: &Path, remote: &str) -> SessionResult<()> {
        let call = Call::Write(local.display().to_string(), remote.to_owned());
        let _active = self.remote.enter(call, Op::Write)?;

        let data = tokio::fs::read(local).await?;
        if !self.remote.is_dir(path::parent(remote)) {
            return Err(no_such_file());
        }

        if self.remote.failing(Op::Copy) {
            self.remote.add_file(remote, &[]);
            return Err(SessionError::Interrupted("injected failure".to_owned()));
        }

        self.remote.add_file(remote, &data);
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> SessionResult<()> {
        let call = Call::Rename(from.to_owned(), to.to_owned());
        let _active = self.remote.enter(call, Op::Rename)?;

        if !self.remote.exists(from) || !self.remote.is_dir(path::parent(to)) {
            return Err(no_such_file());
        }

        let prefix = format!("{from}/");
        for node in self.remote.nodes.lock().unwrap().iter_mut() {
            if node.path == from {
                node.path = to.to_owned();
            } else if let Some(rest) = node.path.strip_prefix(&prefix) {
                node.path = path::join(to, rest);
            }
        }
        Ok(())
    }

    async fn mkdir(&mut self, path: &str) -> SessionResult<()> {
        let _active = self.remote.enter(Call::Mkdir(path.to_owned()), Op::Mkdir)?;

        if self.remote.exists(path) || !self.remote.is_dir(path::parent(path)) {
            return Err(SessionError::Sftp("Failure".to_owned()));
        }

        self.remote.add_dir(path);
        Ok(())
    }

    async fn remove_file(&mut self, path: &str) -> SessionResult<()> {
        let call = Call::RemoveFile(path.to_owned());
        let _active = self.remote.enter(call, Op::RemoveFile)?;

        match self.remote.find(path) {
            Some(node) if !node.is_dir => {
                self.remote.nodes.lock().unwrap().retain(|n| n.path != path);
                Ok(())
            }
            _ => Err(no_such_file()),
        }
    }

    async fn remove_dir(&mut self, path: &str) -> SessionResult<()> {
        let call = Call::RemoveDir(path.to_owned());
        let _active = self.remote.enter(call, Op::RemoveDir)?;

        let mut nodes = self.remote.nodes.lock().unwrap();
        let is_empty_dir = nodes.iter().any(|n| n.path == path && n.is_dir)
            && !nodes.iter().any(|n| path::parent(&n.path) == path && n.path != path);
        if !is_empty_dir {
            return Err(SessionError::Sftp("Failure".to_owned()));
        }

        nodes.retain(|n| n.path != path);
        Ok(())
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.remote.calls.lock().unwrap().push(Call::Close);
        if self.remote.failing(Op::Close) {
            return Err(SessionError::Ssh("injected failure".to_owned()));
        }
        Ok(())
    }
}
