use bytes::{Bytes, BytesMut};
use russh::{client, keys::PublicKey, Disconnect};
use russh_sftp::client::{fs::Metadata, SftpSession};
use std::{io, path::Path, sync::Arc};
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncWriteExt},
    net, time,
};

use super::{OnProgress, RawEntry, Session, SessionError, SessionResult};
use crate::{config::Config, error::Error, path};

/// Accepts every server key, the fingerprint is not checked.
struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("check_server_key: {:?}", server_public_key.algorithm());
        Ok(true)
    }
}

/// SFTP subsystem session over an SSH connection authenticated by password.
pub struct SshSession {
    handle: client::Handle<ClientHandler>,
    sftp: SftpSession,
    chunk_size: usize,
}

impl SshSession {
    /// Connects, authenticates and starts the `sftp` subsystem.
    ///
    /// Each stage fails with its own kind: [`Error::Connect`],
    /// [`Error::Authentication`] or [`Error::Subsystem`].
    pub async fn connect(
        address: &str,
        port: u16,
        username: &str,
        password: &str,
        config: &Config,
    ) -> Result<Self, Error> {
        let mut handle = time::timeout(config.connect_timeout(), transport(address, port, config))
            .await
            .map_err(SessionError::from)
            .and_then(|handle| handle)
            .map_err(|err| {
                warn!("unable to connect to {address}:{port}: {err}");
                Error::Connect
            })?;
        info!("connected to {address}:{port}");

        let auth = handle
            .authenticate_password(username, password)
            .await
            .map_err(|err| {
                warn!("authentication of {username} failed: {err}");
                Error::Authentication
            })?;
        if !auth.success() {
            warn!("authentication of {username} rejected by server");
            return Err(Error::Authentication);
        }
        info!("authenticated as {username}");

        let sftp = subsystem(&handle, config).await.map_err(|err| {
            warn!("unable to start sftp subsystem: {err}");
            Error::Subsystem
        })?;
        info!("sftp subsystem started");

        Ok(Self {
            handle,
            sftp,
            chunk_size: config.chunk_size(),
        })
    }
}

async fn transport(
    address: &str,
    port: u16,
    config: &Config,
) -> SessionResult<client::Handle<ClientHandler>> {
    let addr = net::lookup_host((address, port))
        .await?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address found"))?;

    let ssh_config = client::Config {
        inactivity_timeout: None,
        keepalive_interval: config.keepalive_interval(),
        ..Default::default()
    };

    Ok(client::connect(Arc::new(ssh_config), addr, ClientHandler).await?)
}

async fn subsystem(
    handle: &client::Handle<ClientHandler>,
    config: &Config,
) -> SessionResult<SftpSession> {
    let channel = handle.channel_open_session().await?;
    channel.request_subsystem(true, "sftp").await?;

    let sftp_config = russh_sftp::client::Config {
        request_timeout_secs: config.request_timeout_secs,
        ..Default::default()
    };
    Ok(SftpSession::new_with_config(channel.into_stream(), sftp_config).await?)
}

fn raw_entry(name: String, metadata: &Metadata) -> RawEntry {
    RawEntry {
        name,
        is_dir: metadata.is_dir(),
        size: metadata.size,
        modified: metadata.mtime,
        created: None,
    }
}

fn byte_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[async_trait]
impl Session for SshSession {
    async fn list(&mut self, path: &str) -> SessionResult<Vec<RawEntry>> {
        Ok(self
            .sftp
            .read_dir(path)
            .await?
            .map(|entry| raw_entry(entry.file_name(), &entry.metadata()))
            .collect())
    }

    async fn stat(&mut self, path: &str) -> SessionResult<RawEntry> {
        let metadata = self.sftp.metadata(path).await?;
        Ok(raw_entry(path::file_name(path).to_owned(), &metadata))
    }

    async fn read_file(
        &mut self,
        path: &str,
        on_progress: OnProgress<'_>,
    ) -> SessionResult<Bytes> {
        let mut file = self.sftp.open(path).await?;
        let total = file.metadata().await?.size.unwrap_or(0);
        if !on_progress(0, total) {
            return Err(SessionError::Cancelled);
        }

        let mut data = BytesMut::new();
        let mut chunk = vec![0; self.chunk_size];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }

            data.extend_from_slice(&chunk[..read]);

            let done = byte_count(data.len());
            if !on_progress(done, total.max(done)) {
                return Err(SessionError::Cancelled);
            }
        }

        Ok(data.freeze())
    }

    async fn write_file(&mut self, local: &Path, remote: &str) -> SessionResult<()> {
        let mut source = fs::File::open(local).await?;
        let mut file = self.sftp.create(remote).await?;

        // `remote` exists from here on, possibly truncated.
        let copied: io::Result<u64> = async {
            let written = tokio::io::copy(&mut source, &mut file).await?;
            file.shutdown().await?;
            Ok(written)
        }
        .await;

        let written = copied.map_err(|err| SessionError::from(err).interrupted())?;
        debug!("wrote {written} bytes to {remote}");
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> SessionResult<()> {
        Ok(self.sftp.rename(from, to).await?)
    }

    async fn mkdir(&mut self, path: &str) -> SessionResult<()> {
        Ok(self.sftp.create_dir(path).await?)
    }

    async fn remove_file(&mut self, path: &str) -> SessionResult<()> {
        Ok(self.sftp.remove_file(path).await?)
    }

    async fn remove_dir(&mut self, path: &str) -> SessionResult<()> {
        Ok(self.sftp.remove_dir(path).await?)
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.sftp.close().await?;
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await?;
        info!("sftp session closed");
        Ok(())
    }
}
