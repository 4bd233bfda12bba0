//! Remote entities.
//!
//! [`RemoteItem`] values are only built by translating a [`RawEntry`] reported
//! by the server, see [`RemoteItem::from_entry`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::RawEntry;

/// Whether a remote path designates a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Folder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Size in bytes, `0` when the server does not report it
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFile {
    name: String,
    metadata: Metadata,
}

impl RemoteFile {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFolder {
    name: String,
    metadata: Metadata,
}

impl RemoteFolder {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// A file or folder found on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteItem {
    File(RemoteFile),
    Folder(RemoteFolder),
}

impl RemoteItem {
    /// Translates a raw server entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry has no name. Entries come from directory listings
    /// or from stat of a named path, so a nameless one means the backend is broken.
    #[must_use]
    pub fn from_entry(entry: RawEntry) -> Self {
        assert!(!entry.name.is_empty(), "item received with no file name");

        let metadata = Metadata {
            size: entry.size.unwrap_or(0),
            last_modified: entry.modified.and_then(from_unix),
            created: entry.created.and_then(from_unix),
        };

        if entry.is_dir {
            Self::Folder(RemoteFolder {
                name: entry.name,
                metadata,
            })
        } else {
            Self::File(RemoteFile {
                name: entry.name,
                metadata,
            })
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => file.name(),
            Self::Folder(folder) => folder.name(),
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        match self {
            Self::File(file) => file.metadata(),
            Self::Folder(folder) => folder.metadata(),
        }
    }

    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::File(_) => ItemType::File,
            Self::Folder(_) => ItemType::Folder,
        }
    }

    #[must_use]
    pub fn into_file(self) -> Option<RemoteFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Folder(_) => None,
        }
    }

    #[must_use]
    pub fn into_folder(self) -> Option<RemoteFolder> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::File(_) => None,
        }
    }
}

fn from_unix(secs: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::from(secs), 0)
}
