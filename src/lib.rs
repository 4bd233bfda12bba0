//! Serialized SFTP connection for generic file browsers.
//!
//! [`SftpConnection`] owns one authenticated session and runs every remote
//! operation on it one at a time. Results are translated into [`RemoteItem`]s
//! and failures into the flat [`Error`] set.

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod config;
mod connection;
mod error;
mod item;
pub mod path;
mod progress;
mod properties;
/// Session adapter
pub mod session;

pub use config::Config;
pub use connection::{Download, Pending, SftpConnection};
pub use error::{Error, Result, Step};
pub use item::{ItemType, Metadata, RemoteFile, RemoteFolder, RemoteItem};
pub use progress::Progress;
pub use properties::ServerConnectionProperties;
