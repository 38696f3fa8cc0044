//! smugline - sync local media folders with SmugMug albums
//!
//! This library provides functionality for:
//! - MD5 content hashing with bounded memory use
//! - Media discovery by file extension
//! - Content-based duplicate detection against remote albums
//! - Album lookup and creation
//! - Uploads with bounded retry and idempotent downloads
//! - Batch uploads driven by a JSON manifest

pub mod album;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod hash;
pub mod model;
pub mod process;
pub mod remote;
pub mod transfer;

pub use album::AlbumResolver;
pub use cli::{Cli, Command};
pub use config::{Config, ConfigError, MediaFilter, Privacy};
pub use error::{Error, Result};
pub use hash::ContentHasher;
pub use model::{Album, LocalItem, RemoteItem, Session};
pub use process::{FileResult, ProcessingStats, ProcessingStatus, Processor};
pub use remote::{RemoteApi, SmugMugClient};
pub use transfer::{RetryPolicy, TransferEngine};
