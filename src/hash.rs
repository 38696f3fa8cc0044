//! MD5 content digests for duplicate detection
//!
//! The remote service reports an MD5 sum per stored image, so local files
//! are hashed with the same algorithm and compared as lowercase hex strings.
//! Files are streamed in fixed-size blocks, which keeps memory flat no
//! matter how large a video gets.

use crate::error::{Error, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::trace;

/// Default block size for streaming reads (1MB)
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Computes content digests of local files
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    block_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}

impl ContentHasher {
    /// Create a hasher reading `block_size` bytes at a time (at least 1)
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.max(1),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Compute the digest of the file at `path`
    ///
    /// Fails with [`Error::Io`] when the file cannot be opened and with
    /// [`Error::HashComputation`] when reading breaks off mid-stream.
    pub fn digest(&self, path: &Path) -> Result<String> {
        let mut file = File::open(path)?;
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(Error::HashComputation {
                        path: path.to_path_buf(),
                        message: format!("Failed to read file: {}", e),
                    });
                }
            };
            hasher.update(&buffer[..bytes_read]);
        }

        let digest = to_hex(&hasher.finalize());
        trace!(?path, %digest, "Computed file digest");
        Ok(digest)
    }
}

/// Digest of an in-memory buffer, same format as [`ContentHasher::digest`]
pub fn digest_bytes(data: &[u8]) -> String {
    to_hex(&Md5::digest(data))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
