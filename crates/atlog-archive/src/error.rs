//! Archive error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end an unpack or scan pass.
///
/// Problems inside nested archives or single entries are recovered locally
/// and reported through [`crate::UnpackReport`] instead.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The root archive (or its central directory) cannot be read.
    #[error("unreadable archive: {reason}")]
    UnreadableArchive { reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive processing cancelled")]
    Cancelled,

    #[error("invalid glob '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Container-level ZIP failures: the archive as a whole cannot be indexed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("end of central directory record not found")]
    NoEndOfCentralDirectory,

    #[error("multi-disk archives are not supported")]
    MultiDisk,

    #[error("zip64 archives are not supported")]
    Zip64,

    #[error("central directory lies outside the archive")]
    CentralDirectoryOutOfBounds,

    #[error("central directory truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("bad central directory header at offset {offset}")]
    BadCentralHeader { offset: usize },
}

/// Entry-level failures: one entry cannot be decompressed, the rest can.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry is encrypted")]
    Encrypted,

    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u16),

    #[error("local file header not found")]
    MissingLocalHeader,

    #[error("entry data truncated")]
    Truncated,

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("crc mismatch: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },
}
