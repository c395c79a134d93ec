//! Session-scoped scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::ArchiveError;
use crate::unpack::{UnpackReport, Unpacker};

const SCRATCH_PREFIX: &str = "atlog-";

/// One archive's processing context, bound to its own scratch directory.
///
/// The directory is removed when the session is dropped, on every exit
/// path, unless [`Session::keep`] is called.
#[derive(Debug)]
pub struct Session {
    dir: TempDir,
}

impl Session {
    /// Create a scratch directory under `scratch_root`, or the system temp dir.
    pub fn new(scratch_root: Option<&Path>) -> Result<Self, ArchiveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(ArchiveError::io(root))?;
                builder.tempdir_in(root).map_err(ArchiveError::io(root))?
            }
            None => builder
                .tempdir()
                .map_err(ArchiveError::io(std::env::temp_dir()))?,
        };
        debug!(path = %dir.path().display(), "session scratch created");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Unpack an archive into this session's scratch directory.
    pub fn unpack(&self, unpacker: &Unpacker, archive: &[u8]) -> Result<UnpackReport, ArchiveError> {
        unpacker.unpack(archive, self.path())
    }

    /// Keep the scratch directory on disk and return its path.
    #[must_use]
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}
