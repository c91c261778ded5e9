//! Local storage lifecycle: staging files, the finished artifact, and the
//! guarantee that nothing outlives its transfer.
//!
//! A download is written to `<name>.<token>.part` under the storage root,
//! then atomically renamed to its final name. Both forms are drop guards:
//! an unfinished [`StagingFile`] removes its partial file, and a
//! [`LocalArtifact`] removes the file at whatever path it currently has,
//! so every exit path of a transfer deletes the local copy.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Suffix marking an in-progress staging file.
pub const STAGING_SUFFIX: &str = ".part";

/// The directory all transfers stage and finish in.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    dir: PathBuf,
}

impl StorageRoot {
    /// Opens the storage root, creating the directory if absent.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create storage root: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staging path for `file_name`; `token` is a per-request uniqueness
    /// marker so concurrent transfers deriving the same name never share a
    /// staging file.
    pub fn staging_path(&self, file_name: &str, token: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}{}", file_name, token, STAGING_SUFFIX))
    }

    /// Final (post-rename) path for `file_name`.
    pub fn final_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Why a rename to the final name failed.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The destination name is already taken. Never overwritten.
    #[error("destination file already exists: {0}")]
    Collision(String),
    #[error("rename failed: {0}")]
    Io(#[from] io::Error),
}

/// A staging file being written. Dropping it unfinished removes the partial
/// file, so a failed download leaves nothing behind.
#[derive(Debug)]
pub struct StagingFile {
    file: Option<File>,
    path: PathBuf,
    finished: bool,
}

impl StagingFile {
    /// Creates the staging file. Fails if the path already exists; a live
    /// staging file must never be silently truncated by a second transfer.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options().write(true).create_new(true).open(path)?;
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            finished: false,
        })
    }

    /// Preallocates `size` bytes. On Unix tries `posix_fallocate` for real
    /// block allocation, falling back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> io::Result<()> {
        let Some(file) = self.file.as_ref() else {
            return Err(io::Error::other("staging file already finished"));
        };
        #[cfg(unix)]
        {
            let fd = file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        file.set_len(size)
    }

    /// Appends one chunk.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("staging file already finished"));
        };
        file.write_all(data)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Syncs and closes the file, handing ownership of the on-disk artifact
    /// to a [`LocalArtifact`] guard.
    pub fn finish(mut self) -> io::Result<LocalArtifact> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        self.finished = true;
        Ok(LocalArtifact {
            path: self.path.clone(),
        })
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.file.take();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove partial staging file"
                );
            }
        }
    }
}

/// A completed local file, staged or renamed. Deleted on drop; the transfer
/// that produced it must not leak it past its own lifetime.
#[derive(Debug)]
pub struct LocalArtifact {
    path: PathBuf,
}

impl LocalArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically moves the artifact to `dest`. An existing destination is a
    /// collision, reported instead of overwritten; on failure the guard keeps
    /// tracking the old path.
    pub fn rename_to(&mut self, dest: &Path) -> Result<(), RenameError> {
        if dest.exists() {
            let name = dest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dest.display().to_string());
            return Err(RenameError::Collision(name));
        }
        fs::rename(&self.path, dest)?;
        self.path = dest.to_path_buf();
        Ok(())
    }
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::error!(
                    path = %self.path.display(),
                    error = %err,
                    "local artifact not deleted; manual cleanup required"
                );
            }
        }
    }
}
