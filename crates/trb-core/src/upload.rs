//! Upload sink boundary.
//!
//! The core hands a finished local file and its final name to whatever
//! transport implements [`UploadSink`]; only the binary-document sink exists.

use std::path::Path;
use thiserror::Error;

/// Upload failure, reported to the user distinctly from download failure.
#[derive(Debug, Error)]
#[error("upload failed: {0:#}")]
pub struct UploadError(pub anyhow::Error);

impl UploadError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }
}

/// Delivers a finished file back to the requester.
pub trait UploadSink {
    /// Sends the file at `path` under the display name `file_name`.
    fn send_document(&self, file_name: &str, path: &Path) -> Result<(), UploadError>;
}
