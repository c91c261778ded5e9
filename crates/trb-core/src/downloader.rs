//! Streaming HTTP GET downloader.
//!
//! Pulls a URL into a staging file under the storage root in bounded chunks,
//! feeding cumulative byte counts to a request-scoped progress tracker when
//! the server declares a total. A failed download removes its own partial
//! file; once a [`Download`] is returned, the artifact guard inside it makes
//! the orchestrator responsible for deletion.

use std::cell::{Cell, RefCell};
use std::io;
use std::str;
use std::time::Duration;
use thiserror::Error;

use crate::config::HttpOptions;
use crate::filename;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::storage::{LocalArtifact, StagingFile, StorageRoot};

/// Transfer buffer handed to libcurl; bounds per-chunk memory at 1 MiB.
pub const TRANSFER_BUFFER_BYTES: usize = 1024 * 1024;

/// Why a download failed. `Network` and `Http` mean the remote side;
/// `Storage` is local I/O.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("network error: {0}")]
    Network(#[from] curl::Error),
    #[error("server returned HTTP {0}")]
    Http(u32),
    /// Transfer ended with fewer bytes than the declared total (server
    /// closed early). The partial file is never treated as valid.
    #[error("partial transfer: got {received} of {expected} bytes")]
    PartialTransfer { expected: u64, received: u64 },
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),
}

/// A finished download, still under its staging name.
#[derive(Debug)]
pub struct Download {
    /// Drop guard owning the on-disk file.
    pub artifact: LocalArtifact,
    /// The derived (sanitized, extension-checked) file name.
    pub file_name: String,
    pub bytes_fetched: u64,
    /// Declared total, when the server sent a usable `Content-Length`.
    pub total_bytes: Option<u64>,
}

/// Streams `url` to a staging file named after the request.
///
/// The staging file is `<derived name>.<staging_token>.part` under the
/// storage root; `staging_token` keeps concurrent same-name transfers apart.
/// Progress reporting is skipped entirely when no total is known.
pub fn download(
    url: &str,
    desired_name: Option<&str>,
    storage: &StorageRoot,
    staging_token: &str,
    http: &HttpOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Download, DownloadError> {
    let file_name = filename::candidate_file_name(url, desired_name);
    let staging_path = storage.staging_path(&file_name, staging_token);
    let mut staging = StagingFile::create(&staging_path)?;
    tracing::debug!(file = %file_name, staging = %staging_path.display(), "download starting");

    let total: Cell<Option<u64>> = Cell::new(None);
    let storage_err: RefCell<Option<io::Error>> = RefCell::new(None);
    let mut tracker = ProgressTracker::new();
    let mut fetched: u64 = 0;
    let mut announced = false;

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.buffer_size(TRANSFER_BUFFER_BYTES)?;
    easy.connect_timeout(Duration::from_secs(http.connect_timeout_secs))?;
    easy.timeout(Duration::from_secs(http.request_timeout_secs))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(http.stall_timeout_secs))?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Ok(line) = str::from_utf8(line) {
                let line = line.trim();
                if line.starts_with("HTTP/") {
                    // New response head (redirect hop): the previous hop's
                    // length no longer applies.
                    total.set(None);
                } else if let Some(value) = header_value(line, "content-length") {
                    total.set(value.parse::<u64>().ok().filter(|n| *n > 0));
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            if !announced {
                announced = true;
                if let Some(size) = total.get() {
                    if let Err(err) = staging.preallocate(size) {
                        *storage_err.borrow_mut() = Some(err);
                        return Ok(0); // abort transfer
                    }
                }
                progress.started(&file_name, total.get());
            }
            if let Err(err) = staging.write_chunk(data) {
                tracing::warn!(error = %err, "staging write failed, aborting transfer");
                *storage_err.borrow_mut() = Some(err);
                return Ok(0); // abort transfer
            }
            fetched += data.len() as u64;
            if let Some(size) = total.get() {
                if let Some(update) = tracker.report(fetched, size) {
                    progress.progressed(&update);
                }
            }
            Ok(data.len())
        })?;
        transfer.perform().map_err(|e| {
            // A write abort surfaces from curl as a generic write error;
            // report the recorded storage cause instead.
            match storage_err.borrow_mut().take() {
                Some(io_err) => DownloadError::Storage(io_err),
                None => DownloadError::Network(e),
            }
        })?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        tracing::warn!(code, "download request rejected by server");
        return Err(DownloadError::Http(code));
    }

    let total_bytes = total.get();
    if let Some(expected) = total_bytes {
        if fetched != expected {
            return Err(DownloadError::PartialTransfer {
                expected,
                received: fetched,
            });
        }
    }

    progress.finished();
    let artifact = staging.finish()?;
    tracing::info!(file = %file_name, bytes = fetched, "download complete");
    Ok(Download {
        artifact,
        file_name,
        bytes_fetched: fetched,
        total_bytes,
    })
}

fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    if key.trim().eq_ignore_ascii_case(name) {
        Some(value.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_matches_case_insensitively() {
        assert_eq!(
            header_value("Content-Length: 1024", "content-length"),
            Some("1024")
        );
        assert_eq!(
            header_value("content-LENGTH:  7 ", "content-length"),
            Some("7")
        );
        assert_eq!(header_value("Content-Type: text/plain", "content-length"), None);
        assert_eq!(header_value("HTTP/1.1 200 OK", "content-length"), None);
    }
}
