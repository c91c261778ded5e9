//! Transfer orchestration: resolve, download, rename, upload, clean up.
//!
//! One call handles one inbound request end to end. Every stage failure is
//! typed, and the local artifact is deleted on every exit path past the
//! download; the guard in [`crate::storage::LocalArtifact`] makes that a
//! structural guarantee rather than a convention.

use thiserror::Error;

use crate::config::{HttpOptions, RenameMode, TransferSettings, UploadType};
use crate::downloader::{self, DownloadError};
use crate::filename::{extension_suffix, sanitize_file_name};
use crate::progress::ProgressSink;
use crate::resolver::{BlobRef, BlobResolver, ResolutionError};
use crate::storage::{RenameError, StorageRoot};
use crate::upload::{UploadError, UploadSink};

/// An inbound user event at the transport boundary. The core accepts exactly
/// these two shapes; command parsing happens upstream.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A blob uploaded through the transport, with optional accompanying
    /// text (the user's requested output name).
    Blob {
        blob_id: String,
        display_name: Option<String>,
        trailing_text: Option<String>,
    },
    /// A plain text message, expected to carry a download link.
    Text { content: String },
}

/// The source half of a request: either a blob to resolve or a direct URL.
#[derive(Debug, Clone)]
pub enum SourceRef {
    Blob(BlobRef),
    Url(String),
}

/// A validated transfer request. Immutable; one per inbound event.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: SourceRef,
    pub requested_name: Option<String>,
}

/// The inbound event was not a usable transfer source.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("not a file or a download link")]
    UnsupportedSource,
}

impl TransferRequest {
    /// Classifies an inbound event.
    ///
    /// Text must lead with an `http(s)://` URL that parses; anything after
    /// the first whitespace run is the requested name. Everything that is
    /// neither a blob nor such a URL is rejected before the downloader ever
    /// sees it.
    pub fn from_event(event: InboundEvent) -> Result<Self, RequestError> {
        match event {
            InboundEvent::Blob {
                blob_id,
                display_name,
                trailing_text,
            } => Ok(Self {
                source: SourceRef::Blob(BlobRef {
                    id: blob_id,
                    display_name,
                }),
                requested_name: normalize_name(trailing_text),
            }),
            InboundEvent::Text { content } => {
                let trimmed = content.trim();
                let (first, rest) = match trimmed.split_once(char::is_whitespace) {
                    Some((first, rest)) => (first, Some(rest)),
                    None => (trimmed, None),
                };
                if !(first.starts_with("http://") || first.starts_with("https://"))
                    || url::Url::parse(first).is_err()
                {
                    return Err(RequestError::UnsupportedSource);
                }
                Ok(Self {
                    source: SourceRef::Url(first.to_string()),
                    requested_name: normalize_name(rest.map(str::to_string)),
                })
            }
        }
    }
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Stage-typed transfer failure.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("rename failed: {0}")]
    Rename(#[from] RenameError),
    #[error("{0}")]
    Upload(#[from] UploadError),
}

impl TransferError {
    /// Short human-readable message for the user channel. Never contains
    /// URLs, tokens, paths, or error chains; those go to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            TransferError::Resolution(_) => "Sorry, could not locate the file to fetch.",
            TransferError::Download(DownloadError::Storage(_)) => {
                "An unexpected error occurred while saving the file."
            }
            TransferError::Download(_) => "Sorry, could not download the file.",
            TransferError::Rename(RenameError::Collision(_)) => {
                "A file with that name already exists. Please try a different name."
            }
            TransferError::Rename(_) => "An unexpected error occurred while renaming the file.",
            TransferError::Upload(_) => "Error uploading the file. Please try again.",
        }
    }
}

/// A successful transfer.
#[derive(Debug)]
pub struct TransferOutcome {
    /// The name the file was uploaded under.
    pub file_name: String,
    pub bytes: u64,
}

/// Runs one transfer end to end.
///
/// `settings` is a snapshot taken once by the caller; the orchestration never
/// re-reads shared state mid-flight. `staging_token` is the per-request
/// uniqueness marker for the staging name. Cleanup of the local artifact is
/// unconditional on every path past a successful download.
#[allow(clippy::too_many_arguments)]
pub fn run_transfer(
    request: &TransferRequest,
    settings: &TransferSettings,
    resolver: &dyn BlobResolver,
    storage: &StorageRoot,
    http: &HttpOptions,
    sink: &dyn UploadSink,
    progress: &mut dyn ProgressSink,
    staging_token: &str,
) -> Result<TransferOutcome, TransferError> {
    let url = match &request.source {
        SourceRef::Url(url) => url.clone(),
        SourceRef::Blob(blob) => resolver.resolve(blob)?,
    };

    let download = downloader::download(
        &url,
        request.requested_name.as_deref(),
        storage,
        staging_token,
        http,
        progress,
    )?;
    let mut artifact = download.artifact;

    let final_name = final_file_name(settings, request.requested_name.as_deref(), &download.file_name);
    artifact.rename_to(&storage.final_path(&final_name))?;

    match settings.upload_type {
        UploadType::Media => sink.send_document(&final_name, artifact.path())?,
    }

    tracing::info!(file = %final_name, bytes = download.bytes_fetched, "transfer complete");
    Ok(TransferOutcome {
        file_name: final_name,
        bytes: download.bytes_fetched,
    })
    // `artifact` drops here: the uploaded copy is removed from local storage.
}

/// Computes the final name from one settings snapshot.
///
/// Manual mode prefers the sanitized requested name and re-appends the staged
/// file's extension when the chosen name dropped it, so a user-picked name
/// cannot strip the real type. Auto mode wraps the staged name in the
/// configured prefix/suffix (the suffix lands after the extension).
pub fn final_file_name(
    settings: &TransferSettings,
    requested_name: Option<&str>,
    staged_name: &str,
) -> String {
    match settings.rename_mode {
        RenameMode::Manual => {
            let mut name = requested_name
                .map(sanitize_file_name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| sanitize_file_name(staged_name));
            if let Some(ext) = extension_suffix(staged_name) {
                if !name.to_ascii_lowercase().ends_with(&ext.to_ascii_lowercase()) {
                    name.push_str(ext);
                }
            }
            name
        }
        RenameMode::Auto => format!(
            "{}{}{}",
            settings.prefix,
            sanitize_file_name(staged_name),
            settings.suffix
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: RenameMode, prefix: &str, suffix: &str) -> TransferSettings {
        TransferSettings {
            rename_mode: mode,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            upload_type: UploadType::Media,
        }
    }

    #[test]
    fn manual_prefers_requested_name() {
        let s = settings(RenameMode::Manual, "", "");
        assert_eq!(
            final_file_name(&s, Some("report.pdf"), "report.pdf"),
            "report.pdf"
        );
    }

    #[test]
    fn manual_reappends_staged_extension() {
        let s = settings(RenameMode::Manual, "", "");
        assert_eq!(final_file_name(&s, Some("report"), "data.pdf"), "report.pdf");
        assert_eq!(
            final_file_name(&s, Some("REPORT.PDF"), "data.pdf"),
            "REPORT.PDF"
        );
    }

    #[test]
    fn manual_without_request_keeps_staged_name() {
        let s = settings(RenameMode::Manual, "", "");
        assert_eq!(final_file_name(&s, None, "photo.jpg"), "photo.jpg");
    }

    #[test]
    fn manual_sanitizes_requested_name() {
        let s = settings(RenameMode::Manual, "", "");
        assert_eq!(
            final_file_name(&s, Some("my/rep|ort.pdf"), "data.pdf"),
            "myreport.pdf"
        );
    }

    #[test]
    fn manual_empty_requested_name_falls_back() {
        let s = settings(RenameMode::Manual, "", "");
        assert_eq!(final_file_name(&s, Some("???"), "data.pdf"), "data.pdf");
    }

    #[test]
    fn auto_wraps_in_prefix_and_suffix() {
        let s = settings(RenameMode::Auto, "pre_", "_v2");
        assert_eq!(final_file_name(&s, None, "photo.jpg"), "pre_photo.jpg_v2");
        // A requested name is ignored in auto mode.
        assert_eq!(
            final_file_name(&s, Some("ignored.png"), "photo.jpg"),
            "pre_photo.jpg_v2"
        );
    }

    #[test]
    fn auto_with_empty_affixes_is_identity() {
        let s = settings(RenameMode::Auto, "", "");
        assert_eq!(final_file_name(&s, None, "photo.jpg"), "photo.jpg");
    }

    #[test]
    fn event_text_url_and_name() {
        let request = TransferRequest::from_event(InboundEvent::Text {
            content: "https://host/data.bin report.pdf".to_string(),
        })
        .unwrap();
        match &request.source {
            SourceRef::Url(url) => assert_eq!(url, "https://host/data.bin"),
            other => panic!("expected URL source, got {:?}", other),
        }
        assert_eq!(request.requested_name.as_deref(), Some("report.pdf"));
    }

    #[test]
    fn event_text_url_only() {
        let request = TransferRequest::from_event(InboundEvent::Text {
            content: "https://host/data.bin".to_string(),
        })
        .unwrap();
        assert!(request.requested_name.is_none());
    }

    #[test]
    fn event_text_rejects_non_urls() {
        for content in ["hello there", "ftp://host/file", "https://"] {
            let result = TransferRequest::from_event(InboundEvent::Text {
                content: content.to_string(),
            });
            assert!(result.is_err(), "{:?} should be rejected", content);
        }
    }

    #[test]
    fn event_blob_carries_trailing_text_as_name() {
        let request = TransferRequest::from_event(InboundEvent::Blob {
            blob_id: "abc123".to_string(),
            display_name: Some("original.pdf".to_string()),
            trailing_text: Some("  renamed.pdf ".to_string()),
        })
        .unwrap();
        match &request.source {
            SourceRef::Blob(blob) => assert_eq!(blob.id, "abc123"),
            other => panic!("expected blob source, got {:?}", other),
        }
        assert_eq!(request.requested_name.as_deref(), Some("renamed.pdf"));
    }

    #[test]
    fn event_blob_blank_trailing_text_is_no_name() {
        let request = TransferRequest::from_event(InboundEvent::Blob {
            blob_id: "abc123".to_string(),
            display_name: None,
            trailing_text: Some("   ".to_string()),
        })
        .unwrap();
        assert!(request.requested_name.is_none());
    }
}
