//! Resolution of transport-native blob references into fetchable URLs.
//!
//! The downloader only depends on the [`BlobResolver`] trait; the shipped
//! implementation asks the Bot API's `getFile` endpoint for the blob's
//! relative path and builds the file-download URL from it. Direct URLs never
//! pass through here.

use serde::Deserialize;
use std::cell::RefCell;
use std::time::Duration;
use thiserror::Error;

use crate::config::HttpOptions;

/// Reference to a blob the user uploaded through the transport.
#[derive(Debug, Clone)]
pub struct BlobRef {
    /// Transport-assigned blob identifier.
    pub id: String,
    /// Name the transport displayed for the blob, if any. Carried for
    /// diagnostics; naming uses the resolved URL path.
    pub display_name: Option<String>,
}

/// Why a blob could not be resolved to a URL. Callers must not attempt a
/// download after any of these.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("file-location lookup failed: {0}")]
    Transport(#[from] curl::Error),
    #[error("file-location lookup returned HTTP {0}")]
    Http(u32),
    #[error("malformed file-location response: {0}")]
    Malformed(String),
    #[error("file-location lookup rejected: {0}")]
    Rejected(String),
}

/// Turns a blob reference into a direct download URL.
pub trait BlobResolver {
    fn resolve(&self, blob: &BlobRef) -> Result<String, ResolutionError>;
}

/// Envelope returned by the metadata API. Minimal structure, unknown fields
/// ignored.
#[derive(Debug, Deserialize)]
struct FileLookupResponse {
    ok: bool,
    #[serde(default)]
    result: Option<FileLocation>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileLocation {
    file_path: String,
}

/// Resolver backed by the Bot API `getFile` endpoint.
#[derive(Debug, Clone)]
pub struct FileApiResolver {
    api_base: String,
    token: String,
    http: HttpOptions,
}

impl FileApiResolver {
    pub fn new(api_base: &str, token: &str, http: HttpOptions) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    fn lookup_url(&self, easy: &mut curl::easy::Easy, blob_id: &str) -> String {
        format!(
            "{}/bot{}/getFile?file_id={}",
            self.api_base,
            self.token,
            easy.url_encode(blob_id.as_bytes())
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_base,
            self.token,
            file_path.trim_start_matches('/')
        )
    }
}

impl BlobResolver for FileApiResolver {
    fn resolve(&self, blob: &BlobRef) -> Result<String, ResolutionError> {
        let body = RefCell::new(Vec::new());

        let mut easy = curl::easy::Easy::new();
        let url = self.lookup_url(&mut easy, &blob.id);
        easy.url(&url)?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        easy.timeout(Duration::from_secs(self.http.request_timeout_secs.min(60)))?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.borrow_mut().extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(ResolutionError::Http(code));
        }

        let body = body.into_inner();
        let response: FileLookupResponse =
            serde_json::from_slice(&body).map_err(|e| ResolutionError::Malformed(e.to_string()))?;
        if !response.ok {
            return Err(ResolutionError::Rejected(
                response
                    .description
                    .unwrap_or_else(|| "lookup was not ok".to_string()),
            ));
        }
        let location = response
            .result
            .ok_or_else(|| ResolutionError::Malformed("missing result.file_path".to_string()))?;

        tracing::debug!(
            blob = %blob.id,
            display_name = blob.display_name.as_deref().unwrap_or("<none>"),
            file_path = %location.file_path,
            "blob resolved"
        );
        Ok(self.file_url(&location.file_path))
    }
}
