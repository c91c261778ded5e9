//! File-name derivation for incoming transfers.
//!
//! Builds a filesystem-safe candidate name from the user's requested name or
//! the URL path, with a conservative extension policy for unknown content.

mod extension;
mod path;
mod sanitize;

pub use extension::{ensure_known_extension, extension_suffix, has_known_extension, KNOWN_EXTENSIONS};
pub use path::file_name_from_url;
pub use sanitize::sanitize_file_name;

/// Placeholder used when neither the request nor the URL yields a usable name.
pub const DEFAULT_FILE_NAME: &str = "downloaded_file";

/// Derives the name a download is staged under.
///
/// A requested name wins over the URL's final path segment; both are
/// sanitized, and an empty result falls back to [`DEFAULT_FILE_NAME`].
/// Names without an allow-listed extension get `.txt` appended so unknown
/// content is never handed on with an ambiguous type.
pub fn candidate_file_name(url: &str, desired: Option<&str>) -> String {
    let name = match desired {
        Some(d) => sanitize_file_name(d),
        None => file_name_from_url(url)
            .map(|segment| sanitize_file_name(&segment))
            .unwrap_or_default(),
    };
    let name = if name.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        name
    };
    ensure_known_extension(name)
}
