//! Extension policy: which suffixes a staged file may keep as-is.
//!
//! Anything outside the table is staged with a `.txt` suffix appended so the
//! receiving side never has to guess at unknown content.

/// Extensions accepted without modification (image, document, audio, video,
/// archive, and text types). Matched case-insensitively.
pub const KNOWN_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "pdf", "txt", "mp4", "avi", "mkv", "mov", "mp3", "wav", "ogg", "zip",
    "rar", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

/// Suffix appended to names that miss the allow-list.
pub const FALLBACK_EXTENSION: &str = "txt";

/// True if `name` ends in one of [`KNOWN_EXTENSIONS`] (case-insensitive).
pub fn has_known_extension(name: &str) -> bool {
    match extension_suffix(name) {
        Some(suffix) => {
            let ext = suffix[1..].to_ascii_lowercase();
            KNOWN_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Returns `name` unchanged if its extension is allow-listed, otherwise
/// appends `.txt`.
pub fn ensure_known_extension(name: String) -> String {
    if has_known_extension(&name) {
        name
    } else {
        format!("{}.{}", name, FALLBACK_EXTENSION)
    }
}

/// The final `.ext` suffix of `name`, dot included.
///
/// A leading dot (hidden file) or trailing dot does not count as an
/// extension; `a.tar.gz` yields `.gz`.
pub fn extension_suffix(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot + 1 == name.len() {
        return None;
    }
    Some(&name[dot..])
}
