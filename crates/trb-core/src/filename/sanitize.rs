//! Filesystem-safe name sanitization.

/// Longest name the sanitizer will return, in characters. Keeps full paths
/// under common 255-char limits with room for a storage-root prefix.
const MAX_NAME_CHARS: usize = 200;

/// Strips reserved and control characters from a candidate file name and
/// bounds its length.
///
/// Removes `< > : " / \ | ? *` and control characters outright rather than
/// replacing them; the result may therefore be empty, and callers supply
/// their own placeholder in that case. Never invents content.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !is_reserved(*c) && !c.is_control())
        .take(MAX_NAME_CHARS)
        .collect()
}

fn is_reserved(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}
