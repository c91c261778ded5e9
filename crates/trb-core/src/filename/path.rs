//! File-name hint from a URL path.

/// Extracts the final path segment of `url` as a file-name hint.
///
/// Returns `None` when the URL does not parse, the path is empty or root,
/// or the segment is a relative-path marker.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment() {
        assert_eq!(
            file_name_from_url("https://example.com/a/b/file.pdf").as_deref(),
            Some("file.pdf")
        );
        assert_eq!(
            file_name_from_url("https://example.com/single").as_deref(),
            Some("single")
        );
    }

    #[test]
    fn root_or_empty_path() {
        assert_eq!(file_name_from_url("https://example.com/"), None);
        assert_eq!(file_name_from_url("https://example.com"), None);
        assert_eq!(file_name_from_url("not a url"), None);
    }

    #[test]
    fn query_is_ignored() {
        assert_eq!(
            file_name_from_url("https://example.com/file.zip?token=abc").as_deref(),
            Some("file.zip")
        );
    }

    #[test]
    fn trailing_slash_uses_previous_segment() {
        assert_eq!(
            file_name_from_url("https://example.com/dir/file.txt/").as_deref(),
            Some("file.txt")
        );
    }
}
