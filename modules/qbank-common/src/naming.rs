//! Pure helpers for deriving stable names and keys from scraped content.
//! No I/O: these are the functions the orchestrator, archiver, and media
//! relocator all share so their naming stays in lock-step.

/// Normalize a site hint into a URL-safe slug: lowercase, strip non-alphanumeric
/// (keeping spaces), collapse whitespace, replace spaces with hyphens.
///
/// ```
/// assert_eq!(qbank_common::naming::slugify("Question Bank Pro"), "question-bank-pro");
/// assert_eq!(qbank_common::naming::slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join("-")
}

/// Derive the catalog `Source.name` from the userscript's site hint.
pub fn normalize_source_name(site_hint: &str) -> String {
    let slug = slugify(site_hint.trim());
    if slug.is_empty() {
        "unknown-source".to_string()
    } else {
        slug
    }
}

/// Take the last non-empty path component of a URL, ignoring query string and
/// fragment. Returns `None` if the URL has no usable path segment.
pub fn extract_last_path_segment(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);

    let after_scheme = without_query
        .strip_prefix("https://")
        .or_else(|| without_query.strip_prefix("http://"))
        .unwrap_or(without_query);

    // Drop the host, keep only the path.
    let path = match after_scheme.find('/') {
        Some(idx) => &after_scheme[idx + 1..],
        None => "",
    };

    path.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|s| s.to_string())
}

/// FNV-1a 64-bit hash, used to derive a fallback business key when a URL has
/// no usable path segment, and to compare archived vs. relocated media bytes
/// without re-reading both files byte-by-byte on every call.
pub fn content_hash(bytes: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derive the `source_question_key` for an extraction: the last path segment
/// of the origin URL, or a content-hash fallback when the URL is unusable
/// (empty path, or not a URL at all).
pub fn derive_source_question_key(origin_url: &str, raw_html: &str) -> String {
    extract_last_path_segment(origin_url)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("hash-{:016x}", content_hash(raw_html.as_bytes())))
}

/// Infer a file extension from a declared MIME type, falling back to `bin`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_whitespace_and_punctuation() {
        assert_eq!(slugify("Question Bank Pro!"), "question-bank-pro");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }

    #[test]
    fn last_path_segment_ignores_query_and_fragment() {
        assert_eq!(
            extract_last_path_segment("https://ex.com/bank/q008?ref=x#top"),
            Some("q008".to_string())
        );
    }

    #[test]
    fn last_path_segment_none_for_empty_path() {
        assert_eq!(extract_last_path_segment("https://ex.com"), None);
        assert_eq!(extract_last_path_segment("https://ex.com/"), None);
    }

    #[test]
    fn fallback_key_is_deterministic_for_same_html() {
        let a = derive_source_question_key("https://ex.com/", "<html>same</html>");
        let b = derive_source_question_key("https://ex.com/", "<html>same</html>");
        assert_eq!(a, b);
        assert!(a.starts_with("hash-"));
    }

    #[test]
    fn fallback_key_differs_for_different_html() {
        let a = derive_source_question_key("https://ex.com/", "<html>a</html>");
        let b = derive_source_question_key("https://ex.com/", "<html>b</html>");
        assert_ne!(a, b);
    }
}
