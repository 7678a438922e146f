//! Filesystem-safe names

/// Replace every character outside `[A-Za-z0-9-]` with `_`.
///
/// Not injective on its own; cache filenames pair it with a content hash.
pub fn sanitize_string(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_string("https://example.com/foo-1.2.tar.gz"),
            "https___example_com_foo-1_2_tar_gz"
        );
    }

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_string("abc-XYZ-019"), "abc-XYZ-019");
    }

    #[test]
    fn test_sanitize_non_ascii() {
        assert_eq!(sanitize_string("ü/ä"), "___");
    }
}
