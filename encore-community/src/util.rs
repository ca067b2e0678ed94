use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

lazy_static! {
    static ref SCRIPT_TAG: Regex = Regex::new(r"(?i)</?script[^>]*>").expect("regex is valid");
}

/// Strips script tags and control characters from user-supplied text,
/// then trims surrounding whitespace
pub fn sanitize_text(text: &str) -> String {
    let without_tags = SCRIPT_TAG.replace_all(text, "");

    without_tags
        .chars()
        .filter(|c| !matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Truncates to at most `max` characters, not bytes
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Creates a new opaque session token
pub fn session_token() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sanitize_strips_script_tags() {
        assert_eq!(
            sanitize_text("hello <script>alert(1)</script>world"),
            "hello alert(1)world"
        );
        assert_eq!(sanitize_text("<SCRIPT src=\"x\">"), "");
    }

    #[test]
    fn sanitize_strips_control_characters_and_trims() {
        assert_eq!(sanitize_text("  a\u{0000}b\u{001F}c\u{007F}  "), "abc");
        assert_eq!(sanitize_text("line\none"), "lineone");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn tokens_are_uuid_shaped() {
        let token = session_token();

        assert_eq!(token.len(), 36);
        assert_ne!(token, session_token());
    }
}
