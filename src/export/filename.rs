use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_EXPORT_FILENAME: &str = "code-snippet.png";

// Invalid on Windows: < > : " / \ | ? * plus control characters
static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("valid regex"));
static RESERVED_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])(\.png)?$").expect("valid regex")
});

const MAX_STEM_LEN: usize = 200;

/// Turn a configured download name into a safe `.png` file name.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized = INVALID_CHARS.replace_all(name, "_");
    let trimmed = sanitized.trim_matches(|c| c == ' ' || c == '.');

    let stem = trimmed
        .strip_suffix(".png")
        .or_else(|| trimmed.strip_suffix(".PNG"))
        .unwrap_or(trimmed)
        .trim_end_matches(|c| c == ' ' || c == '.');
    if stem.is_empty() {
        return DEFAULT_EXPORT_FILENAME.to_string();
    }

    let stem = truncate_on_char_boundary(stem, MAX_STEM_LEN);
    let name = format!("{stem}.png");
    if RESERVED_NAMES.is_match(&name) {
        format!("_{name}")
    } else {
        name
    }
}

fn truncate_on_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_filename("code-snippet.png"), "code-snippet.png");
        assert_eq!(sanitize_filename("Snippet: A"), "Snippet_ A.png");
        assert_eq!(sanitize_filename("a/b.png"), "a_b.png");
        assert_eq!(sanitize_filename("a\\b"), "a_b.png");
        assert_eq!(sanitize_filename("a|b"), "a_b.png");
    }

    #[test]
    fn test_sanitize_special_chars() {
        assert_eq!(sanitize_filename("x<>y"), "x__y.png");
        assert_eq!(sanitize_filename("x?*y"), "x__y.png");
        assert_eq!(sanitize_filename("x\"y"), "x_y.png");
    }

    #[test]
    fn test_sanitize_reserved() {
        assert_eq!(sanitize_filename("CON"), "_CON.png");
        assert_eq!(sanitize_filename("con.png"), "_con.png");
        assert_eq!(sanitize_filename("LPT9"), "_LPT9.png");
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_default() {
        assert_eq!(sanitize_filename(""), DEFAULT_EXPORT_FILENAME);
        assert_eq!(sanitize_filename("..."), DEFAULT_EXPORT_FILENAME);
        assert_eq!(sanitize_filename(" . "), DEFAULT_EXPORT_FILENAME);
        assert_eq!(sanitize_filename(".png"), DEFAULT_EXPORT_FILENAME);
    }

    #[test]
    fn test_sanitize_keeps_uppercase_extension_once() {
        assert_eq!(sanitize_filename("Shot.PNG"), "Shot.png");
    }

    #[test]
    fn test_sanitize_long_name() {
        let result = sanitize_filename(&"a".repeat(250));
        assert_eq!(result.len(), MAX_STEM_LEN + 4);
        assert!(result.ends_with(".png"));
    }

    #[test]
    fn test_sanitize_long_multibyte_name() {
        let result = sanitize_filename(&"日".repeat(100));
        assert!(result.ends_with(".png"));
        assert!(result.len() <= MAX_STEM_LEN + 4);
    }

    #[test]
    fn test_sanitize_control_chars() {
        assert_eq!(sanitize_filename("a\x00b"), "a_b.png");
    }
}
