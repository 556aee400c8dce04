use snipview::escape::escape_markup;
use snipview::lines::{render_lines, split_markup};
use snipview::markup::highlight_markup;
use snipview::syntax_highlighter::KEYWORDS;

#[test]
fn escaping_without_angle_brackets_is_identity() {
    for text in ["", "plain text", "a && b || c", "\"q\" 'c' \t\n"] {
        assert_eq!(escape_markup(text), text);
    }
}

#[test]
fn line_count_matches_newline_segments() {
    for source in [
        "",
        "one",
        "one\n",
        "a\n\nb",
        "/* multi\nline\ncomment */\nint x;",
        "String s = \"unterminated\nnext\";\n\n",
        "x\r\ny\r\n",
    ] {
        let expected = source.split('\n').count();
        assert_eq!(render_lines(source).len(), expected, "{source:?}");
        assert_eq!(split_markup(&highlight_markup(source)).len(), expected, "{source:?}");
    }
}

#[test]
fn standalone_keywords_are_emphasized_substrings_are_not() {
    for keyword in KEYWORDS {
        let standalone = highlight_markup(&format!("x {keyword} y"));
        assert!(
            standalone.contains(&format!(r#"<span class="hl-keyword">{keyword}</span>"#)),
            "{keyword} should be emphasized: {standalone}"
        );

        let embedded = highlight_markup(&format!("x {keyword}room y"));
        assert!(
            !embedded.contains("hl-keyword"),
            "{keyword}room should not be emphasized: {embedded}"
        );
    }
}

#[test]
fn markup_never_leaks_raw_angle_brackets_from_source() {
    let markup = highlight_markup("if (a < b && c > d) { List<String> l; }");
    let without_tags = markup
        .replace(r#"<span class="hl-keyword">"#, "")
        .replace(r#"<span class="hl-type">"#, "")
        .replace("</span>", "");
    assert!(!without_tags.contains('<'));
    assert!(!without_tags.contains('>'));
    assert!(without_tags.contains("&lt;"));
}
