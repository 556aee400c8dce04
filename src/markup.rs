use crate::escape::escape_markup;
use crate::lines::render_lines;
use crate::syntax_highlighter::{Token, TokenKind};

/// Append one token as markup: escaped text, wrapped in an emphasis span
/// when the kind carries one.
pub fn render_token_markup(text: &str, kind: TokenKind, out: &mut String) {
    let escaped = escape_markup(text);
    match kind.css_class() {
        Some(class) => {
            out.push_str("<span class=\"");
            out.push_str(class);
            out.push_str("\">");
            out.push_str(&escaped);
            out.push_str("</span>");
        }
        None => out.push_str(&escaped),
    }
}

/// Render the tokens of a single line. Tokens must not contain newlines.
pub fn render_line_markup(source: &str, line_tokens: &[Token]) -> String {
    let mut out = String::with_capacity(line_tokens.iter().map(|t| t.range.len()).sum());
    for token in line_tokens {
        render_token_markup(token.text(source), token.kind, &mut out);
    }
    out
}

/// Full highlighter output for `source`.
///
/// Spans never cross a newline: a multi-line comment is closed at the end of
/// each line and reopened on the next, so every line stands on its own.
pub fn highlight_markup(source: &str) -> String {
    render_lines(source)
        .into_iter()
        .map(|line| line.markup)
        .collect::<Vec<_>>()
        .join("\n")
}
