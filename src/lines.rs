use crate::markup::render_line_markup;
use crate::syntax_highlighter::{Token, tokenize};

/// One highlighted line paired with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub number: usize,
    pub markup: String,
}

/// Cut a token stream into lines at every `\n`.
///
/// Tokens spanning a newline (block comments) are split into one piece per
/// line. The result always has `source.split('\n').count()` entries, empty
/// lines included. A `\r` right before a newline is dropped from its line.
pub fn split_lines(source: &str, tokens: &[Token]) -> Vec<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut lines: Vec<Vec<Token>> = vec![Vec::new()];

    for token in tokens {
        let mut start = token.range.start;
        for (offset, _) in token.text(source).match_indices('\n') {
            let newline = token.range.start + offset;
            let end = if newline > start && bytes[newline - 1] == b'\r' {
                newline - 1
            } else {
                newline
            };
            push_piece(&mut lines, token, start, end);
            lines.push(Vec::new());
            start = newline + 1;
        }
        push_piece(&mut lines, token, start, token.range.end);
    }

    lines
}

fn push_piece(lines: &mut [Vec<Token>], token: &Token, start: usize, end: usize) {
    if start < end {
        if let Some(line) = lines.last_mut() {
            line.push(Token::new(token.kind, start..end));
        }
    }
}

/// Split highlighter output on newline boundaries.
pub fn split_markup(markup: &str) -> Vec<&str> {
    markup.split('\n').collect()
}

/// Tokenize, split and render `source` into numbered markup lines.
pub fn render_lines(source: &str) -> Vec<RenderedLine> {
    let tokens = tokenize(source);
    split_lines(source, &tokens)
        .iter()
        .enumerate()
        .map(|(index, line_tokens)| RenderedLine {
            number: index + 1,
            markup: render_line_markup(source, line_tokens),
        })
        .collect()
}
