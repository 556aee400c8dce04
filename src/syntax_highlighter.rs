use std::collections::HashMap;
use std::ops::Range;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::lines::split_lines;
use crate::theme::{Base16Palette, ThemeId};

/// Reserved words emphasized wherever they appear as a whole word.
pub const KEYWORDS: &[&str] = &[
    "public", "private", "protected", "class", "interface", "extends", "implements", "static",
    "final", "void", "return", "new", "import", "package", "this", "super", "if", "else", "for",
    "while", "do", "switch", "case", "break", "continue", "try", "catch", "finally", "throw",
    "throws", "instanceof", "synchronized", "volatile", "transient", "native", "strictfp", "enum",
    "assert", "boolean", "byte", "char", "short", "int", "long", "float", "double", "null",
    "true", "false",
];

/// Well-known library types, styled apart from ordinary identifiers.
pub const TYPE_NAMES: &[&str] = &[
    "Number",
    "Comparable",
    "Runnable",
    "Thread",
    "List",
    "ArrayList",
    "Collection",
    "Set",
    "Map",
];

/// Words restyled when they bound a type parameter, e.g. `<T extends Number>`.
pub const BOUND_KEYWORDS: &[&str] = &["extends", "super"];

pub const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Str,
    LineComment,
    BlockComment,
    Number,
    /// Bound keyword or wildcard inside a type-parameter group
    Bound,
    TypeName,
    Identifier,
    /// Whitespace, punctuation and operators
    Plain,
}

impl TokenKind {
    /// Class name used for the emphasis span, `None` for unemphasized text.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            TokenKind::Keyword => Some("hl-keyword"),
            TokenKind::Str => Some("hl-string"),
            TokenKind::LineComment => Some("hl-comment"),
            TokenKind::BlockComment => Some("hl-block-comment"),
            TokenKind::Number => Some("hl-number"),
            TokenKind::Bound => Some("hl-bound"),
            TokenKind::TypeName => Some("hl-type"),
            TokenKind::Identifier | TokenKind::Plain => None,
        }
    }

    pub fn is_emphasized(self) -> bool {
        self.css_class().is_some()
    }

    pub fn style(self, palette: &Base16Palette) -> Style {
        let base = Style::default();
        match self {
            TokenKind::Keyword => base
                .fg(palette.base_0e.color())
                .add_modifier(Modifier::BOLD),
            TokenKind::Str => base.fg(palette.base_0b.color()),
            TokenKind::LineComment => base
                .fg(palette.base_03.color())
                .add_modifier(Modifier::ITALIC),
            TokenKind::BlockComment => base
                .fg(palette.base_04.color())
                .add_modifier(Modifier::ITALIC),
            TokenKind::Number => base.fg(palette.base_0a.color()),
            TokenKind::Bound => base
                .fg(palette.base_0d.color())
                .add_modifier(Modifier::BOLD),
            TokenKind::TypeName => base.fg(palette.base_0c.color()),
            TokenKind::Identifier | TokenKind::Plain => base.fg(palette.base_05.color()),
        }
    }
}

/// A classified lexeme. `range` indexes the raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }
}

/// Classify `source` in a single left-to-right pass.
///
/// Every byte belongs to exactly one token and the tokens are in source
/// order, so concatenating their texts gives back the input. Matching is
/// heuristic: malformed input only ever yields odd styling.
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).run()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Map every `<` that opens a type-parameter group to the end (exclusive)
/// of that group.
///
/// Only identifier characters, blanks, `,` `?` `.` `[` `]`, a lone `&` and
/// nested brackets may appear before the matching `>`; anything else means
/// the pending `<`s are operators. One pass with a bracket stack.
fn type_parameter_groups(source: &str) -> HashMap<usize, usize> {
    let mut groups = HashMap::new();
    let mut pending = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        match c {
            '<' => pending.push(at),
            '>' => {
                if let Some(open) = pending.pop() {
                    groups.insert(open, at + 1);
                }
            }
            // `&&` is a boolean operator, a single `&` joins bounds
            '&' if chars.peek().map(|&(_, next)| next) != Some('&') => {}
            ' ' | '\t' | ',' | '?' | '.' | '[' | ']' => {}
            c if is_word_char(c) => {}
            _ => pending.clear(),
        }
    }
    groups
}

struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
    groups: HashMap<usize, usize>,
    // End of the innermost-or-enclosing type-parameter group seen so far
    group_end: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            groups: type_parameter_groups(source),
            group_end: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            let kind = match c {
                '/' if self.rest().starts_with("//") => {
                    self.take_line_comment();
                    TokenKind::LineComment
                }
                '/' if self.rest().starts_with("/*") => {
                    self.take_block_comment();
                    TokenKind::BlockComment
                }
                '"' => match self.string_end() {
                    Some(end) => {
                        self.pos = end;
                        TokenKind::Str
                    }
                    None => {
                        self.pos += 1;
                        TokenKind::Plain
                    }
                },
                '<' => {
                    if let Some(&end) = self.groups.get(&start) {
                        self.group_end = self.group_end.max(end);
                    }
                    self.pos += 1;
                    TokenKind::Plain
                }
                '?' if self.in_type_parameters(start) => {
                    self.pos += 1;
                    TokenKind::Bound
                }
                c if is_word_char(c) => {
                    self.take_while(is_word_char);
                    self.classify_word(start)
                }
                c => {
                    self.pos += c.len_utf8();
                    TokenKind::Plain
                }
            };
            self.push(kind, start);
        }
        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) {
        let len = self
            .rest()
            .find(|c: char| !keep(c))
            .unwrap_or(self.rest().len());
        self.pos += len;
    }

    fn take_line_comment(&mut self) {
        self.take_while(|c| c != '\n' && c != '\r');
    }

    fn take_block_comment(&mut self) {
        // Unterminated comments run to the end of the input
        self.pos = match self.rest()[2..].find("*/") {
            Some(offset) => self.pos + 2 + offset + 2,
            None => self.source.len(),
        };
    }

    /// End (exclusive) of a string literal starting at the current quote,
    /// or `None` when the line ends before the closing quote.
    fn string_end(&self) -> Option<usize> {
        let mut chars = self.rest().char_indices().skip(1);
        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => return Some(self.pos + offset + 1),
                '\n' => return None,
                '\\' => {
                    if let Some((_, '\n')) | None = chars.next() {
                        return None;
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn in_type_parameters(&self, at: usize) -> bool {
        at < self.group_end
    }

    fn classify_word(&self, start: usize) -> TokenKind {
        let word = &self.source[start..self.pos];
        if self.in_type_parameters(start) && BOUND_KEYWORDS.contains(&word) {
            TokenKind::Bound
        } else if KEYWORDS.contains(&word) {
            TokenKind::Keyword
        } else if TYPE_NAMES.contains(&word) {
            TokenKind::TypeName
        } else if word.bytes().all(|b| b.is_ascii_digit()) {
            TokenKind::Number
        } else {
            TokenKind::Identifier
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if kind == TokenKind::Plain {
            if let Some(last) = self.tokens.last_mut() {
                if last.kind == TokenKind::Plain && last.range.end == start {
                    last.range.end = self.pos;
                    return;
                }
            }
        }
        self.tokens.push(Token::new(kind, start..self.pos));
    }
}

pub struct SyntaxHighlighter {
    palette: &'static Base16Palette,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new(ThemeId::default())
    }
}

impl SyntaxHighlighter {
    pub fn new(theme: ThemeId) -> Self {
        Self {
            palette: theme.palette(),
        }
    }

    pub fn palette(&self) -> &'static Base16Palette {
        self.palette
    }

    /// Highlight a code block and return one styled Line per source line
    pub fn highlight_code(&self, code: &str) -> Vec<Line<'static>> {
        let tokens = tokenize(code);
        split_lines(code, &tokens)
            .into_iter()
            .map(|line_tokens| self.highlight_line(code, &line_tokens))
            .collect()
    }

    pub fn highlight_line(&self, code: &str, line_tokens: &[Token]) -> Line<'static> {
        let spans: Vec<Span<'static>> = line_tokens
            .iter()
            .map(|token| {
                let text = token.text(code).replace('\t', &" ".repeat(TAB_WIDTH));
                Span::styled(text, token.kind.style(self.palette))
            })
            .collect();
        Line::from(spans)
    }
}
