use std::borrow::Cow;

/// Replace the markup-significant angle brackets with entities.
///
/// Only `<` and `>` are rewritten. Text without them is handed back borrowed,
/// so callers can escape every token without allocating for the common case.
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
