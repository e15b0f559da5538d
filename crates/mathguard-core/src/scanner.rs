//! Locating the close marker of a math span.

/// Finds the byte offset of the first occurrence of `close` at or after `start` that
/// is not nested inside braces opened after `start`.
///
/// The scan tracks a brace depth starting at zero. A close marker only counts while
/// the depth is `<= 0`, and that check runs before escape handling, so a close marker
/// that itself begins with a backslash (`\)`) is still found. Otherwise a backslash
/// skips the next character, which keeps `\{` and `\}` out of the depth count. The
/// depth may go negative.
///
/// An empty `close` matches immediately at `start`. Returns `None` when the text runs
/// out, or when `start` is past the end or not on a character boundary.
///
/// ```
/// use mathguard_core::scanner::find_matching_close;
///
/// let text = r"\(\frac{a}{b}\) tail";
/// assert_eq!(find_matching_close(r"\)", text, 2), Some(13));
/// assert_eq!(find_matching_close("}", r"\textbf{a {b} c} d", 8), Some(15));
/// assert_eq!(find_matching_close(r"\)", r"\(x", 2), None);
/// ```
pub fn find_matching_close(close: &str, text: &str, start: usize) -> Option<usize> {
    scan(close, text, start, true)
}

/// Finds where a span opened before `start` ends.
///
/// This is [`find_matching_close`], except that when braces never balance it falls
/// back to the first close marker that is not escaped, ignoring depth. A span such as
/// `\(\frac{a{b}\)` then still ends at its `\)` and its unbalanced brace is left for
/// the rendering engine to report. `None` means the close marker does not occur at all.
///
/// ```
/// use mathguard_core::scanner::{find_matching_close, find_span_close};
///
/// let text = r"\(\frac{a{b}\)";
/// assert_eq!(find_matching_close(r"\)", text, 2), None);
/// assert_eq!(find_span_close(r"\)", text, 2), Some(12));
/// ```
pub fn find_span_close(close: &str, text: &str, start: usize) -> Option<usize> {
    scan(close, text, start, true).or_else(|| scan(close, text, start, false))
}

fn scan(close: &str, text: &str, start: usize, track_depth: bool) -> Option<usize> {
    if !text.is_char_boundary(start) {
        return None;
    }

    let bytes = text.as_bytes();
    let mut index = start;
    let mut depth: isize = 0;

    while index < bytes.len() {
        if depth <= 0 && text[index..].starts_with(close) {
            return Some(index);
        }

        match bytes[index] {
            b'\\' => {
                index += 1;
                index += char_len_at(text, index);
                continue;
            }
            b'{' if track_depth => depth += 1,
            b'}' if track_depth => depth -= 1,
            _ => {}
        }
        index += char_len_at(text, index);
    }

    if close.is_empty() && index == start {
        return Some(start);
    }
    None
}

fn char_len_at(text: &str, index: usize) -> usize {
    text.get(index..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8)
}
