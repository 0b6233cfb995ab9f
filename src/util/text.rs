use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Terminal columns occupied by `s` (CJK and emoji count double, combining
/// marks count zero).
///
/// ```
/// use catalog_tree::util::display_width;
///
/// assert_eq!(display_width("Phones"), 6);
/// assert_eq!(display_width("家電"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Longest prefix of `s` that fits in `width` columns, as a byte offset.
fn prefix_end(s: &str, width: usize) -> (usize, usize) {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            return (idx, used);
        }
        used += w;
    }
    (s.len(), used)
}

/// Cut `s` to at most `max_width` columns, ending with `...` when text was
/// dropped. Widths of three or less get a bare prefix with no ellipsis.
///
/// ```
/// use catalog_tree::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Laptops", 10), "Laptops");
/// assert_eq!(truncate_to_width("Gaming Laptops", 9), "Gaming...");
/// assert_eq!(truncate_to_width("Laptops", 2), "La");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    let (end, _) = prefix_end(s, max_width);
    if end == s.len() {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(s[..end].to_string());
    }
    let (cut, _) = prefix_end(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
}

/// Truncate, then right-pad with spaces to exactly `width` columns.
///
/// A double-width character that would straddle the edge is replaced by
/// padding, so the result never exceeds `width`.
pub fn fit_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let used = display_width(&truncated);
    let mut out = String::with_capacity(truncated.len() + width.saturating_sub(used));
    out.push_str(&truncated);
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

fn is_stripped_control(c: char) -> bool {
    c == '\u{7f}' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
}

/// Remove C0 control characters, DEL and ANSI escape sequences (CSI and
/// OSC) from backend-supplied text before it reaches the terminal.
///
/// Tab, newline and carriage return survive. Clean input is returned
/// borrowed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c == '\u{1b}' || is_stripped_control(c)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameters run until a final byte in @..=~
                    for p in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&p) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // Until BEL or ESC \
                    while let Some(p) = chars.next() {
                        if p == '\u{07}' {
                            break;
                        }
                        if p == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_stripped_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
