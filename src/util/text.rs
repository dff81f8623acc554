use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated cells
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Calculates the display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Flattens remote text onto a single safe terminal line.
///
/// Subreddit descriptions are user-controlled: newlines and tabs collapse to
/// single spaces, and other control characters (including ESC, which starts
/// ANSI sequences) are dropped. Returns `Cow::Borrowed` when nothing changes.
pub fn single_line(s: &str) -> Cow<'_, str> {
    let clean = s
        .chars()
        .all(|c| !c.is_control() && c != '\u{2028}' && c != '\u{2029}');
    if clean && !s.contains("  ") {
        return Cow::Borrowed(s.trim());
    }

    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if c.is_control() {
            continue;
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Truncates a string to fit within `max_width` terminal columns, appending
/// "..." when text is cut off.
///
/// # Examples
///
/// ```
/// use reddit_cleaner::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    // Too narrow for char + ellipsis: hard cut
    let (budget, suffix) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }
    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// Truncates and right-pads `s` to exactly `width` columns (for table output).
pub fn fit_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let pad = width.saturating_sub(display_width(&truncated));
    format!("{}{}", truncated, " ".repeat(pad))
}
