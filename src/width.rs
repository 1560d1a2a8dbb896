//! Terminal display width helpers.
//!
//! ANSI-aware width calculation so padding and truncation stay aligned with
//! what the terminal actually paints.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Cut `text` so it occupies at most `max_width` cells, marking the cut with `…`.
pub fn truncate_display(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        width += w;
        result.push(ch);
    }
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_ansi_sequences() {
        assert_eq!(display_width("\x1b[1mZen\x1b[0m"), 3);
        assert_eq!(display_width("Térreo"), 6);
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate_display("Santuário Criativo", 8), "Santuár…");
        assert_eq!(display_width(&truncate_display("Santuário Criativo", 8)), 8);
        assert_eq!(truncate_display("Apoio", 8), "Apoio");
        assert_eq!(truncate_display("Apoio", 0), "");
    }
}
