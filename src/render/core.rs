use std::io::Write;

use unicode_width::UnicodeWidthChar;

use crate::display_width;
use crate::error::Result;
use crate::registry::{ZoneId, ZoneState};

/// ANSI escape code renderer writing directly to a terminal handle.
#[derive(Debug, Default)]
pub struct AnsiRenderer {
    frames: u64,
}

impl AnsiRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames flushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render(&mut self, writer: &mut impl Write, dirty: &[(ZoneId, ZoneState)]) -> Result<()> {
        for (_id, state) in dirty {
            render_zone(writer, state)?;
        }
        writer.flush()?;
        self.frames += 1;
        Ok(())
    }
}

fn render_zone(writer: &mut impl Write, state: &ZoneState) -> Result<()> {
    let rect = state.rect;
    if rect.is_empty() {
        return Ok(());
    }

    let mut lines = if state.pre_rendered {
        state.content.lines().map(str::to_string).collect()
    } else {
        wrap_to_width(&state.content, rect.width as usize)
    };
    lines.resize(rect.height as usize, String::new());

    for (offset, line) in lines.iter().enumerate() {
        let line = fit_line(line, rect.width as usize);
        write!(writer, "\x1b[{};{}H{}", rect.y + offset as u16 + 1, rect.x + 1, line)?;
    }

    Ok(())
}

/// Word-wrap each paragraph of `content`; words longer than the width are split.
pub(crate) fn wrap_to_width(content: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let mut current = String::new();
        let mut current_width = 0usize;
        for word in paragraph.split_whitespace() {
            let word_width = display_width(word);
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + 1 + word_width
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            if word_width <= width {
                current.push_str(word);
                current_width = word_width;
                continue;
            }
            for ch in word.chars() {
                let w = ch.width().unwrap_or(0);
                if current_width + w > width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += w;
            }
        }
        lines.push(current);
    }
    lines
}

/// Pad or cut a line to exactly `width` display cells.
fn fit_line(line: &str, width: usize) -> String {
    let mut fitted = String::new();
    let mut used = 0usize;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        fitted.push(ch);
        used += w;
    }
    fitted.extend(std::iter::repeat(' ').take(width - used));
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::registry::ZoneRegistry;
    use std::collections::HashMap;

    #[test]
    fn wrap_breaks_on_words() {
        let lines = wrap_to_width("Leitura e meditação.", 10);
        assert_eq!(lines, vec!["Leitura e", "meditação."]);
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let lines = wrap_to_width("Descompressão", 5);
        assert_eq!(lines, vec!["Desco", "mpres", "são"]);
    }

    #[test]
    fn fit_line_pads_and_cuts() {
        assert_eq!(fit_line("Zen", 5), "Zen  ");
        assert_eq!(fit_line("Silêncio", 4), "Silê");
    }

    #[test]
    fn renderer_writes_cursor_sequences() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("card".to_string(), Rect::new(2, 3, 5, 2));
        registry.sync_layout(&solved);
        registry.take_dirty();
        registry.apply_content("card", "hi".to_string()).unwrap();
        let dirty = registry.take_dirty();

        let mut output = Vec::new();
        let mut renderer = AnsiRenderer::new();
        renderer.render(&mut output, &dirty).unwrap();

        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("\u{1b}[4;3Hhi   "));
        assert!(rendered.contains("\u{1b}[5;3H     "));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn pre_rendered_content_keeps_leading_spaces() {
        let mut registry = ZoneRegistry::new();
        let mut solved = HashMap::new();
        solved.insert("plate".to_string(), Rect::new(0, 0, 6, 1));
        registry.sync_layout(&solved);
        registry
            .apply_pre_rendered("plate", "  +--+".to_string())
            .unwrap();
        let dirty = registry.take_dirty();

        let mut output = Vec::new();
        AnsiRenderer::new().render(&mut output, &dirty).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("\u{1b}[1;1H  +--+"));
    }
}
