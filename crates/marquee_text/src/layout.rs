//! Line breaking and measurement
//!
//! Greedy breaking: advances accumulate until a line would overflow the
//! wrap width, then the line is cut at its last whitespace (which is
//! dropped), or right before the overflowing character when the line has
//! no whitespace. `'\n'` always ends a line.

use crate::glyphs::GlyphSet;

/// Line-broken, measured text at one pixel size
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub pixel_size: u32,
    /// Advance of each line, pixels
    pub line_widths: Vec<f32>,
    /// Largest positive left bearing over all glyphs, pixels
    pub max_bearing: f32,
    pub ascent: f32,
    pub line_height: f32,
    /// Widest line plus bearing, pixels
    pub width: f32,
    /// Lines times line height, pixels
    pub height: f32,
}

impl TextLayout {
    /// Break and measure `text`. A `wrap_width` of `None` disables wrapping.
    pub fn compute(text: &str, glyphs: &GlyphSet, wrap_width: Option<f32>) -> Self {
        let lines = break_lines(text, wrap_width, |ch| glyphs.advance(ch));
        let line_widths: Vec<f32> = lines
            .iter()
            .map(|line| line.chars().map(|ch| glyphs.advance(ch)).sum())
            .collect();

        let max_bearing = text
            .chars()
            .map(|ch| glyphs.glyph(ch).bearing_x as f32)
            .fold(0.0f32, f32::max);

        let widest = line_widths.iter().copied().fold(0.0f32, f32::max);
        let line_height = glyphs.line_height();

        Self {
            pixel_size: glyphs.pixel_size(),
            max_bearing,
            ascent: glyphs.ascent(),
            line_height,
            width: widest + max_bearing,
            height: lines.len() as f32 * line_height,
            line_widths,
            lines,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Split `text` into lines no wider than `max_width`
///
/// A single character wider than `max_width` still gets a line of its own.
pub fn break_lines(
    text: &str,
    max_width: Option<f32>,
    advance: impl Fn(char) -> f32,
) -> Vec<String> {
    let max_width = max_width.filter(|w| *w > 0.0);
    let mut lines = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut width = 0.0f32;
    // Index into `current` of the last whitespace since the last break
    let mut last_space: Option<usize> = None;

    for ch in text.chars() {
        if ch == '\n' {
            lines.push(current.drain(..).collect());
            width = 0.0;
            last_space = None;
            continue;
        }

        let step = advance(ch);
        let overflows = matches!(max_width, Some(max) if width + step > max);

        if overflows && !current.is_empty() {
            if ch.is_whitespace() {
                // Break here; the whitespace is consumed
                lines.push(current.drain(..).collect());
                width = 0.0;
                last_space = None;
                continue;
            }

            match last_space.take() {
                Some(index) => {
                    let rest = current.split_off(index + 1);
                    current.pop();
                    lines.push(current.drain(..).collect());
                    width = rest.iter().map(|c| advance(*c)).sum();
                    current = rest;
                    // The carried word plus `ch` can still be too wide
                    if matches!(max_width, Some(max) if width + step > max) && !current.is_empty() {
                        lines.push(current.drain(..).collect());
                        width = 0.0;
                    }
                }
                None => {
                    lines.push(current.drain(..).collect());
                    width = 0.0;
                }
            }
        }

        if ch.is_whitespace() {
            last_space = Some(current.len());
        }
        current.push(ch);
        width += step;
    }

    if !current.is_empty() || lines.is_empty() || text.ends_with('\n') {
        lines.push(current.into_iter().collect());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(_: char) -> f32 {
        10.0
    }

    #[test]
    fn test_breaks_at_last_space() {
        // "aaaa bbbb " fits in 95 only up to "aaaa bbbb"
        let lines = break_lines("aaaa bbbb cccc", Some(95.0), fixed);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_breaks_inside_line_at_whitespace() {
        let lines = break_lines("aaaa bbbb cccc", Some(120.0), fixed);
        assert_eq!(lines, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn test_forced_break_without_whitespace() {
        let lines = break_lines("abcdefgh", Some(35.0), fixed);
        assert_eq!(lines, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_newline_always_breaks() {
        let lines = break_lines("one\ntwo", None, fixed);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_no_wrap_when_width_not_positive() {
        let text = "a long line that would otherwise wrap";
        assert_eq!(break_lines(text, Some(0.0), fixed), vec![text]);
        assert_eq!(break_lines(text, None, fixed), vec![text]);
    }

    #[test]
    fn test_wide_char_gets_own_line() {
        let lines = break_lines("ab", Some(5.0), fixed);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_carried_word_rechecked_after_space_break() {
        let wide_w = |c: char| if c == 'W' { 30.0 } else { 10.0 };
        let lines = break_lines("a bW", Some(35.0), wide_w);
        assert_eq!(lines, vec!["a", "b", "W"]);
        for line in &lines {
            let width: f32 = line.chars().map(wide_w).sum();
            assert!(width <= 35.0, "{line:?} is {width} wide");
        }
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        assert_eq!(break_lines("", Some(50.0), fixed), vec![String::new()]);
    }
}
