//! Text layout for the card's greeting and branding panels.
//!
//! Layout is deliberately measurement-free: every character is assumed to advance by a fixed
//! fraction of the font size, so wrapping is stable across platforms and does not need a font
//! system. The resulting [`TextBlock`]s are handed to the host in every frame snapshot
//! together with their world transform.
//!
//! # Examples
//!
//! ```rust
//! use foldcard::{Color, TextAlignment, TextLayout};
//!
//! let layout = TextLayout {
//!     font_size: 0.1,
//!     line_height: 0.14,
//!     max_width: 1.1,
//!     max_lines: 2,
//!     alignment: TextAlignment::Center,
//! };
//!
//! let block = layout.layout("Meilleurs voeux pour la nouvelle année", Color::WHITE);
//! assert!(block.lines.len() <= 2);
//! ```

use crate::Color;
use smallvec::SmallVec;

/// Width of one character expressed as a fraction of the font size.
pub const CHARACTER_ADVANCE: f32 = 0.55;

const ELLIPSIS: char = '…';

/// Specifies the alignment of text within its layout area.
///
/// # Variants
///
/// - `Start`: Align text to the start.
/// - `End`: Align text to the end.
/// - `Center`: Center-align the text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum TextAlignment {
    /// Align text to the start (left or right, depending on language).
    Start,
    /// Align text to the end.
    End,
    /// Center-align the text.
    #[default]
    Center,
}

/// Defines the layout parameters for a block of text, in scene units.
///
/// # Fields
///
/// - `font_size`: Glyph height.
/// - `line_height`: Distance between consecutive baselines.
/// - `max_width`: Width after which lines wrap.
/// - `max_lines`: Lines past this limit are dropped and the last kept line ends with an ellipsis.
/// - `alignment`: Horizontal alignment of each line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub line_height: f32,
    pub max_width: f32,
    pub max_lines: usize,
    pub alignment: TextAlignment,
}

impl TextLayout {
    pub fn advance(&self) -> f32 {
        self.font_size * CHARACTER_ADVANCE
    }

    /// How many characters fit on one line. Always at least one.
    pub fn chars_per_line(&self) -> usize {
        let advance = self.advance();
        if advance <= 0.0 {
            return 1;
        }
        ((self.max_width / advance).floor() as usize).max(1)
    }

    /// Wraps `text` into lines, greedily by words. Words longer than a line are split.
    /// Explicit newlines start a new line.
    pub fn layout(&self, text: &str, color: Color) -> TextBlock {
        let capacity = self.chars_per_line();
        let max_lines = self.max_lines.max(1);
        let mut lines: SmallVec<[String; 4]> = SmallVec::new();
        let mut truncated = false;

        'paragraphs: for paragraph in text.lines() {
            let mut current = String::new();
            let mut current_len = 0usize;

            for word in paragraph.split_whitespace() {
                let mut remaining: Vec<char> = word.chars().collect();

                while !remaining.is_empty() {
                    let separator = usize::from(current_len > 0);
                    if current_len + separator + remaining.len() <= capacity {
                        if separator == 1 {
                            current.push(' ');
                        }
                        current.extend(remaining.iter());
                        current_len += separator + remaining.len();
                        remaining.clear();
                    } else if current_len > 0 {
                        if lines.len() == max_lines {
                            truncated = true;
                            break 'paragraphs;
                        }
                        lines.push(std::mem::take(&mut current));
                        current_len = 0;
                    } else {
                        // A single word wider than the line.
                        let head: String = remaining.drain(..capacity).collect();
                        if lines.len() == max_lines {
                            truncated = true;
                            break 'paragraphs;
                        }
                        lines.push(head);
                    }
                }
            }

            if current_len > 0 {
                if lines.len() == max_lines {
                    truncated = true;
                    break;
                }
                lines.push(current);
            }
        }

        if truncated {
            if let Some(last) = lines.last_mut() {
                let mut chars: Vec<char> = last.chars().collect();
                chars.truncate(capacity.saturating_sub(1));
                while chars.last() == Some(&' ') {
                    chars.pop();
                }
                chars.push(ELLIPSIS);
                *last = chars.into_iter().collect();
            }
        }

        TextBlock {
            lines,
            font_size: self.font_size,
            line_height: self.line_height,
            alignment: self.alignment,
            color,
            truncated,
        }
    }
}

/// A laid-out block of text ready to be drawn by a text pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: SmallVec<[String; 4]>,
    pub font_size: f32,
    pub line_height: f32,
    pub alignment: TextAlignment,
    pub color: Color,
    /// Whether lines were dropped to honor the line limit.
    pub truncated: bool,
}

impl TextBlock {
    /// The displayed text, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    /// Estimated width of the widest line.
    pub fn width(&self) -> f32 {
        let widest = self
            .lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        widest as f32 * self.font_size * CHARACTER_ADVANCE
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(max_width: f32, max_lines: usize) -> TextLayout {
        // 0.1 * 0.55 = 0.055 per character
        TextLayout {
            font_size: 0.1,
            line_height: 0.14,
            max_width,
            max_lines,
            alignment: TextAlignment::Center,
        }
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let block = layout(1.1, 3).layout("Bonne année", Color::WHITE);
        assert_eq!(block.lines.as_slice(), ["Bonne année"]);
        assert!(!block.truncated);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        // 10 characters per line
        let block = layout(0.56, 5).layout("alpha beta gamma delta", Color::WHITE);
        assert_eq!(block.lines.as_slice(), ["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn long_words_are_split() {
        let block = layout(0.56, 5).layout("abcdefghijklmnop", Color::WHITE);
        assert_eq!(block.lines.as_slice(), ["abcdefghij", "klmnop"]);
    }

    #[test]
    fn overflow_is_truncated_with_ellipsis() {
        let block = layout(0.56, 2).layout("alpha beta gamma delta epsilon", Color::WHITE);
        assert_eq!(block.lines.len(), 2);
        assert!(block.truncated);
        assert_eq!(block.lines[1], "gamma…");
    }

    #[test]
    fn explicit_newlines_break_lines() {
        let block = layout(1.1, 4).layout("one\ntwo", Color::WHITE);
        assert_eq!(block.text(), "one\ntwo");
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten two-byte characters fit exactly.
        let block = layout(0.56, 1).layout("éééééééééé", Color::WHITE);
        assert_eq!(block.lines.len(), 1);
        assert!(!block.truncated);
    }
}
