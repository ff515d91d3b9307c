// Cursor Mapping
// Resolves pointer positions against a laid out paragraph

use super::paragraph::{Paragraph, char_to_byte};
use super::run::{Inline, TextRun};
use crate::draw_context::TextMetrics;
use crate::error::LayoutError;
use crate::link_opener::{LinkOpener, activate_link};
use std::ops::RangeInclusive;
use unicode_segmentation::UnicodeSegmentation;

/// A caret position: a run of the paragraph and a character offset into its
/// visible text. Ordering follows reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextCursor {
    pub run: usize,
    pub offset: usize,
}

impl TextCursor {
    pub fn new(run: usize, offset: usize) -> Self {
        TextCursor { run, offset }
    }
}

impl Paragraph {
    pub fn cursor_at_start(&self) -> Result<TextCursor, LayoutError> {
        self.text_runs()
            .next()
            .map(|(index, _)| TextCursor::new(index, 0))
            .ok_or(LayoutError::EmptyParagraph)
    }

    pub fn cursor_at_end(&self) -> Result<TextCursor, LayoutError> {
        self.text_runs()
            .last()
            .map(|(index, run)| TextCursor::new(index, run.visible_len()))
            .ok_or(LayoutError::EmptyParagraph)
    }

    /// Map a pointer position to a cursor.
    ///
    /// A click that is not part of a drag also activates the link of the run
    /// it lands on. Malformed link targets are ignored.
    pub fn cursor_at(
        &self,
        mouse_x: f32,
        mouse_y: f32,
        dragged: bool,
        metrics: &dyn TextMetrics,
        opener: &mut dyn LinkOpener,
    ) -> Result<TextCursor, LayoutError> {
        // Rows are padded by half the line spacing so every y between two
        // lines belongs to one of them
        let line_padding = self.config.paragraph.space_between_lines / 2.0;
        let band = |run: &TextRun| -> RangeInclusive<f32> {
            (run.y - line_padding)..=(run.y + run.height + line_padding)
        };

        let Some((mut current, mut current_run)) = self
            .text_runs()
            .find(|(_, run)| band(run).contains(&mouse_y))
        else {
            let (_, first) = self.text_runs().next().ok_or(LayoutError::EmptyParagraph)?;
            if mouse_y < first.y - line_padding {
                return self.cursor_at_start();
            }
            let (_, last) = self.text_runs().last().ok_or(LayoutError::EmptyParagraph)?;
            if mouse_y <= last.y + last.height + line_padding {
                return Err(LayoutError::InconsistentGeometry { pointer_y: mouse_y });
            }
            return self.cursor_at_end();
        };

        // Runs are scanned in reading order, so this is the leftmost run of the row
        if mouse_x < current_run.x {
            return Ok(TextCursor::new(current, 0));
        }

        while mouse_x > current_run.x + current_run.width {
            let Some((next, next_run)) = self.next_text_run(current) else {
                return Ok(TextCursor::new(current, current_run.visible_len()));
            };
            if !band(next_run).contains(&mouse_y) {
                // Right of the end of this row
                return Ok(TextCursor::new(current, current_run.visible_len()));
            }
            current = next;
            current_run = next_run;
        }

        if !dragged {
            if let Some(target) = &current_run.style.link {
                activate_link(opener, target);
            }
        }

        Ok(TextCursor::new(
            current,
            offset_in_run(current_run, mouse_x, metrics),
        ))
    }

    /// Caret geometry (x, y, height) of `cursor`
    pub fn cursor_position<M: TextMetrics + ?Sized>(
        &self,
        cursor: TextCursor,
        metrics: &M,
    ) -> Option<(f32, f32, f32)> {
        let run = self.items.get(cursor.run)?.as_text()?;
        let end = char_to_byte(&run.text, cursor.offset);
        Some((run.x + run.prefix_width(end, metrics), run.y, run.height))
    }

    fn next_text_run(&self, index: usize) -> Option<(usize, &TextRun)> {
        self.items
            .iter()
            .enumerate()
            .skip(index + 1)
            .find_map(|(index, item)| match item {
                Inline::Text(run) => Some((index, run)),
                Inline::SoftBreak | Inline::HardBreak => None,
            })
    }
}

/// Character offset inside `run` closest to `mouse_x`; ties go to the earlier offset
fn offset_in_run(run: &TextRun, mouse_x: f32, metrics: &dyn TextMetrics) -> usize {
    let mut offset = 0;
    let mut cached_width = 0.0;

    for (start, grapheme) in run.text.grapheme_indices(true) {
        let next_offset = offset + grapheme.chars().count();
        let new_width = run.prefix_width(start + grapheme.len(), metrics);

        if run.x + new_width > mouse_x {
            let old_distance = (mouse_x - run.x - cached_width).abs();
            let new_distance = (new_width - (mouse_x - run.x)).abs();
            return if old_distance <= new_distance {
                offset
            } else {
                next_offset
            };
        }

        cached_width = new_width;
        offset = next_offset;
    }

    run.visible_len()
}
