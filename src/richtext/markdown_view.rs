// Markdown View
// A document of paragraphs stacked vertically, with pointer handling,
// selection across paragraphs and link hover

use super::cursor::TextCursor;
use super::markdown_converter::markdown_to_paragraphs;
use super::paragraph::{DrawState, Paragraph};
use super::selection::Selection;
use crate::config::MarkdownConfig;
use crate::draw_context::{DrawContext, TextMetrics};
use crate::error::LayoutError;
use crate::link_opener::LinkOpener;

/// A cursor inside one paragraph of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPosition {
    pub paragraph: usize,
    pub cursor: TextCursor,
}

impl DocumentPosition {
    pub fn new(paragraph: usize, cursor: TextCursor) -> Self {
        DocumentPosition { paragraph, cursor }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x: f32,
    y: f32,
    width: f32,
}

#[derive(Debug)]
pub struct MarkdownView {
    config: MarkdownConfig,
    paragraphs: Vec<Paragraph>,
    bounds: Option<Bounds>,
    content_height: f32,
    anchor: Option<DocumentPosition>,
    focus: Option<DocumentPosition>,
    /// (paragraph, run) of the link under the pointer
    hovered: Option<(usize, usize)>,
}

impl MarkdownView {
    pub fn new(config: MarkdownConfig, paragraphs: Vec<Paragraph>) -> Self {
        MarkdownView {
            config,
            paragraphs,
            bounds: None,
            content_height: 0.0,
            anchor: None,
            focus: None,
            hovered: None,
        }
    }

    pub fn from_markdown(markdown: &str, config: MarkdownConfig) -> Self {
        let paragraphs = markdown_to_paragraphs(markdown, &config);
        Self::new(config, paragraphs)
    }

    pub fn config(&self) -> &MarkdownConfig {
        &self.config
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Height of all laid out paragraphs, margins included
    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    /// Lay out every paragraph top to bottom, returning the content height.
    ///
    /// Cursors stay valid as long as the width does not change; a new width
    /// drops the selection and hover state. On error the view keeps its
    /// previous layout.
    pub fn layout(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        metrics: &dyn TextMetrics,
    ) -> Result<f32, LayoutError> {
        let mut paragraphs = self.paragraphs.clone();
        let count = paragraphs.len();
        let mut next_y = y;
        for index in 0..count {
            let next_continues = paragraphs
                .get(index + 1)
                .is_some_and(Paragraph::continues_previous);
            let paragraph = &mut paragraphs[index];
            paragraph.set_insert_space_before(index > 0 && !paragraph.continues_previous());
            paragraph.set_insert_space_after(index + 1 < count && !next_continues);

            let layout = paragraph.layout_at(x, next_y, width, metrics)?;
            next_y = layout.bottom();
        }

        if self.bounds.is_some_and(|bounds| bounds.width != width) {
            self.clear_selection();
            self.hovered = None;
        }
        self.paragraphs = paragraphs;
        self.bounds = Some(Bounds { x, y, width });
        self.content_height = next_y - y;
        log::debug!(
            "Laid out {} paragraphs at width {width}, content height {}",
            count,
            self.content_height
        );
        Ok(self.content_height)
    }

    /// Resolve a pointer position to a position in the document
    pub fn cursor_at(
        &self,
        x: f32,
        y: f32,
        dragging: bool,
        metrics: &dyn TextMetrics,
        opener: &mut dyn LinkOpener,
    ) -> Result<DocumentPosition, LayoutError> {
        let laid_out: Vec<(usize, &Paragraph)> = self
            .paragraphs
            .iter()
            .enumerate()
            .filter(|(_, paragraph)| paragraph.layout().is_some())
            .collect();
        let (Some(&(first_index, first)), Some(&(last_index, last))) =
            (laid_out.first(), laid_out.last())
        else {
            return Err(LayoutError::EmptyParagraph);
        };

        if first.layout().is_some_and(|layout| y < layout.y) {
            return Ok(DocumentPosition::new(first_index, first.cursor_at_start()?));
        }

        match laid_out
            .iter()
            .find(|(_, paragraph)| paragraph.layout().is_some_and(|layout| layout.contains_y(y)))
        {
            Some(&(index, paragraph)) => Ok(DocumentPosition::new(
                index,
                paragraph.cursor_at(x, y, dragging, metrics, opener)?,
            )),
            None => Ok(DocumentPosition::new(last_index, last.cursor_at_end()?)),
        }
    }

    /// Start a selection (and activate a link) at the pointer
    pub fn mouse_down(
        &mut self,
        x: f32,
        y: f32,
        metrics: &dyn TextMetrics,
        opener: &mut dyn LinkOpener,
    ) -> Result<DocumentPosition, LayoutError> {
        let position = self.cursor_at(x, y, false, metrics, opener)?;
        self.anchor = Some(position);
        self.focus = Some(position);
        Ok(position)
    }

    /// Extend the selection to the pointer
    pub fn mouse_drag(
        &mut self,
        x: f32,
        y: f32,
        metrics: &dyn TextMetrics,
        opener: &mut dyn LinkOpener,
    ) -> Result<DocumentPosition, LayoutError> {
        let position = self.cursor_at(x, y, true, metrics, opener)?;
        if self.anchor.is_none() {
            self.anchor = Some(position);
        }
        self.focus = Some(position);
        Ok(position)
    }

    pub fn set_selection(&mut self, anchor: DocumentPosition, focus: DocumentPosition) {
        self.anchor = Some(anchor);
        self.focus = Some(focus);
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
        self.focus = None;
    }

    /// Selected range in document order
    pub fn selection(&self) -> Option<(DocumentPosition, DocumentPosition)> {
        let (anchor, focus) = (self.anchor?, self.focus?);
        Some(if anchor <= focus {
            (anchor, focus)
        } else {
            (focus, anchor)
        })
    }

    /// Part of the selection inside paragraph `index`
    fn paragraph_selection(&self, index: usize) -> Option<Selection> {
        let (start, end) = self.selection()?;
        if index < start.paragraph || index > end.paragraph {
            return None;
        }
        let paragraph = self.paragraphs.get(index)?;
        let from = if index == start.paragraph {
            start.cursor
        } else {
            paragraph.cursor_at_start().ok()?
        };
        let to = if index == end.paragraph {
            end.cursor
        } else {
            paragraph.cursor_at_end().ok()?
        };
        Some(Selection::new(from, to))
    }

    /// Selected text; paragraphs are separated by a newline
    pub fn selected_text(&self, as_markdown: bool) -> String {
        let Some((start, end)) = self.selection() else {
            return String::new();
        };
        (start.paragraph..=end.paragraph)
            .filter_map(|index| {
                let selection = self.paragraph_selection(index)?;
                Some(self.paragraphs[index].selected_text(&selection, as_markdown))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Track the link under the pointer. Returns true when the hovered link
    /// changed and the view needs to be redrawn.
    pub fn hover(&mut self, x: f32, y: f32) -> bool {
        let hovered = self.paragraphs.iter().enumerate().find_map(|(index, paragraph)| {
            let run = paragraph.run_at(x, y)?;
            let text = paragraph.items().get(run)?.as_text()?;
            text.style.link.as_ref().map(|_| (index, run))
        });

        let changed = match (self.hovered, hovered) {
            (Some((a_paragraph, a_run)), Some((b_paragraph, b_run))) => {
                a_paragraph != b_paragraph
                    || !self.paragraphs[a_paragraph]
                        .linked_runs(a_run)
                        .contains(&b_run)
            }
            (None, None) => false,
            _ => true,
        };
        self.hovered = hovered;
        changed
    }

    /// Target of the hovered link, if any
    pub fn hovered_link(&self) -> Option<&str> {
        let (paragraph, run) = self.hovered?;
        self.paragraphs
            .get(paragraph)?
            .items()
            .get(run)?
            .as_text()?
            .style
            .link
            .as_deref()
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        let Some(bounds) = self.bounds else {
            return;
        };
        ctx.push_clip(bounds.x, bounds.y, bounds.width, self.content_height);

        for (index, paragraph) in self.paragraphs.iter().enumerate() {
            let state = DrawState {
                selection: self.paragraph_selection(index),
                hovered_run: self
                    .hovered
                    .filter(|(hovered, _)| *hovered == index)
                    .map(|(_, run)| run),
                ..Default::default()
            };
            paragraph.draw(ctx, &state);
        }

        // Caret
        if let Some((start, end)) = self.selection() {
            if start == end {
                if let Some((x, y, height)) = self
                    .paragraphs
                    .get(end.paragraph)
                    .and_then(|paragraph| paragraph.cursor_position(end.cursor, &*ctx))
                {
                    ctx.set_color(self.config.text_color);
                    ctx.draw_line(x, y, x, y + height);
                }
            }
        }

        ctx.pop_clip();
    }
}
