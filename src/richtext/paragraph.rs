// Paragraph Layout
// Greedy line wrapping of styled runs with word and character splitting,
// soft break handling, link grouping across soft breaks and centering

use super::link_group::{LinkGroupId, LinkGroups};
use super::run::{Inline, TextRun};
use super::selection::Selection;
use crate::config::MarkdownConfig;
use crate::draw_context::{DrawContext, TextMetrics};
use crate::error::LayoutError;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margin {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Box occupied by a laid out paragraph. The height includes both margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
}

impl Layout {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.y && y <= self.bottom()
    }
}

/// One visual row of a laid out paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub text: String,
}

/// Per-draw state handed down by the owning view
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawState {
    pub x_shift: f32,
    pub y_shift: f32,
    pub selection: Option<Selection>,
    /// Run under the pointer; its whole link group is highlighted
    pub hovered_run: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    pub(crate) config: MarkdownConfig,
    /// Items as handed in by the producer; never modified by layout
    source: Vec<Inline>,
    /// Items produced by the last layout pass
    pub(crate) items: Vec<Inline>,
    scale_modifier: f32,
    insert_space_before: bool,
    insert_space_after: bool,
    /// Continues the previous paragraph after a hard break, without spacing
    pub(crate) continues_previous: bool,
    layout: Option<Layout>,
    overlay_color: u32,
}

impl Paragraph {
    pub fn new(config: MarkdownConfig, items: Vec<Inline>) -> Self {
        Paragraph {
            config,
            items: items.clone(),
            source: items,
            scale_modifier: 1.0,
            insert_space_before: true,
            insert_space_after: true,
            continues_previous: false,
            layout: None,
            overlay_color: random_overlay_color(),
        }
    }

    pub fn config(&self) -> &MarkdownConfig {
        &self.config
    }

    pub fn source(&self) -> &[Inline] {
        &self.source
    }

    /// Items of the last layout pass, or the source items before the first one
    pub fn items(&self) -> &[Inline] {
        &self.items
    }

    pub fn text_runs(&self) -> impl Iterator<Item = (usize, &TextRun)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_text().map(|run| (index, run)))
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn scale_modifier(&self) -> f32 {
        self.scale_modifier
    }

    /// Scale every run of this paragraph (used for headings)
    pub fn set_scale_modifier(&mut self, scale: f32) {
        self.scale_modifier = scale;
        for item in self.source.iter_mut().chain(self.items.iter_mut()) {
            if let Some(run) = item.as_text_mut() {
                run.scale = scale;
            }
        }
    }

    pub fn set_insert_space_before(&mut self, insert: bool) {
        self.insert_space_before = insert;
    }

    pub fn set_insert_space_after(&mut self, insert: bool) {
        self.insert_space_after = insert;
    }

    pub fn continues_previous(&self) -> bool {
        self.continues_previous
    }

    /// Mark this paragraph as the continuation of the previous one after a
    /// hard line break
    pub fn set_continues_previous(&mut self, continues: bool) {
        self.continues_previous = continues;
    }

    /// Lay out the source items at (x, y) inside `width`.
    ///
    /// The new run list replaces the previous one only when the whole pass
    /// succeeds; on error the paragraph keeps its last good layout.
    pub fn layout_at(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        metrics: &dyn TextMetrics,
    ) -> Result<Layout, LayoutError> {
        let paragraph = self.config.paragraph;
        let width = width.max(0.0);
        let margin_top = if self.insert_space_before {
            paragraph.space_before
        } else {
            0.0
        };
        let margin_bottom = if self.insert_space_after {
            paragraph.space_after
        } else {
            0.0
        };
        let line_advance = metrics.line_height(self.scale_modifier) + paragraph.space_between_lines;

        let mut flow = Flow::new(metrics, x, y + margin_top, width, line_advance);
        let mut groups = LinkGroups::new();
        // Group to hand to the source item following a soft break
        let mut pending_group: Option<(usize, LinkGroupId)> = None;

        for (index, item) in self.source.iter().enumerate() {
            match item {
                Inline::SoftBreak if paragraph.soft_break_is_newline => {
                    // A line closed by wrapping already ended where this break would
                    if !flow.wrapped {
                        flow.goto_next_line();
                    }
                    flow.wrapped = false;
                    flow.items.push(Inline::SoftBreak);
                }
                Inline::SoftBreak => {
                    let previous_style = flow
                        .last_text()
                        .map(|run| run.style.clone())
                        .unwrap_or_default();
                    let mut space = TextRun::new(" ", previous_style);
                    space.scale = self.scale_modifier;
                    space.source = index;

                    let join = match (flow.items.last(), self.source.get(index + 1)) {
                        (Some(Inline::Text(previous)), Some(Inline::Text(next)))
                            if previous.style == next.style =>
                        {
                            Some((previous.link_group, next.link_group))
                        }
                        _ => None,
                    };
                    if let Some((previous_group, next_group)) = join {
                        // A collapsed soft break must not interrupt a link
                        let group = groups.merge(previous_group, next_group);
                        flow.join_last_source(group);
                        space.link_group = Some(group);
                        pending_group = Some((index + 1, group));
                    }

                    let (space_width, _) = space.measure(metrics);
                    if space_width > flow.width_remaining && !flow.current_line.is_empty() {
                        // Trimmed to nothing at the start of the next line
                        flow.goto_next_line();
                    }
                    flow.place(space, space_width);
                    if flow.width_remaining <= 0.0 {
                        flow.goto_next_line();
                    }
                    flow.trim_next_text = true;
                }
                Inline::HardBreak => return Err(LayoutError::UnsupportedHardBreak { index }),
                Inline::Text(run) => {
                    let mut target = run.clone();
                    target.source = index;
                    if let Some((pending_index, group)) = pending_group {
                        if pending_index == index {
                            target.link_group = Some(group);
                            pending_group = None;
                        }
                    }
                    flow.fit(target)?;
                }
            }
        }

        let Flow {
            mut items,
            mut lines,
            current_line,
            y: final_y,
            ..
        } = flow;

        // A line filled to the edge has already advanced y past itself
        let last_line_y = if current_line.is_empty() && !lines.is_empty() {
            final_y - line_advance
        } else {
            final_y
        };
        if !current_line.is_empty() {
            lines.push(current_line);
        }

        if paragraph.centered {
            center_lines(&mut items, &lines, width);
        }

        for item in &mut items {
            if let Some(run) = item.as_text_mut() {
                run.link_group = run.link_group.map(|group| groups.find(group));
            }
        }

        let height = last_line_y - y + metrics.line_height(self.scale_modifier) + margin_bottom;
        let layout = Layout {
            x,
            y,
            width,
            height,
            margin: Margin {
                left: 0.0,
                top: margin_top,
                right: 0.0,
                bottom: margin_bottom,
            },
        };

        log::debug!(
            "Laid out paragraph: {} source items into {} runs on {} lines, height {}",
            self.source.len(),
            items.len(),
            lines.len(),
            height
        );

        self.items = items;
        self.layout = Some(layout);
        Ok(layout)
    }

    /// Indices of every run in the link group of `run`, in paragraph order.
    /// Runs without a group form a group of their own.
    pub fn linked_runs(&self, run: usize) -> Vec<usize> {
        let Some(group) = self
            .items
            .get(run)
            .and_then(Inline::as_text)
            .and_then(|text| text.link_group)
        else {
            return vec![run];
        };

        self.text_runs()
            .filter(|(_, text)| text.link_group == Some(group))
            .map(|(index, _)| index)
            .collect()
    }

    /// Run whose box contains the point exactly
    pub fn run_at(&self, x: f32, y: f32) -> Option<usize> {
        self.text_runs()
            .find(|(_, run)| {
                x >= run.x && x < run.x + run.width && y >= run.y && y < run.y + run.height
            })
            .map(|(index, _)| index)
    }

    /// Visible text in reading order. Soft breaks kept as markers (newline
    /// mode) and hard breaks read as line breaks.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for item in &self.items {
            match item {
                Inline::Text(run) => text.push_str(&run.text),
                Inline::SoftBreak | Inline::HardBreak => text.push('\n'),
            }
        }
        text
    }

    /// Group laid out runs into visual rows
    pub fn visual_lines(&self) -> Vec<VisualLine> {
        let mut lines: Vec<VisualLine> = Vec::new();
        for (_, run) in self.text_runs() {
            match lines.last_mut() {
                Some(line) if line.y == run.y => {
                    line.width += run.width;
                    line.text.push_str(&run.text);
                }
                _ => lines.push(VisualLine {
                    x: run.x,
                    y: run.y,
                    width: run.width,
                    text: run.text.clone(),
                }),
            }
        }
        lines
    }

    fn run_color(&self, run: &TextRun) -> u32 {
        run.style.color.unwrap_or(if run.style.link.is_some() {
            self.config.link_color
        } else if run.style.code {
            self.config.code_color
        } else {
            self.config.text_color
        })
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext, state: &DrawState) {
        let hovered = state
            .hovered_run
            .map(|run| self.linked_runs(run))
            .unwrap_or_default();

        for (index, run) in self.text_runs() {
            let x = run.x + state.x_shift;
            let y = run.y + state.y_shift;

            if hovered.contains(&index) {
                ctx.set_color(self.config.link_hover_background);
                ctx.draw_rect_filled(x, y, run.width, run.height);
            }

            if let Some((start, end)) = state
                .selection
                .and_then(|selection| selection.range_in_run(index, run))
            {
                if end > start {
                    let before = run.prefix_width(char_to_byte(&run.text, start), &*ctx);
                    let until = run.prefix_width(char_to_byte(&run.text, end), &*ctx);
                    ctx.set_color(self.config.selection_color);
                    ctx.draw_rect_filled(x + before, y, until - before, run.height);
                }
            }

            ctx.set_color(self.run_color(run));
            ctx.draw_text(&run.formatted_text(), x, y, run.scale);
        }

        if self.config.debug_overlay {
            if let Some(layout) = self.layout {
                ctx.set_color(self.overlay_color);
                ctx.draw_rect_filled(
                    layout.x + state.x_shift,
                    layout.y + state.y_shift,
                    layout.width,
                    layout.height,
                );
            }
        }
    }
}

/// Byte offset of the `offset`-th character, clamped to the end of `text`
pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// State of one layout pass
struct Flow<'a> {
    metrics: &'a dyn TextMetrics,
    origin_x: f32,
    width: f32,
    line_advance: f32,
    x: f32,
    y: f32,
    width_remaining: f32,
    /// Set at the start of a line and after a collapsed soft break
    trim_next_text: bool,
    /// The current line was opened by wrapping and holds no runs yet
    wrapped: bool,
    items: Vec<Inline>,
    /// Indices into `items` of the runs on each finished line
    lines: Vec<Vec<usize>>,
    current_line: Vec<usize>,
}

impl<'a> Flow<'a> {
    fn new(metrics: &'a dyn TextMetrics, x: f32, y: f32, width: f32, line_advance: f32) -> Self {
        Flow {
            metrics,
            origin_x: x,
            width,
            line_advance,
            x,
            y,
            width_remaining: width,
            trim_next_text: true,
            wrapped: false,
            items: Vec::new(),
            lines: Vec::new(),
            current_line: Vec::new(),
        }
    }

    fn goto_next_line(&mut self) {
        self.x = self.origin_x;
        self.y += self.line_advance;
        self.width_remaining = self.width;
        self.lines.push(std::mem::take(&mut self.current_line));
        self.trim_next_text = true;
        self.wrapped = true;
    }

    fn last_text(&self) -> Option<&TextRun> {
        self.items.iter().rev().find_map(Inline::as_text)
    }

    /// Put `run` into the group, along with the earlier fragments of its source item
    fn join_last_source(&mut self, group: LinkGroupId) {
        let Some(source) = self.last_text().map(|run| run.source) else {
            return;
        };
        for item in self.items.iter_mut().rev() {
            match item {
                Inline::Text(run) if run.source == source => run.link_group = Some(group),
                _ => break,
            }
        }
    }

    fn place(&mut self, mut run: TextRun, width: f32) {
        let width = if self.trim_next_text {
            // No spaces at the start of a line
            run.trim();
            run.measure(self.metrics).0
        } else {
            width
        };

        run.x = self.x;
        run.y = self.y;
        run.width = width;
        run.height = self.metrics.line_height(run.scale);

        self.width_remaining -= width;
        self.x += width;
        self.trim_next_text = false;
        self.wrapped = false;
        self.current_line.push(self.items.len());
        self.items.push(Inline::Text(run));
    }

    /// Place a text run, splitting it across as many lines as needed
    fn fit(&mut self, mut target: TextRun) -> Result<(), LayoutError> {
        loop {
            if self.trim_next_text {
                target.trim();
            }
            let (target_width, _) = target.measure(self.metrics);

            if target_width <= self.width_remaining {
                self.place(target, target_width);
                if self.width_remaining <= 0.0 {
                    self.goto_next_line();
                }
                return Ok(());
            }

            if let Some((first, second)) = target.split(self.width_remaining, false, self.metrics)
            {
                log::trace!(
                    "Split {:?} into {:?} / {:?} at {}",
                    target.text,
                    first.text,
                    second.text,
                    self.width_remaining
                );
                let (first_width, _) = first.measure(self.metrics);
                self.place(first, first_width);
                self.goto_next_line();
                if second.text.trim().is_empty() {
                    // Would be trimmed away at the start of the line
                    return Ok(());
                }
                target = second;
                continue;
            }

            // Nothing fits on this line; a line without runs is already fresh
            if !self.current_line.is_empty() {
                self.goto_next_line();
            }

            if target_width > self.width {
                // Too wide for any line: split on the full width, breaking the
                // word when there is no boundary to split on
                let (first, second) = match target.split(self.width, false, self.metrics) {
                    Some(parts) => parts,
                    None => target.split(self.width, true, self.metrics).ok_or_else(|| {
                        LayoutError::ImpossibleSplit {
                            text: target.text.clone(),
                        }
                    })?,
                };
                log::trace!(
                    "Split oversized {:?} into {:?} / {:?}",
                    target.text,
                    first.text,
                    second.text
                );

                let (first_width, _) = first.measure(self.metrics);
                self.place(first, first_width);
                if second.text.trim().is_empty() {
                    if self.width_remaining <= 0.0 {
                        self.goto_next_line();
                    }
                    return Ok(());
                }
                self.goto_next_line();
                target = second;
                continue;
            }

            // Fits on the fresh line
            self.place(target, target_width);
            if self.width_remaining <= 0.0 {
                self.goto_next_line();
            }
            return Ok(());
        }
    }
}

/// Shift each line right by half of its free space
fn center_lines(items: &mut [Inline], lines: &[Vec<usize>], width: f32) {
    for line in lines {
        let total: f32 = line
            .iter()
            .filter_map(|&index| items[index].as_text())
            .map(|run| run.width)
            .sum();
        let shift = (width - total) / 2.0;
        for &index in line {
            if let Some(run) = items[index].as_text_mut() {
                run.x += shift;
            }
        }
    }
}

fn random_overlay_color() -> u32 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u8(0);
    let bits = hasher.finish() as u32;
    (bits & 0xFFFF_FF00) | 100
}
