// Run model
// Atomic styled text runs and the break markers between them

use super::link_group::LinkGroupId;
use crate::draw_context::{FORMATTING_MARKER, TextMetrics};
use unicode_segmentation::UnicodeSegmentation;

/// Text styling for a run.
///
/// Two runs with equal styles are indistinguishable on screen, which is what
/// lets the wrapping engine join them into one link group across a soft break.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    /// Explicit color; `None` falls back to the configured text, link or code color
    pub color: Option<u32>,
    pub link: Option<String>,
}

impl TextStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        TextStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        TextStyle {
            italic: true,
            ..Default::default()
        }
    }

    pub fn code() -> Self {
        TextStyle {
            code: true,
            ..Default::default()
        }
    }

    pub fn link(target: impl Into<String>) -> Self {
        TextStyle {
            underline: true,
            link: Some(target.into()),
            ..Default::default()
        }
    }

    /// Control codes the font renderer expects in front of the text
    pub fn formatting_prefix(&self) -> String {
        let mut prefix = String::new();
        for (enabled, code) in [
            (self.bold, 'l'),
            (self.italic, 'o'),
            (self.underline, 'n'),
            (self.strikethrough, 'm'),
        ] {
            if enabled {
                prefix.push(FORMATTING_MARKER);
                prefix.push(code);
            }
        }
        prefix
    }

    /// Number of leading characters in the formatted text that are not visible
    pub fn num_formatting_chars(&self) -> usize {
        self.formatting_prefix().chars().count()
    }
}

/// A run of text with uniform styling
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
    pub scale: f32,
    // Geometry, assigned by layout
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub link_group: Option<LinkGroupId>,
    /// Index of the source item this run (or fragment) was produced from
    pub(crate) source: usize,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
            scale: 1.0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            link_group: None,
            source: 0,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::plain())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length of the visible text in characters
    pub fn visible_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn formatted_text(&self) -> String {
        let mut formatted = self.style.formatting_prefix();
        formatted.push_str(&self.text);
        formatted
    }

    /// Rendered (width, height) at the run's scale
    pub fn measure<M: TextMetrics + ?Sized>(&self, metrics: &M) -> (f32, f32) {
        (
            self.prefix_width(self.text.len(), metrics),
            metrics.line_height(self.scale),
        )
    }

    /// Width of the visible text up to byte offset `end`
    pub(crate) fn prefix_width<M: TextMetrics + ?Sized>(&self, end: usize, metrics: &M) -> f32 {
        let mut formatted = self.style.formatting_prefix();
        formatted.push_str(&self.text[..end]);
        metrics.text_width(&formatted, self.scale)
    }

    /// Remove leading whitespace
    pub fn trim(&mut self) {
        let trimmed = self.text.trim_start();
        if trimmed.len() != self.text.len() {
            self.text = trimmed.to_string();
        }
    }

    /// Split so that the first part measures at most `at_width`.
    ///
    /// By default only whitespace boundaries are considered and `None` is
    /// returned when no boundary fits. With `break_words` the split happens at
    /// the widest grapheme boundary that fits, always taking at least one
    /// grapheme, so it only fails on an empty run. The second part may then
    /// be empty.
    pub fn split(
        &self,
        at_width: f32,
        break_words: bool,
        metrics: &dyn TextMetrics,
    ) -> Option<(TextRun, TextRun)> {
        let at = if break_words {
            self.grapheme_split_point(at_width, metrics)?
        } else {
            self.word_split_point(at_width, metrics)?
        };
        Some((self.fragment(&self.text[..at]), self.fragment(&self.text[at..])))
    }

    fn word_split_point(&self, at_width: f32, metrics: &dyn TextMetrics) -> Option<usize> {
        let mut best = None;
        for (i, ch) in self.text.char_indices() {
            if i == 0 || !ch.is_whitespace() {
                continue;
            }
            // Widths only grow with the prefix, so the first miss ends the search
            if self.prefix_width(i, metrics) > at_width {
                break;
            }
            best = Some(i);
        }
        best
    }

    fn grapheme_split_point(&self, at_width: f32, metrics: &dyn TextMetrics) -> Option<usize> {
        let mut best = None;
        for (i, grapheme) in self.text.grapheme_indices(true) {
            let end = i + grapheme.len();
            if best.is_some() && self.prefix_width(end, metrics) > at_width {
                break;
            }
            best = Some(end);
        }
        best
    }

    fn fragment(&self, text: &str) -> TextRun {
        TextRun {
            text: text.to_string(),
            style: self.style.clone(),
            scale: self.scale,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            link_group: self.link_group,
            source: self.source,
        }
    }
}

/// An item of a paragraph, as produced upstream and as laid out
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(TextRun),
    /// Collapses to a single space, or a new line in newline mode
    SoftBreak,
    /// Forced new line; not supported by the wrapping engine
    HardBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Inline::Text(TextRun::new(text, style))
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Inline::Text(run) => Some(run),
            Inline::SoftBreak | Inline::HardBreak => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextRun> {
        match self {
            Inline::Text(run) => Some(run),
            Inline::SoftBreak | Inline::HardBreak => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_context::MonospaceMetrics;

    fn metrics() -> MonospaceMetrics {
        MonospaceMetrics::new(1.0)
    }

    #[test]
    fn measure_ignores_formatting_prefix() {
        let run = TextRun::new("hello", TextStyle::bold());
        assert_eq!(run.formatted_text(), "§lhello");
        assert_eq!(run.measure(&metrics()), (5.0, 9.0));
    }

    #[test]
    fn measure_uses_scale() {
        let mut run = TextRun::plain("abc");
        run.scale = 2.0;
        assert_eq!(run.measure(&metrics()), (6.0, 18.0));
    }

    #[test]
    fn formatting_chars_count_codes() {
        let style = TextStyle {
            bold: true,
            strikethrough: true,
            ..Default::default()
        };
        assert_eq!(style.formatting_prefix(), "§l§m");
        assert_eq!(style.num_formatting_chars(), 4);
        assert_eq!(TextStyle::plain().num_formatting_chars(), 0);
    }

    #[test]
    fn split_on_word_boundary() {
        let run = TextRun::plain("hello big world");
        let (first, second) = run.split(11.0, false, &metrics()).unwrap();
        assert_eq!(first.text, "hello big");
        assert_eq!(second.text, " world");
    }

    #[test]
    fn split_without_boundary_fails() {
        let run = TextRun::plain("https://example.com/very/long");
        assert!(run.split(10.0, false, &metrics()).is_none());
        // The only boundary is beyond the width
        let run = TextRun::plain("abcdef gh");
        assert!(run.split(4.0, false, &metrics()).is_none());
    }

    #[test]
    fn split_never_produces_empty_first_word_fragment() {
        let run = TextRun::plain(" leading");
        assert!(run.split(3.0, false, &metrics()).is_none());
    }

    #[test]
    fn break_words_split() {
        let run = TextRun::plain("abcdefgh");
        let (first, second) = run.split(3.5, true, &metrics()).unwrap();
        assert_eq!(first.text, "abc");
        assert_eq!(second.text, "defgh");
    }

    #[test]
    fn break_words_takes_at_least_one_grapheme() {
        let run = TextRun::plain("ab");
        let (first, second) = run.split(0.5, true, &metrics()).unwrap();
        assert_eq!(first.text, "a");
        assert_eq!(second.text, "b");

        let run = TextRun::plain("x");
        let (first, second) = run.split(0.5, true, &metrics()).unwrap();
        assert_eq!(first.text, "x");
        assert!(second.is_empty());

        assert!(TextRun::plain("").split(10.0, true, &metrics()).is_none());
    }

    #[test]
    fn break_words_keeps_graphemes_intact() {
        let run = TextRun::plain("e\u{301}xyz");
        let (first, _) = run.split(1.0, true, &metrics()).unwrap();
        assert_eq!(first.text, "e\u{301}");
    }

    #[test]
    fn fragments_keep_style_and_group() {
        let mut run = TextRun::new("click here", TextStyle::link("https://example.com"));
        run.link_group = Some(LinkGroupId::new(4));
        let (first, second) = run.split(6.0, false, &metrics()).unwrap();
        assert_eq!(first.style, run.style);
        assert_eq!(second.style, run.style);
        assert_eq!(first.link_group, run.link_group);
        assert_eq!(second.link_group, run.link_group);
    }

    #[test]
    fn trim_is_idempotent() {
        let mut run = TextRun::plain("  world ");
        run.trim();
        assert_eq!(run.text, "world ");
        run.trim();
        assert_eq!(run.text, "world ");
    }
}
