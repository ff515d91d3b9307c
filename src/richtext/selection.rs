// Selection
// Cursor ranges inside a paragraph and retrieval of the selected text

use super::cursor::TextCursor;
use super::paragraph::{Paragraph, char_to_byte};
use super::run::{Inline, TextRun, TextStyle};
use regex::Regex;
use std::sync::LazyLock;

static MARKDOWN_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\\`*_\[\]<>#~])").expect("markdown escape pattern"));

/// An ordered range of cursors, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: TextCursor,
    pub end: TextCursor,
}

impl Selection {
    /// Selection between two cursors, in either order
    pub fn new(a: TextCursor, b: TextCursor) -> Self {
        if a <= b {
            Selection { start: a, end: b }
        } else {
            Selection { start: b, end: a }
        }
    }

    pub fn collapsed(cursor: TextCursor) -> Self {
        Selection {
            start: cursor,
            end: cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Selected character range of run `index`, if the selection touches it
    pub fn range_in_run(&self, index: usize, run: &TextRun) -> Option<(usize, usize)> {
        if index < self.start.run || index > self.end.run {
            return None;
        }
        let len = run.visible_len();
        let from = if index == self.start.run {
            self.start.offset.min(len)
        } else {
            0
        };
        let to = if index == self.end.run {
            self.end.offset.min(len)
        } else {
            len
        };
        Some((from, to.max(from)))
    }
}

impl Paragraph {
    pub fn select_all(&self) -> Option<Selection> {
        let start = self.cursor_at_start().ok()?;
        let end = self.cursor_at_end().ok()?;
        Some(Selection::new(start, end))
    }

    /// Selection covering every run of the link group of `run`
    pub fn link_selection(&self, run: usize) -> Option<Selection> {
        self.items.get(run)?.as_text()?;
        let linked = self.linked_runs(run);
        let first = *linked.first()?;
        let last = *linked.last()?;
        let last_len = self.items.get(last)?.as_text()?.visible_len();
        Some(Selection::new(
            TextCursor::new(first, 0),
            TextCursor::new(last, last_len),
        ))
    }

    /// Text inside `selection`. As markdown, adjacent runs of one style are
    /// wrapped once and special characters are escaped.
    pub fn selected_text(&self, selection: &Selection, as_markdown: bool) -> String {
        let mut segments: Vec<(Option<&TextStyle>, String)> = Vec::new();

        for (index, item) in self.items.iter().enumerate() {
            if index < selection.start.run || index > selection.end.run {
                continue;
            }
            match item {
                Inline::Text(run) => {
                    let Some((from, to)) = selection.range_in_run(index, run) else {
                        continue;
                    };
                    if from == to {
                        continue;
                    }
                    let text =
                        &run.text[char_to_byte(&run.text, from)..char_to_byte(&run.text, to)];
                    let same_style = matches!(
                        segments.last(),
                        Some((Some(style), _)) if **style == run.style
                    );
                    match segments.last_mut() {
                        Some((_, existing)) if same_style => existing.push_str(text),
                        _ => segments.push((Some(&run.style), text.to_string())),
                    }
                }
                Inline::SoftBreak | Inline::HardBreak => segments.push((None, "\n".to_string())),
            }
        }

        segments
            .into_iter()
            .map(|(style, text)| match style {
                Some(style) if as_markdown => styled_markdown(&text, style),
                _ => text,
            })
            .collect()
    }
}

pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIAL.replace_all(text, r"\$1").into_owned()
}

/// Wrap `text` in the markdown markers of `style`. Surrounding whitespace is
/// kept outside the markers.
fn styled_markdown(text: &str, style: &TextStyle) -> String {
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];

    let mut result = if style.code {
        format!("`{core}`")
    } else {
        let mut result = escape_markdown(core);
        if style.strikethrough {
            result = format!("~~{result}~~");
        }
        if style.bold && style.italic {
            result = format!("***{result}***");
        } else if style.bold {
            result = format!("**{result}**");
        } else if style.italic {
            result = format!("*{result}*");
        }
        if style.underline && style.link.is_none() {
            result = format!("<u>{result}</u>");
        }
        result
    };

    if let Some(target) = &style.link {
        result = format!("[{result}]({target})");
    }

    format!("{leading}{result}{trailing}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MarkdownConfig, ParagraphConfig};
    use crate::draw_context::MonospaceMetrics;

    fn laid_out(items: Vec<Inline>, paragraph: ParagraphConfig) -> Paragraph {
        let config = MarkdownConfig {
            paragraph,
            ..Default::default()
        };
        let mut paragraph = Paragraph::new(config, items);
        paragraph
            .layout_at(0.0, 0.0, 100.0, &MonospaceMetrics::new(1.0))
            .unwrap();
        paragraph
    }

    fn sample() -> Paragraph {
        laid_out(
            vec![
                Inline::text("Read ", TextStyle::plain()),
                Inline::text("the", TextStyle::bold()),
                Inline::text(" docs", TextStyle::link("https://example.com")),
                Inline::SoftBreak,
                Inline::text("now", TextStyle::link("https://example.com")),
            ],
            ParagraphConfig::default(),
        )
    }

    #[test]
    fn new_orders_cursors() {
        let a = TextCursor::new(2, 1);
        let b = TextCursor::new(0, 4);
        let selection = Selection::new(a, b);
        assert_eq!(selection.start, b);
        assert_eq!(selection.end, a);
        assert!(Selection::collapsed(a).is_empty());
    }

    #[test]
    fn range_in_run_clamps_offsets() {
        let run = TextRun::plain("abc");
        let selection = Selection::new(TextCursor::new(1, 2), TextCursor::new(3, 9));
        assert_eq!(selection.range_in_run(0, &run), None);
        assert_eq!(selection.range_in_run(1, &run), Some((2, 3)));
        assert_eq!(selection.range_in_run(2, &run), Some((0, 3)));
        assert_eq!(selection.range_in_run(3, &run), Some((0, 3)));
        assert_eq!(selection.range_in_run(4, &run), None);
    }

    #[test]
    fn plain_selection_spans_runs() {
        let paragraph = sample();
        let selection = Selection::new(TextCursor::new(0, 2), TextCursor::new(2, 3));
        assert_eq!(paragraph.selected_text(&selection, false), "ad the do");
    }

    #[test]
    fn markdown_selection_merges_link_runs() {
        let paragraph = sample();
        let selection = paragraph.select_all().unwrap();
        assert_eq!(
            paragraph.selected_text(&selection, true),
            "Read **the** [docs now](https://example.com)"
        );
        assert_eq!(paragraph.selected_text(&selection, false), "Read the docs now");
    }

    #[test]
    fn markdown_escapes_special_characters() {
        let paragraph = laid_out(
            vec![
                Inline::text("2 * 3 [x] ", TextStyle::plain()),
                Inline::text("a_b", TextStyle::code()),
            ],
            ParagraphConfig::default(),
        );
        let selection = paragraph.select_all().unwrap();
        assert_eq!(
            paragraph.selected_text(&selection, true),
            r"2 \* 3 \[x\] `a_b`"
        );
    }

    #[test]
    fn newline_breaks_are_kept() {
        let paragraph = laid_out(
            vec![
                Inline::text("one", TextStyle::code()),
                Inline::SoftBreak,
                Inline::text("two", TextStyle::code()),
            ],
            ParagraphConfig {
                soft_break_is_newline: true,
                ..Default::default()
            },
        );
        let selection = paragraph.select_all().unwrap();
        assert_eq!(paragraph.selected_text(&selection, false), "one\ntwo");
        assert_eq!(paragraph.selected_text(&selection, true), "`one`\n`two`");
    }

    #[test]
    fn link_selection_covers_group() {
        let paragraph = sample();
        let selection = paragraph.link_selection(4).unwrap();
        assert_eq!(selection.start, TextCursor::new(2, 0));
        assert_eq!(selection.end, TextCursor::new(4, 3));
        assert_eq!(paragraph.selected_text(&selection, false), " docs now");

        let plain = paragraph.link_selection(0).unwrap();
        assert_eq!(paragraph.selected_text(&plain, false), "Read ");
        assert_eq!(paragraph.link_selection(17), None);
    }

    #[test]
    fn styled_markdown_keeps_whitespace_outside() {
        assert_eq!(styled_markdown(" bold ", &TextStyle::bold()), " **bold** ");
        assert_eq!(styled_markdown("   ", &TextStyle::bold()), "   ");
        let style = TextStyle {
            bold: true,
            italic: true,
            strikethrough: true,
            ..Default::default()
        };
        assert_eq!(styled_markdown("x", &style), "***~~x~~***");
        let underlined = TextStyle {
            underline: true,
            ..Default::default()
        };
        assert_eq!(styled_markdown("u", &underlined), "<u>u</u>");
    }
}
