// Markdown Converter
// Turns markdown text into flowable paragraphs of styled runs

use super::paragraph::Paragraph;
use super::run::{Inline, TextStyle};
use crate::config::MarkdownConfig;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Scale modifier applied to a heading paragraph
pub fn heading_scale(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => 2.0,
        HeadingLevel::H2 => 1.75,
        HeadingLevel::H3 => 1.5,
        HeadingLevel::H4 => 1.25,
        HeadingLevel::H5 | HeadingLevel::H6 => 1.0,
    }
}

/// Convert markdown text to paragraphs, ready to be laid out.
///
/// Block structure is flattened: headings, list items, block quotes and code
/// blocks all become paragraphs. A hard line break ends the paragraph and the
/// text after it continues in a new paragraph without spacing in between.
pub fn markdown_to_paragraphs(markdown: &str, config: &MarkdownConfig) -> Vec<Paragraph> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_WIKILINKS);

    let mut builder = ParagraphBuilder::new(config);
    for event in Parser::new_ext(markdown, options) {
        builder.handle(event);
    }
    builder.flush();

    log::debug!("Converted markdown into {} paragraphs", builder.paragraphs.len());
    builder.paragraphs
}

struct ParagraphBuilder<'a> {
    config: &'a MarkdownConfig,
    paragraphs: Vec<Paragraph>,
    items: Vec<Inline>,
    style_stack: Vec<TextStyle>,
    scale: f32,
    /// Next number of each open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    code_block: Option<String>,
    continues_previous: bool,
}

impl<'a> ParagraphBuilder<'a> {
    fn new(config: &'a MarkdownConfig) -> Self {
        ParagraphBuilder {
            config,
            paragraphs: Vec::new(),
            items: Vec::new(),
            style_stack: vec![TextStyle::default()],
            scale: 1.0,
            lists: Vec::new(),
            code_block: None,
            continues_previous: false,
        }
    }

    fn style(&self) -> TextStyle {
        self.style_stack.last().cloned().unwrap_or_default()
    }

    fn push_style(&mut self, change: impl FnOnce(&mut TextStyle)) {
        let mut style = self.style();
        change(&mut style);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn push_text(&mut self, text: &str, style: TextStyle) {
        if !text.is_empty() {
            self.items.push(Inline::text(text, style));
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code_block.as_mut() {
                    code.push_str(&text);
                } else {
                    let style = self.style();
                    self.push_text(&text, style);
                }
            }
            Event::Code(code) => {
                let mut style = self.style();
                style.code = true;
                self.push_text(&code, style);
            }
            Event::SoftBreak => self.items.push(Inline::SoftBreak),
            Event::HardBreak => {
                self.flush();
                self.continues_previous = true;
            }
            Event::TaskListMarker(checked) => {
                let style = self.style();
                self.push_text(if checked { "[x] " } else { "[ ] " }, style);
            }
            Event::Rule => self.flush(),
            Event::Html(html) | Event::InlineHtml(html) => {
                // Only underline tags carry meaning for the runs
                let html = html.trim();
                if html == "<u>" || html.starts_with("<u ") {
                    self.push_style(|style| style.underline = true);
                } else if html == "</u>" {
                    self.pop_style();
                }
            }
            _ => {
                // Footnotes, math and the like are not rendered
            }
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.scale = heading_scale(level);
                self.push_style(|style| style.bold = true);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.push_style(|style| style.italic = true);
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let prefix = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let prefix = format!("{number}. ");
                        *number += 1;
                        prefix
                    }
                    _ => "• ".to_string(),
                };
                let style = self.style();
                self.push_text(&prefix, style);
            }
            Tag::Emphasis => self.push_style(|style| style.italic = true),
            Tag::Strong => self.push_style(|style| style.bold = true),
            Tag::Strikethrough => self.push_style(|style| style.strikethrough = true),
            Tag::Link { dest_url, .. } => {
                let target = dest_url.to_string();
                self.push_style(|style| {
                    style.underline = true;
                    style.link = Some(target);
                });
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Item => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
                self.scale = 1.0;
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.pop_style();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code_block.take() {
                    self.push_code_block(&code);
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            _ => {}
        }
    }

    /// One paragraph with a line per code line. Blank lines keep an empty run
    /// so every line has geometry for hit-testing.
    fn push_code_block(&mut self, code: &str) {
        let style = TextStyle {
            code: true,
            ..self.style()
        };
        for (index, line) in code.trim_end_matches('\n').split('\n').enumerate() {
            if index > 0 {
                self.items.push(Inline::SoftBreak);
            }
            self.items.push(Inline::text(line, style.clone()));
        }

        let mut config = self.config.clone();
        config.paragraph.soft_break_is_newline = true;
        self.finish_paragraph(config);
    }

    fn flush(&mut self) {
        self.finish_paragraph(self.config.clone());
    }

    fn finish_paragraph(&mut self, config: MarkdownConfig) {
        let items = std::mem::take(&mut self.items);
        let has_text = items
            .iter()
            .any(|item| item.as_text().is_some_and(|run| !run.text.trim().is_empty()));
        if !has_text {
            return;
        }

        let mut paragraph = Paragraph::new(config, items);
        paragraph.set_scale_modifier(self.scale);
        paragraph.set_continues_previous(std::mem::take(&mut self.continues_previous));
        self.paragraphs.push(paragraph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::run::TextRun;

    fn convert(markdown: &str) -> Vec<Paragraph> {
        markdown_to_paragraphs(markdown, &MarkdownConfig::default())
    }

    fn runs(paragraph: &Paragraph) -> Vec<TextRun> {
        paragraph.text_runs().map(|(_, run)| run.clone()).collect()
    }

    #[test]
    fn test_paragraphs_with_inline_styles() {
        let paragraphs = convert("Hello *world* and **bold**\n\nSecond");
        assert_eq!(paragraphs.len(), 2);

        let first = runs(&paragraphs[0]);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0].text, "Hello ");
        assert_eq!(first[0].style, TextStyle::plain());
        assert_eq!(first[1].text, "world");
        assert!(first[1].style.italic);
        assert_eq!(first[3].text, "bold");
        assert!(first[3].style.bold);

        assert_eq!(paragraphs[1].plain_text(), "Second");
        assert!(!paragraphs[1].continues_previous());
    }

    #[test]
    fn test_nested_styles_combine() {
        let paragraphs = convert("**bold *both* ~~gone~~**");
        let runs = runs(&paragraphs[0]);
        assert!(runs[1].style.bold && runs[1].style.italic);
        assert!(runs[3].style.bold && runs[3].style.strikethrough);
        assert!(!runs[3].style.italic);
    }

    #[test]
    fn test_heading_scale_and_weight() {
        let paragraphs = convert("# Title\n\n### Small\n\ntext");
        assert_eq!(paragraphs[0].scale_modifier(), 2.0);
        assert_eq!(paragraphs[1].scale_modifier(), 1.5);
        assert_eq!(paragraphs[2].scale_modifier(), 1.0);
        let title = runs(&paragraphs[0]);
        assert!(title[0].style.bold);
        assert_eq!(title[0].scale, 2.0);
        assert!(!runs(&paragraphs[2])[0].style.bold);
    }

    #[test]
    fn test_list_items_get_prefixes() {
        let bullets = convert("- one\n- two");
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0].plain_text(), "• one");
        assert_eq!(bullets[1].plain_text(), "• two");

        let numbered = convert("3. a\n4. b");
        assert_eq!(numbered[0].plain_text(), "3. a");
        assert_eq!(numbered[1].plain_text(), "4. b");
    }

    #[test]
    fn test_links_and_wikilinks() {
        let paragraphs = convert("[docs](https://example.com/docs) and [[Page]]");
        let runs = runs(&paragraphs[0]);
        assert_eq!(runs[0].text, "docs");
        assert_eq!(runs[0].style.link.as_deref(), Some("https://example.com/docs"));
        assert!(runs[0].style.underline);
        assert_eq!(runs[1].style.link, None);
        assert_eq!(runs[2].text, "Page");
        assert_eq!(runs[2].style.link.as_deref(), Some("Page"));
    }

    #[test]
    fn test_inline_code() {
        let paragraphs = convert("run `cargo` now");
        let runs = runs(&paragraphs[0]);
        assert_eq!(runs[1].text, "cargo");
        assert!(runs[1].style.code);
    }

    #[test]
    fn test_soft_break_is_kept() {
        let paragraphs = convert("first\nsecond");
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].source()[1], Inline::SoftBreak);
    }

    #[test]
    fn test_hard_break_starts_continuation() {
        let paragraphs = convert("line one  \nline two");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].plain_text(), "line one");
        assert_eq!(paragraphs[1].plain_text(), "line two");
        assert!(paragraphs[1].continues_previous());
        assert!(
            paragraphs
                .iter()
                .flat_map(|paragraph| paragraph.source())
                .all(|item| *item != Inline::HardBreak)
        );
    }

    #[test]
    fn test_code_block_uses_newline_breaks() {
        let paragraphs = convert("```\nfn main\n\nend\n```");
        assert_eq!(paragraphs.len(), 1);
        let code = &paragraphs[0];
        assert!(code.config().paragraph.soft_break_is_newline);
        assert_eq!(code.plain_text(), "fn main\n\nend");
        assert!(code.text_runs().all(|(_, run)| run.style.code));
        assert_eq!(code.text_runs().count(), 3);
    }

    #[test]
    fn test_block_quote_is_italic() {
        let paragraphs = convert("> quoted");
        assert!(runs(&paragraphs[0])[0].style.italic);
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        assert!(convert("").is_empty());
        assert!(convert("---\n\n<!-- note -->").is_empty());
    }
}
