// Rich text flow: styled runs, paragraph layout, hit-testing and selection

pub mod cursor;
pub mod link_group;
pub mod markdown_converter;
pub mod markdown_view;
pub mod paragraph;
pub mod run;
pub mod selection;

pub use cursor::TextCursor;
pub use markdown_converter::markdown_to_paragraphs;
pub use markdown_view::{DocumentPosition, MarkdownView};
pub use paragraph::{DrawState, Layout, Margin, Paragraph, VisualLine};
pub use run::{Inline, TextRun, TextStyle};
pub use selection::Selection;
