// Drawing backend traits - abstracts over the host's font renderer and draw calls

/// Height of one line of text at scale 1.0.
pub const LINE_HEIGHT: f32 = 9.0;

/// Marker that starts a two-character formatting code (`§l`, `§o`, ...).
pub const FORMATTING_MARKER: char = '§';

/// Font metrics service used by layout and hit-testing.
///
/// Implementations must be deterministic: the same text at the same scale
/// always measures the same within one layout pass. Formatting codes
/// (`§` followed by one code character) take up no horizontal space.
pub trait TextMetrics {
    fn text_width(&self, text: &str, scale: f32) -> f32;

    fn line_height(&self, scale: f32) -> f32 {
        LINE_HEIGHT * scale
    }
}

pub trait DrawContext: TextMetrics {
    fn set_color(&mut self, color: u32);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, scale: f32);
    fn draw_rect_filled(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);
    fn push_clip(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn pop_clip(&mut self);
}

/// Iterate the visible characters of `text`, skipping formatting codes.
pub fn visible_chars(text: &str) -> impl Iterator<Item = char> + '_ {
    let mut chars = text.chars();
    std::iter::from_fn(move || {
        loop {
            let ch = chars.next()?;
            if ch == FORMATTING_MARKER {
                // The code character is swallowed with the marker
                chars.next();
                continue;
            }
            return Some(ch);
        }
    })
}

/// Fixed-advance metrics, close to the default bitmap font of the game client
/// (6 units per glyph at scale 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
}

impl MonospaceMetrics {
    pub fn new(advance: f32) -> Self {
        MonospaceMetrics { advance }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        MonospaceMetrics { advance: 6.0 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, scale: f32) -> f32 {
        visible_chars(text).count() as f32 * self.advance * scale
    }
}
