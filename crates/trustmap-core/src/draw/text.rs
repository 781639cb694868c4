//! Text measurement, wrapping and rendering.
//!
//! Labels are measured with the glyph metrics of an embedded Noto Sans face
//! through cosmic-text and broken into lines that fit a maximum pixel width.
//! Host fonts are never consulted, so wrapping is identical on every machine. A label becomes a [`TextBlock`]
//! which renders as a single SVG `<text>` element with one `<tspan>` per line.
//!
//! # Quick Start
//!
//! ```
//! # use trustmap_core::draw::{TextAnchor, TextBlock, TextDefinition};
//! let style = TextDefinition::new();
//! let block = TextBlock::wrapped(&style, "Customer database", 60.0);
//! assert!(block.line_count() >= 1);
//!
//! let svg = block.render(&style, 100.0, 50.0, TextAnchor::Middle);
//! assert!(svg.to_string().contains("Customer"));
//! ```

use std::sync::{Mutex, OnceLock, PoisonError};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, fontdb};
use log::info;
use svg::{node::Text as SvgText, node::element as svg_element};

use crate::{color::Color, geometry::Size};

/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.4;

/// The only font used for measuring and rasterizing text.
pub const EMBEDDED_FONT: &[u8] = include_bytes!("../../fonts/NotoSans-Regular.ttf");

/// Family name of [`EMBEDDED_FONT`].
pub const EMBEDDED_FONT_FAMILY: &str = "Noto Sans";

/// A font database holding only the embedded face, with every generic
/// family resolving to it.
pub fn font_database() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_font_data(EMBEDDED_FONT.to_vec());
    db.set_serif_family(EMBEDDED_FONT_FAMILY);
    db.set_sans_serif_family(EMBEDDED_FONT_FAMILY);
    db.set_monospace_family(EMBEDDED_FONT_FAMILY);
    db.set_cursive_family(EMBEDDED_FONT_FAMILY);
    db.set_fantasy_family(EMBEDDED_FONT_FAMILY);
    db
}

/// Horizontal alignment of a text block relative to its anchor x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

impl TextAnchor {
    /// Returns the SVG `text-anchor` value.
    pub fn to_svg_value(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Visual style for diagram text.
///
/// | Property | Default |
/// |----------|---------|
/// | Font family | `"Noto Sans"` |
/// | Font size | `11` |
/// | Text color | `None` (SVG default, black) |
#[derive(Debug, Clone)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
    color: Option<Color>,
}

impl TextDefinition {
    /// Creates a new text definition with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size in pixels.
    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    /// Sets the font family name (e.g. "Noto Sans", "sans-serif").
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    /// Sets the fill color; `None` keeps the SVG default.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    /// Returns a copy of this definition with the given fill color.
    pub fn with_color(&self, color: Color) -> Self {
        let mut def = self.clone();
        def.set_color(Some(color));
        def
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    /// Vertical distance between consecutive lines.
    pub fn line_height(&self) -> f32 {
        self.font_size as f32 * LINE_HEIGHT_FACTOR
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: EMBEDDED_FONT_FAMILY.to_string(),
            font_size: 11,
            color: None,
        }
    }
}

/// Measures the rendered width of a single line of text.
pub fn measure_line(text: &str, definition: &TextDefinition) -> f32 {
    TEXT_MANAGER
        .get_or_init(TextManager::new)
        .line_width(text, definition)
}

/// Breaks `text` into lines no wider than `max_width` using font metrics.
///
/// See [`wrap_with`] for the line-breaking rules.
pub fn wrap_text(text: &str, definition: &TextDefinition, max_width: f32) -> Vec<String> {
    wrap_with(text, max_width, |line| measure_line(line, definition))
}

/// Breaks `text` into lines no wider than `max_width` according to `measure`.
///
/// - Explicit line breaks (`\n`, `\r\n`) always end a line; blank lines are dropped.
/// - Words are packed greedily, separated by single spaces.
/// - A word wider than `max_width` on its own is hard-broken at the longest
///   prefix that fits, found by binary search over character boundaries.
///   Every line holds at least one character.
/// - A non-positive `max_width` disables wrapping.
///
/// # Examples
///
/// ```
/// # use trustmap_core::draw::wrap_with;
/// // Every character is 10 pixels wide.
/// let lines = wrap_with("aa bb cc", 50.0, |s| s.chars().count() as f32 * 10.0);
/// assert_eq!(lines, vec!["aa bb", "cc"]);
/// ```
pub fn wrap_with(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            continue;
        }
        if max_width <= 0.0 {
            lines.push(paragraph.trim().to_string());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            // Hard-break an oversized word; the remainder starts the next line
            let mut rest = word;
            while measure(rest) > max_width {
                let split = longest_fitting_prefix(rest, max_width, &measure);
                lines.push(rest[..split].to_string());
                rest = &rest[split..];
            }
            current = rest.to_string();
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Byte offset of the end of the longest prefix of `word` that fits in
/// `max_width`, never less than one character.
fn longest_fitting_prefix(word: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> usize {
    let boundaries: Vec<usize> = word
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();

    // Invariant: boundaries[lo] is accepted, everything above hi is rejected
    let mut lo = 0;
    let mut hi = boundaries.len() - 1;
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if measure(&word[..boundaries[mid]]) <= max_width {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    boundaries[lo]
}

/// A label broken into lines, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    lines: Vec<String>,
    line_height: f32,
    width: f32,
}

impl TextBlock {
    /// Wraps `content` to `max_width` and measures the result.
    pub fn wrapped(definition: &TextDefinition, content: &str, max_width: f32) -> Self {
        let lines = wrap_text(content, definition, max_width);
        Self::from_lines(definition, lines)
    }

    /// Builds a block from explicit line breaks only.
    pub fn unwrapped(definition: &TextDefinition, content: &str) -> Self {
        Self::wrapped(definition, content, 0.0)
    }

    fn from_lines(definition: &TextDefinition, lines: Vec<String>) -> Self {
        let width = lines
            .iter()
            .map(|line| measure_line(line, definition))
            .fold(0.0, f32::max);
        Self {
            lines,
            line_height: definition.line_height(),
            width,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Width of the widest line and total height of all lines.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.lines.len() as f32 * self.line_height)
    }

    /// Renders the block horizontally aligned on `x` and vertically centered on `center_y`.
    pub fn render(
        &self,
        definition: &TextDefinition,
        x: f32,
        center_y: f32,
        anchor: TextAnchor,
    ) -> svg_element::Text {
        let first_line_y = center_y - self.size().height() / 2.0 + self.line_height / 2.0;
        let mut text = self.text_element(definition, anchor).set("dominant-baseline", "central");

        for (index, line) in self.lines.iter().enumerate() {
            let tspan = svg_element::TSpan::new("")
                .set("x", x)
                .set("y", first_line_y + index as f32 * self.line_height)
                .add(SvgText::new(line.as_str()));
            text = text.add(tspan);
        }

        text
    }

    /// Renders the block with its first line hanging from `top`.
    pub fn render_hanging(
        &self,
        definition: &TextDefinition,
        x: f32,
        top: f32,
        anchor: TextAnchor,
    ) -> svg_element::Text {
        let mut text = self.text_element(definition, anchor).set("dominant-baseline", "hanging");

        for (index, line) in self.lines.iter().enumerate() {
            let tspan = svg_element::TSpan::new("")
                .set("x", x)
                .set("y", top + index as f32 * self.line_height)
                .add(SvgText::new(line.as_str()));
            text = text.add(tspan);
        }

        text
    }

    fn text_element(&self, definition: &TextDefinition, anchor: TextAnchor) -> svg_element::Text {
        let mut text = svg_element::Text::new("")
            .set("text-anchor", anchor.to_svg_value())
            .set("font-family", definition.font_family())
            .set("font-size", definition.font_size());

        if let Some(color) = definition.color() {
            text = text
                .set("fill", color.to_string())
                .set("fill-opacity", color.alpha());
        }
        text
    }
}

/// TextManager handles text measurement and font operations.
/// It keeps one FontSystem over the embedded font for the process.
struct TextManager {
    font_system: Mutex<FontSystem>,
}

impl TextManager {
    fn new() -> Self {
        info!(family = EMBEDDED_FONT_FAMILY; "Initializing FontSystem");
        let font_system = FontSystem::new_with_locale_and_db("en-US".to_string(), font_database());
        Self {
            font_system: Mutex::new(font_system),
        }
    }

    /// Width in pixels of `text` laid out on a single line.
    fn line_width(&self, text: &str, text_def: &TextDefinition) -> f32 {
        if text.trim().is_empty() {
            return 0.0;
        }

        // A panic while measuring leaves the font system usable
        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let font_size_px = text_def.font_size() as f32;
        let metrics = Metrics::new(font_size_px, text_def.line_height());

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        // Any family name resolves to the embedded face
        let attrs = Attrs::new().family(Family::Name(text_def.font_family()));

        // Unbounded width keeps the text on one line
        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        buffer
            .layout_runs()
            .filter_map(|run| run.glyphs.last().map(|last| last.x + last.w))
            .fold(0.0, f32::max)
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();
