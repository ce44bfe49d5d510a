//! Caret locator.
//!
//! Reproduces where a byte offset of a text surface would be painted by
//! laying the text out again in an off-screen mirror that shares the
//! surface's box model: content width, padding, border, font advances,
//! letter spacing, line height and white-space handling. The mirror holds
//! `text[..offset]` followed by a marker made of `text[offset..]` (or "."
//! when that is empty, so the marker always occupies a line). The marker's
//! position inside the mirror is then translated into viewport space using
//! the surface's bounding box and scroll offsets.
//!
//! Anchors are only valid for the render state they were computed from.
//! Callers recompute on every buffer, scroll, resize, or font change.

use crate::ui::input_metrics::{char_display_width, clamp_to_char_boundary_left};
use std::collections::HashMap;
use std::ops::Range;

/// Line height used when the style does not resolve to a pixel value.
pub const DEFAULT_LINE_HEIGHT: f32 = 20.0;
const MIRROR_MARKER: &str = ".";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub top: f32,
    pub left: f32,
    pub line_height: f32,
    /// Set when the surface could not be measured and the anchor fell back
    /// to the surface's top-left corner.
    pub degenerate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineHeight {
    Normal,
    Px(f32),
    Multiple(f32),
}

impl LineHeight {
    pub fn resolve(self, font_size: f32) -> f32 {
        let resolved = match self {
            Self::Normal => DEFAULT_LINE_HEIGHT,
            Self::Px(px) => px,
            Self::Multiple(factor) => factor * font_size,
        };
        if resolved.is_finite() && resolved > 0.0 {
            resolved
        } else {
            DEFAULT_LINE_HEIGHT
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Wrap at the content width, keep newlines and space runs.
    #[default]
    PreWrap,
    /// Keep newlines and space runs, never wrap.
    Pre,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: LineHeight,
    pub letter_spacing: f32,
    pub padding: Edges,
    pub border: Edges,
    /// Client width of the surface: content plus padding, without border.
    pub width: f32,
    pub white_space: WhiteSpace,
    pub tab_size: usize,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 14.0,
            line_height: LineHeight::Normal,
            letter_spacing: 0.0,
            padding: Edges::default(),
            border: Edges::default(),
            width: 0.0,
            white_space: WhiteSpace::PreWrap,
            tab_size: 8,
        }
    }
}

impl RenderStyle {
    pub fn content_width(&self) -> f32 {
        self.width - self.padding.left - self.padding.right
    }

    pub fn resolved_line_height(&self) -> f32 {
        self.line_height.resolve(self.font_size)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    pub top: f32,
    pub left: f32,
}

/// Everything about the live surface the mirror has to reproduce.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceGeometry {
    pub style: RenderStyle,
    pub bounding_box: Rect,
    pub scroll: ScrollOffset,
    pub page_scroll: ScrollOffset,
}

/// Whether the overlay is positioned against the viewport (`fixed`) or the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionMode {
    #[default]
    Viewport,
    Document,
}

pub trait GlyphMetrics {
    /// Horizontal advance of `ch` in surface units, before letter spacing.
    fn advance(&self, ch: char) -> f32;
}

/// Fixed-pitch font: every display cell has the same width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMetrics {
    pub cell_width: f32,
}

impl GlyphMetrics for MonospaceMetrics {
    fn advance(&self, ch: char) -> f32 {
        char_display_width(ch) as f32 * self.cell_width
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProportionalMetrics {
    pub default_advance: f32,
    pub advances: HashMap<char, f32>,
}

impl ProportionalMetrics {
    pub fn new(default_advance: f32) -> Self {
        Self {
            default_advance,
            advances: HashMap::new(),
        }
    }

    pub fn with_advance(mut self, ch: char, advance: f32) -> Self {
        self.advances.insert(ch, advance);
        self
    }
}

impl GlyphMetrics for ProportionalMetrics {
    fn advance(&self, ch: char) -> f32 {
        self.advances
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance)
    }
}

impl<M: GlyphMetrics + ?Sized> GlyphMetrics for &M {
    fn advance(&self, ch: char) -> f32 {
        (**self).advance(ch)
    }
}

/// Marker position inside the mirror, relative to the content box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorPosition {
    pub line: usize,
    pub x: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    Newline,
    Space,
    Word,
}

fn segment_of(ch: char) -> Segment {
    match ch {
        '\n' => Segment::Newline,
        ' ' | '\t' => Segment::Space,
        _ => Segment::Word,
    }
}

/// Off-screen replica of the surface's inline layout.
pub struct MirrorLayout<'a, M: GlyphMetrics> {
    style: &'a RenderStyle,
    metrics: &'a M,
}

impl<'a, M: GlyphMetrics> MirrorLayout<'a, M> {
    pub fn new(style: &'a RenderStyle, metrics: &'a M) -> Self {
        Self { style, metrics }
    }

    fn glyph_advance(&self, ch: char, x: f32) -> f32 {
        match ch {
            '\r' => 0.0,
            '\t' => {
                let stop = self.style.tab_size.max(1) as f32
                    * (self.metrics.advance(' ') + self.style.letter_spacing);
                if stop <= 0.0 {
                    return 0.0;
                }
                ((x / stop).floor() + 1.0) * stop - x
            }
            _ => self.metrics.advance(ch) + self.style.letter_spacing,
        }
    }

    /// Walks `text` char by char, handing `visit` the byte offset together with
    /// the line and x it would be painted at. `visit` returns `true` to stop.
    /// The end of the text is visited last. Returns `false` when the content
    /// box has no usable width.
    fn walk(&self, text: &str, mut visit: impl FnMut(usize, MirrorPosition) -> bool) -> bool {
        let content_width = self.style.content_width();
        if !content_width.is_finite() || content_width <= 0.0 {
            return false;
        }

        let wraps = self.style.white_space == WhiteSpace::PreWrap;
        let mut line = 0usize;
        let mut x = 0.0f32;
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut idx = 0usize;

        while idx < chars.len() {
            let (byte, ch) = chars[idx];
            match segment_of(ch) {
                Segment::Newline => {
                    if visit(byte, MirrorPosition { line, x }) {
                        return true;
                    }
                    line += 1;
                    x = 0.0;
                    idx += 1;
                }
                Segment::Space => {
                    // Trailing spaces hang past the edge instead of wrapping.
                    if visit(byte, MirrorPosition { line, x }) {
                        return true;
                    }
                    x += self.glyph_advance(ch, x);
                    idx += 1;
                }
                Segment::Word => {
                    let end = chars[idx..]
                        .iter()
                        .position(|(_, c)| segment_of(*c) != Segment::Word)
                        .map(|len| idx + len)
                        .unwrap_or(chars.len());
                    let word_width: f32 = chars[idx..end]
                        .iter()
                        .map(|(_, c)| self.glyph_advance(*c, 0.0))
                        .sum();
                    if wraps && x > 0.0 && x + word_width > content_width {
                        line += 1;
                        x = 0.0;
                    }
                    let break_inside = wraps && word_width > content_width;
                    for &(byte, ch) in &chars[idx..end] {
                        let advance = self.glyph_advance(ch, x);
                        if break_inside && x > 0.0 && x + advance > content_width {
                            line += 1;
                            x = 0.0;
                        }
                        if visit(byte, MirrorPosition { line, x }) {
                            return true;
                        }
                        x += advance;
                    }
                    idx = end;
                }
            }
        }

        visit(text.len(), MirrorPosition { line, x });
        true
    }

    /// Lays out `text[..offset]` plus the marker and returns where the marker starts.
    ///
    /// Returns `None` when the content box has no usable width.
    pub fn marker_position(&self, text: &str, offset: usize) -> Option<MirrorPosition> {
        let offset = clamp_to_char_boundary_left(text, offset);
        let marker = if offset < text.len() {
            &text[offset..]
        } else {
            MIRROR_MARKER
        };
        let mut mirror = String::with_capacity(offset + marker.len());
        mirror.push_str(&text[..offset]);
        mirror.push_str(marker);

        let mut found = None;
        let laid_out = self.walk(&mirror, |byte, position| {
            if byte == offset {
                found = Some(position);
                return true;
            }
            false
        });
        if laid_out {
            found
        } else {
            None
        }
    }

    /// Splits `text` into the visual lines the surface paints, as byte ranges.
    /// Newlines are excluded from the ranges. An unusable content width yields
    /// the hard lines.
    pub fn visual_lines(&self, text: &str) -> Vec<Range<usize>> {
        let mut starts: Vec<usize> = vec![0];
        let mut current_line = 0usize;
        let laid_out = self.walk(text, |byte, position| {
            if position.line != current_line {
                current_line = position.line;
                starts.push(byte);
            }
            false
        });
        if !laid_out {
            let mut ranges = Vec::new();
            let mut start = 0;
            for (idx, ch) in text.char_indices() {
                if ch == '\n' {
                    ranges.push(start..idx);
                    start = idx + 1;
                }
            }
            ranges.push(start..text.len());
            return ranges;
        }

        let mut ranges = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            let end = if text[start..end].ends_with('\n') {
                end - 1
            } else {
                end
            };
            ranges.push(start..end);
        }
        ranges
    }
}

pub struct CaretLocator<M: GlyphMetrics> {
    metrics: M,
    mode: PositionMode,
}

impl<M: GlyphMetrics> CaretLocator<M> {
    pub fn new(metrics: M, mode: PositionMode) -> Self {
        Self { metrics, mode }
    }

    pub fn mode(&self) -> PositionMode {
        self.mode
    }

    pub fn locate(&self, text: &str, geometry: &SurfaceGeometry, offset: usize) -> Anchor {
        let style = &geometry.style;
        let line_height = style.resolved_line_height();
        let (page_top, page_left) = match self.mode {
            PositionMode::Viewport => (0.0, 0.0),
            PositionMode::Document => (geometry.page_scroll.top, geometry.page_scroll.left),
        };
        let rect = geometry.bounding_box;

        let Some(position) = MirrorLayout::new(style, &self.metrics).marker_position(text, offset)
        else {
            return degenerate_anchor(rect, page_top, page_left, line_height);
        };

        let top_in_mirror =
            style.border.top + style.padding.top + position.line as f32 * line_height;
        let left_in_mirror = style.border.left + style.padding.left + position.x;

        let top = rect.top + top_in_mirror - geometry.scroll.top + page_top;
        let left = rect.left + left_in_mirror - geometry.scroll.left + page_left;
        if !top.is_finite() || !left.is_finite() {
            return degenerate_anchor(rect, page_top, page_left, line_height);
        }

        Anchor {
            top: top.max(0.0),
            left: left.max(0.0),
            line_height,
            degenerate: false,
        }
    }
}

fn degenerate_anchor(rect: Rect, page_top: f32, page_left: f32, line_height: f32) -> Anchor {
    let finite_or_zero = |value: f32| if value.is_finite() { value.max(0.0) } else { 0.0 };
    Anchor {
        top: finite_or_zero(rect.top + page_top),
        left: finite_or_zero(rect.left + page_left),
        line_height,
        degenerate: true,
    }
}
