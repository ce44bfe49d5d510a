use super::buffer::Buffer;
use super::caret::{Rect, RenderStyle, ScrollOffset, SurfaceGeometry};

/// Capability interface of the text-input widget hosting the assistant.
///
/// The trigger detector and caret locator only ever talk to this trait, so
/// they run headlessly against [`MemorySurface`] in tests.
pub trait TextSurface {
    fn buffer(&self) -> &Buffer;

    fn selection(&self) -> (usize, usize) {
        self.buffer().selection()
    }

    fn cursor(&self) -> usize {
        self.buffer().cursor()
    }

    fn replace_buffer(&mut self, buffer: Buffer);

    fn focus(&mut self);

    fn render_style(&self) -> RenderStyle;

    fn bounding_box(&self) -> Rect;

    fn scroll_offset(&self) -> ScrollOffset;

    /// Scroll position of the page hosting the surface.
    fn page_scroll(&self) -> ScrollOffset {
        ScrollOffset::default()
    }

    fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry {
            style: self.render_style(),
            bounding_box: self.bounding_box(),
            scroll: self.scroll_offset(),
            page_scroll: self.page_scroll(),
        }
    }
}

/// In-memory surface; its geometry is whatever the host last reported.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    buffer: Buffer,
    style: RenderStyle,
    bounding_box: Rect,
    scroll: ScrollOffset,
    page_scroll: ScrollOffset,
    focused: bool,
}

impl MemorySurface {
    pub fn new(buffer: Buffer, style: RenderStyle, bounding_box: Rect) -> Self {
        Self {
            buffer,
            style,
            bounding_box,
            scroll: ScrollOffset::default(),
            page_scroll: ScrollOffset::default(),
            focused: true,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn set_style(&mut self, style: RenderStyle) {
        self.style = style;
    }

    pub fn set_bounding_box(&mut self, bounding_box: Rect) {
        self.bounding_box = bounding_box;
    }

    pub fn set_scroll(&mut self, scroll: ScrollOffset) {
        self.scroll = scroll;
    }

    pub fn set_page_scroll(&mut self, page_scroll: ScrollOffset) {
        self.page_scroll = page_scroll;
    }
}

impl TextSurface for MemorySurface {
    fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn replace_buffer(&mut self, buffer: Buffer) {
        self.buffer = buffer;
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn render_style(&self) -> RenderStyle {
        self.style.clone()
    }

    fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    fn page_scroll(&self) -> ScrollOffset {
        self.page_scroll
    }
}
