use super::buffer::Buffer;
use super::caret::{Anchor, CaretLocator, GlyphMetrics};
use super::surface::TextSurface;

pub const DEFAULT_TRIGGER: &str = "//";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivationEvent {
    /// Cursor offset right after the trigger; splicing is anchored here.
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Activation {
    pub offset: usize,
    pub anchor: Anchor,
}

/// Watches the cursor, not the edit diff: pasting text that merely contains the
/// trigger only fires when the cursor ends up right behind it.
#[derive(Clone, Debug)]
pub struct TriggerDetector {
    trigger: String,
    pending: bool,
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER)
    }
}

impl TriggerDetector {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            pending: false,
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Re-arms the detector once the overlay has closed.
    pub fn release(&mut self) {
        self.pending = false;
    }

    pub fn on_edit(&mut self, buffer: &Buffer) -> Option<ActivationEvent> {
        if self.pending || self.trigger.is_empty() {
            return None;
        }
        let offset = buffer.cursor();
        let before = buffer.text().get(..offset)?;
        if !before.ends_with(self.trigger.as_str()) {
            return None;
        }
        self.pending = true;
        Some(ActivationEvent { offset })
    }

    /// Runs detection against the surface and, on fire, locates the caret at the
    /// triggering offset.
    pub fn detect<S, M>(&mut self, surface: &S, locator: &CaretLocator<M>) -> Option<Activation>
    where
        S: TextSurface + ?Sized,
        M: GlyphMetrics,
    {
        let event = self.on_edit(surface.buffer())?;
        let anchor = locator.locate(surface.buffer().text(), &surface.geometry(), event.offset);
        Some(Activation {
            offset: event.offset,
            anchor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::caret::{
        LineHeight, MonospaceMetrics, PositionMode, Rect, RenderStyle,
    };
    use crate::editor::surface::MemorySurface;

    #[test]
    fn test_fires_when_trigger_precedes_cursor() {
        let mut detector = TriggerDetector::default();
        let buffer = Buffer::new("hello ").insert_str("/");
        assert_eq!(detector.on_edit(&buffer), None);
        let buffer = buffer.insert_str("/");
        assert_eq!(detector.on_edit(&buffer), Some(ActivationEvent { offset: 8 }));
    }

    #[test]
    fn test_does_not_refire_while_pending() {
        let mut detector = TriggerDetector::default();
        let buffer = Buffer::new("//");
        assert!(detector.on_edit(&buffer).is_some());
        assert!(detector.on_edit(&buffer).is_none());
        assert!(detector.on_edit(&buffer.insert_str("//")).is_none());
        detector.release();
        assert!(detector.on_edit(&buffer).is_some());
    }

    #[test]
    fn test_pasted_trigger_only_counts_at_the_cursor() {
        let mut detector = TriggerDetector::default();
        let pasted = Buffer::new("").insert_str("see http://example.com for more");
        assert!(detector.on_edit(&pasted).is_none());
        let ends_with_trigger = Buffer::new("").insert_str("path //");
        assert_eq!(
            detector.on_edit(&ends_with_trigger),
            Some(ActivationEvent { offset: 7 })
        );
    }

    #[test]
    fn test_cursor_moved_back_behind_trigger_fires() {
        let mut detector = TriggerDetector::default();
        let buffer = Buffer::new("a // b").with_cursor(4);
        assert_eq!(detector.on_edit(&buffer), Some(ActivationEvent { offset: 4 }));
    }

    #[test]
    fn test_custom_trigger_and_short_buffers() {
        let mut detector = TriggerDetector::new(";;");
        assert!(detector.on_edit(&Buffer::new(";")).is_none());
        assert!(detector.on_edit(&Buffer::new("//")).is_none());
        assert!(detector.on_edit(&Buffer::new("x;;")).is_some());
        assert!(TriggerDetector::new("").on_edit(&Buffer::new("")).is_none());
    }

    #[test]
    fn test_detect_locates_anchor_at_trigger_offset() {
        let style = RenderStyle {
            line_height: LineHeight::Px(1.0),
            width: 20.0,
            ..RenderStyle::default()
        };
        let surface = MemorySurface::new(
            Buffer::new("line one\nab //"),
            style,
            Rect {
                top: 2.0,
                left: 3.0,
                width: 20.0,
                height: 10.0,
            },
        );
        let locator = CaretLocator::new(MonospaceMetrics { cell_width: 1.0 }, PositionMode::Viewport);
        let mut detector = TriggerDetector::default();
        let activation = detector.detect(&surface, &locator).expect("trigger fires");
        assert_eq!(activation.offset, 14);
        assert_eq!(activation.anchor.top, 3.0);
        assert_eq!(activation.anchor.left, 8.0);
    }
}
