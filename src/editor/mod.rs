//! Engine-agnostic editing core: buffer revisions, the host surface
//! abstraction, caret location, trigger detection and splicing.

pub mod buffer;
pub mod caret;
pub mod context;
pub mod splice;
pub mod surface;
pub mod trigger;

pub use buffer::Buffer;
pub use caret::{
    Anchor, CaretLocator, Edges, GlyphMetrics, LineHeight, MonospaceMetrics, PositionMode,
    ProportionalMetrics, Rect, RenderStyle, ScrollOffset, SurfaceGeometry, WhiteSpace,
};
pub use context::{context_snippet, DEFAULT_CONTEXT_RADIUS};
pub use surface::{MemorySurface, TextSurface};
pub use trigger::{Activation, ActivationEvent, TriggerDetector, DEFAULT_TRIGGER};
