use crate::editor::Anchor;
use crate::types::CommandKind;

pub use crate::types::StreamResult;

/// Gap between the caret line and the overlay, in pixels.
pub const OVERLAY_GAP: f32 = 8.0;
/// Smallest left offset the overlay is placed at, in pixels.
pub const OVERLAY_MIN_LEFT: f32 = 20.0;

pub const SAVE_CONFIRMATION: &str =
    "Context saved to memory clipboard! You can now switch agents and this context will follow.";
pub const FAILURE_MESSAGE: &str = "Error: Agent connection failed.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlayMode {
    #[default]
    Idle,
    Listening,
    Thinking,
    Streaming,
    Done,
    Error,
}

impl OverlayMode {
    pub fn is_visible(self) -> bool {
        self != Self::Idle
    }

    /// A collaborator call is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Thinking | Self::Streaming)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// Fencing token. Events tagged with anything but the active id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvocationId(pub u64);

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub id: InvocationId,
    pub raw_input: String,
    pub agent_id: String,
    pub command: CommandKind,
    pub prompt: String,
    pub context_snippet: String,
    pub memory_snippet: Option<String>,
}

/// Where the overlay box goes relative to the caret anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPlacement {
    pub top: f32,
    pub left: f32,
}

impl OverlayPlacement {
    pub fn below(anchor: &Anchor) -> Self {
        Self::below_with(anchor, OVERLAY_GAP, OVERLAY_MIN_LEFT)
    }

    pub fn below_with(anchor: &Anchor, gap: f32, min_left: f32) -> Self {
        Self {
            top: anchor.top + anchor.line_height + gap,
            left: anchor.left.max(min_left),
        }
    }
}
