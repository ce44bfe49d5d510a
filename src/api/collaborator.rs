use crate::assist::state::Invocation;
use crate::error::AssistError;
use crate::types::{CommandKind, StreamResult};
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorRequest {
    pub prompt: String,
    pub context_snippet: String,
    pub memory_snippet: Option<String>,
    pub agent_id: String,
    pub command: CommandKind,
}

impl From<&Invocation> for CollaboratorRequest {
    fn from(invocation: &Invocation) -> Self {
        Self {
            prompt: invocation.prompt.clone(),
            context_snippet: invocation.context_snippet.clone(),
            memory_snippet: invocation.memory_snippet.clone(),
            agent_id: invocation.agent_id.clone(),
            command: invocation.command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorEvent {
    /// The backend took the request and is about to stream.
    Accepted,
    /// Full text produced so far.
    Chunk(String),
}

/// Ordered channel the collaborator reports progress on.
#[derive(Clone)]
pub struct CollaboratorSink {
    tx: mpsc::UnboundedSender<CollaboratorEvent>,
}

impl CollaboratorSink {
    pub fn new(tx: mpsc::UnboundedSender<CollaboratorEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CollaboratorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn accepted(&self) {
        let _ = self.tx.send(CollaboratorEvent::Accepted);
    }

    pub fn chunk(&self, accumulated_text: impl Into<String>) {
        let _ = self.tx.send(CollaboratorEvent::Chunk(accumulated_text.into()));
    }

    /// True once nobody listens any more, e.g. after the invocation was cancelled.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Generative backend the overlay talks to.
///
/// Implementations report zero or more events on the sink and then return
/// exactly one terminal result.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn stream(
        &self,
        request: CollaboratorRequest,
        sink: CollaboratorSink,
    ) -> Result<StreamResult, AssistError>;
}
