//! Overlay lifecycle.
//!
//! ```text
//! Idle      --activate-------------> Listening
//! Listening --submit(empty)--------> Listening
//! Listening --submit(//save)-------> Done
//! Listening --submit(prompt)-------> Thinking
//! Thinking  --request accepted-----> Streaming
//! Streaming --chunk----------------> Streaming
//! Streaming --complete-------------> Done
//! busy      --fail-----------------> Error
//! any       --cancel---------------> Idle
//! Done      --accept---------------> Idle
//! ```
//!
//! The machine is synchronous and owns no I/O. Collaborator events carry the
//! [`InvocationId`] they were produced for and are dropped unless it is the
//! active one.

use super::command::{self, Directive};
use super::state::{
    Invocation, InvocationId, OverlayMode, OverlayPlacement, StreamResult, FAILURE_MESSAGE,
    SAVE_CONFIRMATION,
};
use crate::agents::{AgentPersona, AgentRegistry, DEFAULT_AGENT_ID};
use crate::editor::{Activation, Anchor};
use crate::error::AssistError;
use crate::memory::MemoryStore;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or the overlay was not listening.
    Ignored,
    Saved,
    Dispatch(Invocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Applied,
    Stale,
}

/// What the displayed content is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultKind {
    #[default]
    Generated,
    /// Status text such as the save confirmation. Never inserted.
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub trigger_offset: usize,
    pub payload: String,
}

pub struct OverlayMachine {
    registry: Arc<AgentRegistry>,
    mode: OverlayMode,
    activation: Option<Activation>,
    input: String,
    agent_id: String,
    next_id: u64,
    active: Option<InvocationId>,
    invocation: Option<Invocation>,
    result: StreamResult,
    result_kind: ResultKind,
    error: Option<AssistError>,
}

impl OverlayMachine {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            mode: OverlayMode::Idle,
            activation: None,
            input: String::new(),
            agent_id: DEFAULT_AGENT_ID.to_string(),
            next_id: 0,
            active: None,
            invocation: None,
            result: StreamResult::default(),
            result_kind: ResultKind::Generated,
            error: None,
        }
    }

    /// Opens the overlay at `activation`, discarding whatever the previous
    /// activation left behind. Returns the invocation that was still in flight.
    pub fn activate(&mut self, activation: Activation) -> Option<InvocationId> {
        let superseded = self.reset();
        self.activation = Some(activation);
        self.mode = OverlayMode::Listening;
        superseded
    }

    /// Updates the input line. Only honoured while listening.
    pub fn set_input(&mut self, raw: impl Into<String>) -> bool {
        if self.mode != OverlayMode::Listening {
            return false;
        }
        self.input = raw.into();
        self.agent_id = command::live_agent(&self.input, &self.registry, &self.agent_id);
        true
    }

    pub fn submit(&mut self, context: impl Into<String>, memory: &mut MemoryStore) -> SubmitOutcome {
        if self.mode != OverlayMode::Listening {
            return SubmitOutcome::Ignored;
        }

        match command::parse(&self.input, &self.registry) {
            Directive::Empty => SubmitOutcome::Ignored,
            Directive::Save => {
                memory.save(context, self.agent_id.clone());
                self.result = StreamResult::text(SAVE_CONFIRMATION);
                self.result_kind = ResultKind::Notice;
                self.mode = OverlayMode::Done;
                SubmitOutcome::Saved
            }
            Directive::Prompt(directive) => {
                if let Some(agent) = directive.agent {
                    self.agent_id = agent;
                }
                self.next_id += 1;
                let id = InvocationId(self.next_id);
                let invocation = Invocation {
                    id,
                    raw_input: self.input.clone(),
                    agent_id: self.agent_id.clone(),
                    command: directive.command,
                    prompt: directive.prompt,
                    context_snippet: context.into(),
                    memory_snippet: memory.snippet().map(str::to_owned),
                };
                self.active = Some(id);
                self.invocation = Some(invocation.clone());
                self.result = StreamResult::default();
                self.result_kind = ResultKind::Generated;
                self.error = None;
                self.mode = OverlayMode::Thinking;
                SubmitOutcome::Dispatch(invocation)
            }
        }
    }

    pub fn request_accepted(&mut self, id: InvocationId) -> EventDisposition {
        if !self.is_current(id) {
            return EventDisposition::Stale;
        }
        self.mode = OverlayMode::Streaming;
        EventDisposition::Applied
    }

    /// Replaces the shown text with `accumulated_text`. A chunk that arrives
    /// before the accept notice moves the machine to streaming as well.
    pub fn apply_chunk(&mut self, id: InvocationId, accumulated_text: &str) -> EventDisposition {
        if !self.is_current(id) {
            return EventDisposition::Stale;
        }
        self.result.apply_chunk(accumulated_text);
        self.mode = OverlayMode::Streaming;
        EventDisposition::Applied
    }

    pub fn complete(&mut self, id: InvocationId, result: StreamResult) -> EventDisposition {
        if !self.is_current(id) {
            return EventDisposition::Stale;
        }
        self.result.finish(result);
        self.active = None;
        self.mode = OverlayMode::Done;
        EventDisposition::Applied
    }

    pub fn fail(&mut self, id: InvocationId, error: AssistError) -> EventDisposition {
        if !self.is_current(id) {
            return EventDisposition::Stale;
        }
        self.result = StreamResult::text(FAILURE_MESSAGE);
        self.result_kind = ResultKind::Notice;
        self.error = Some(error);
        self.active = None;
        self.mode = OverlayMode::Error;
        EventDisposition::Applied
    }

    /// Closes the overlay from any state. Returns the invocation that was in flight.
    pub fn cancel(&mut self) -> Option<InvocationId> {
        self.reset()
    }

    /// Takes the finished result for splicing and closes the overlay.
    /// Only honoured once the machine is done.
    pub fn accept(&mut self) -> Option<Insertion> {
        if self.mode != OverlayMode::Done {
            return None;
        }
        let trigger_offset = self.activation?.offset;
        let payload = match self.result_kind {
            ResultKind::Notice => String::new(),
            ResultKind::Generated => match self.result.images.first() {
                Some(image) => image_markdown(image),
                None => self.result.text.clone(),
            },
        };
        self.reset();
        Some(Insertion {
            trigger_offset,
            payload,
        })
    }

    /// Moves the overlay after the surface scrolled, resized or re-rendered.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        if let Some(activation) = self.activation.as_mut() {
            activation.anchor = anchor;
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.mode.is_visible()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn agent(&self) -> &AgentPersona {
        self.registry.resolve(&self.agent_id)
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn activation(&self) -> Option<Activation> {
        self.activation
    }

    pub fn placement(&self) -> Option<OverlayPlacement> {
        self.activation
            .map(|activation| OverlayPlacement::below(&activation.anchor))
    }

    pub fn active_invocation(&self) -> Option<InvocationId> {
        self.active
    }

    pub fn invocation(&self) -> Option<&Invocation> {
        self.invocation.as_ref()
    }

    pub fn result(&self) -> &StreamResult {
        &self.result
    }

    pub fn result_kind(&self) -> ResultKind {
        self.result_kind
    }

    pub fn error(&self) -> Option<&AssistError> {
        self.error.as_ref()
    }

    fn is_current(&self, id: InvocationId) -> bool {
        self.active == Some(id) && self.mode.is_busy()
    }

    fn reset(&mut self) -> Option<InvocationId> {
        let in_flight = self.active.take();
        self.mode = OverlayMode::Idle;
        self.activation = None;
        self.input.clear();
        self.agent_id = DEFAULT_AGENT_ID.to_string();
        self.invocation = None;
        self.result = StreamResult::default();
        self.result_kind = ResultKind::Generated;
        self.error = None;
        in_flight
    }
}

pub fn image_markdown(base64_png: &str) -> String {
    format!("![Generated Image](data:image/png;base64,{base64_png})")
}
