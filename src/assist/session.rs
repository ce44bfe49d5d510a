//! Controller binding a host surface to the overlay machine and a collaborator.

use super::machine::{EventDisposition, OverlayMachine, SubmitOutcome};
use super::state::{InvocationId, OverlayPlacement};
use crate::agents::AgentRegistry;
use crate::api::logging::{emit_invocation_failed, emit_memory_saved};
use crate::api::{Collaborator, CollaboratorEvent, CollaboratorRequest, CollaboratorSink};
use crate::editor::{
    context_snippet, splice, Activation, Anchor, Buffer, CaretLocator, GlyphMetrics, TextSurface,
    TriggerDetector, DEFAULT_CONTEXT_RADIUS,
};
use crate::error::AssistError;
use crate::memory::MemoryStore;
use crate::types::StreamResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationUpdate {
    Accepted,
    Chunk(String),
    Completed(StreamResult),
    Failed(AssistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub id: InvocationId,
    pub update: InvocationUpdate,
}

pub struct AssistSession<S: TextSurface, M: GlyphMetrics> {
    surface: S,
    detector: TriggerDetector,
    locator: CaretLocator<M>,
    machine: OverlayMachine,
    memory: MemoryStore,
    collaborator: Arc<dyn Collaborator>,
    context_radius: usize,
    update_tx: mpsc::UnboundedSender<SessionUpdate>,
    update_rx: mpsc::UnboundedReceiver<SessionUpdate>,
    cancel_token: Option<CancellationToken>,
}

impl<S: TextSurface, M: GlyphMetrics> AssistSession<S, M> {
    pub fn new(
        surface: S,
        locator: CaretLocator<M>,
        registry: Arc<AgentRegistry>,
        collaborator: Arc<dyn Collaborator>,
    ) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Self {
            surface,
            detector: TriggerDetector::default(),
            locator,
            machine: OverlayMachine::new(registry),
            memory: MemoryStore::new(),
            collaborator,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            update_tx,
            update_rx,
            cancel_token: None,
        }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.detector = TriggerDetector::new(trigger);
        self
    }

    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Applies a text edit and runs trigger detection on the result.
    pub fn edit(&mut self, buffer: Buffer) -> Option<Activation> {
        self.surface.replace_buffer(buffer);
        self.on_edit()
    }

    /// Moves the cursor or selection without treating it as an edit.
    pub fn navigate(&mut self, buffer: Buffer) {
        self.surface.replace_buffer(buffer);
    }

    /// Checks the surface's current revision for a freshly typed trigger and
    /// opens the overlay at the caret when one is found.
    pub fn on_edit(&mut self) -> Option<Activation> {
        let activation = self.detector.detect(&self.surface, &self.locator)?;
        if self.machine.activate(activation).is_some() {
            self.cancel_in_flight();
        }
        Some(activation)
    }

    /// Recomputes the overlay anchor after a layout change.
    pub fn refresh_anchor(&mut self) {
        let Some(activation) = self.machine.activation() else {
            return;
        };
        let anchor = self.locator.locate(
            self.surface.buffer().text(),
            &self.surface.geometry(),
            activation.offset,
        );
        self.machine.set_anchor(anchor);
    }

    /// Caret anchor for any offset of the current surface revision.
    pub fn locate(&self, offset: usize) -> Anchor {
        self.locator
            .locate(self.surface.buffer().text(), &self.surface.geometry(), offset)
    }

    pub fn set_input(&mut self, raw: impl Into<String>) -> bool {
        self.machine.set_input(raw)
    }

    /// Submits the overlay input. Prompts are dispatched to the collaborator
    /// on a background task; progress comes back through [`Self::next_update`].
    pub fn submit(&mut self) -> SubmitOutcome {
        let context = context_snippet(self.surface.buffer(), self.context_radius);
        let outcome = self.machine.submit(context, &mut self.memory);
        match &outcome {
            SubmitOutcome::Saved => {
                if let Some(record) = self.memory.current() {
                    emit_memory_saved(&record.source_agent, record.content.len());
                }
            }
            SubmitOutcome::Dispatch(invocation) => {
                self.dispatch(invocation.id, CollaboratorRequest::from(invocation));
            }
            SubmitOutcome::Ignored => {}
        }
        outcome
    }

    fn dispatch(&mut self, id: InvocationId, request: CollaboratorRequest) {
        self.cancel_in_flight();
        let token = CancellationToken::new();
        self.cancel_token = Some(token.clone());
        let collaborator = Arc::clone(&self.collaborator);
        let update_tx = self.update_tx.clone();

        tokio::spawn(async move {
            let (sink, mut events) = CollaboratorSink::channel();
            let forward_tx = update_tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    let update = match event {
                        CollaboratorEvent::Accepted => InvocationUpdate::Accepted,
                        CollaboratorEvent::Chunk(text) => InvocationUpdate::Chunk(text),
                    };
                    if forward_tx.send(SessionUpdate { id, update }).is_err() {
                        break;
                    }
                }
            });

            let outcome = tokio::select! {
                _ = token.cancelled() => Err(AssistError::Cancelled),
                result = collaborator.stream(request, sink) => result,
            };
            // Chunks must land before the terminal update.
            let _ = forwarder.await;

            let update = match outcome {
                Ok(result) => InvocationUpdate::Completed(result),
                Err(error) => InvocationUpdate::Failed(error),
            };
            let _ = update_tx.send(SessionUpdate { id, update });
        });
    }

    /// Applies every update that is already queued. Returns how many were applied.
    pub fn poll_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            if self.apply_update(update) == EventDisposition::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next collaborator update. Pending forever while idle.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        self.update_rx.recv().await
    }

    pub fn apply_update(&mut self, update: SessionUpdate) -> EventDisposition {
        let SessionUpdate { id, update } = update;
        match update {
            InvocationUpdate::Accepted => self.machine.request_accepted(id),
            InvocationUpdate::Chunk(text) => self.machine.apply_chunk(id, &text),
            InvocationUpdate::Completed(result) => {
                let disposition = self.machine.complete(id, result);
                if disposition == EventDisposition::Applied {
                    self.cancel_token = None;
                }
                disposition
            }
            InvocationUpdate::Failed(error) => {
                let agent_id = self.machine.agent_id().to_string();
                let disposition = self.machine.fail(id, error.clone());
                if disposition == EventDisposition::Applied {
                    self.cancel_token = None;
                    emit_invocation_failed(&id.to_string(), &agent_id, &error);
                }
                disposition
            }
        }
    }

    /// Escape: stops any running call, closes the overlay and hands focus
    /// back to the surface.
    pub fn cancel(&mut self) {
        self.close();
        self.surface.focus();
    }

    /// Tears the overlay down without touching focus, for dismissals that
    /// come from outside the surface.
    pub fn close(&mut self) {
        self.cancel_in_flight();
        self.machine.cancel();
        self.detector.release();
    }

    /// Splices the finished result into the surface. Returns `false` unless
    /// the overlay was done.
    pub fn accept(&mut self) -> bool {
        let Some(insertion) = self.machine.accept() else {
            return false;
        };
        let buffer = splice::accept(
            self.surface.buffer(),
            insertion.trigger_offset,
            self.surface.cursor(),
            &insertion.payload,
            self.detector.trigger(),
        );
        self.surface.replace_buffer(buffer);
        self.detector.release();
        self.surface.focus();
        true
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn machine(&self) -> &OverlayMachine {
        &self.machine
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn trigger(&self) -> &str {
        self.detector.trigger()
    }

    pub fn placement(&self) -> Option<OverlayPlacement> {
        self.machine.placement()
    }

    pub fn is_busy(&self) -> bool {
        self.machine.mode().is_busy()
    }
}
