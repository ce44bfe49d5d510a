use super::collaborator::{Collaborator, CollaboratorRequest, CollaboratorSink};
use crate::error::AssistError;
use crate::types::StreamResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Accumulated texts emitted in order.
    pub chunks: Vec<String>,
    pub outcome: ScriptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    Complete(StreamResult),
    Fail(AssistError),
    /// Never terminates; only cancellation ends the call.
    Hang,
}

impl Script {
    /// Streams `chunks` and completes with the last one as final text.
    pub fn text<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks: Vec<String> = chunks.into_iter().map(Into::into).collect();
        let final_text = chunks.last().cloned().unwrap_or_default();
        Self {
            chunks,
            outcome: ScriptOutcome::Complete(StreamResult::text(final_text)),
        }
    }

    pub fn result(result: StreamResult) -> Self {
        Self {
            chunks: Vec::new(),
            outcome: ScriptOutcome::Complete(result),
        }
    }

    pub fn failure(error: AssistError) -> Self {
        Self {
            chunks: Vec::new(),
            outcome: ScriptOutcome::Fail(error),
        }
    }

    pub fn hang<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            outcome: ScriptOutcome::Hang,
        }
    }
}

/// Deterministic collaborator for tests and the offline playground.
///
/// Scripts are consumed in order. Once they run out the collaborator either
/// echoes the request back or fails, depending on how it was built.
#[derive(Clone, Default)]
pub struct ScriptedCollaborator {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<CollaboratorRequest>>>,
    echo: bool,
    chunk_delay: Option<Duration>,
}

impl ScriptedCollaborator {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            ..Self::default()
        }
    }

    /// Answers every request by streaming the prompt back word by word.
    pub fn echo() -> Self {
        Self {
            echo: true,
            chunk_delay: Some(Duration::from_millis(40)),
            ..Self::default()
        }
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn push(&self, script: Script) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
    }

    pub fn requests(&self) -> Vec<CollaboratorRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_script(&self, request: &CollaboratorRequest) -> Result<Script, AssistError> {
        let scripted = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(script) => Ok(script),
            None if self.echo => Ok(echo_script(request)),
            None => Err(AssistError::CollaboratorUnavailable(
                "ScriptedCollaborator: no more scripts configured".to_string(),
            )),
        }
    }
}

fn echo_script(request: &CollaboratorRequest) -> Script {
    let reply = if request.prompt.is_empty() {
        format!("[{}] {}", request.agent_id, request.command.label())
    } else {
        format!("[{}] {}", request.agent_id, request.prompt)
    };
    let mut chunks = Vec::new();
    let mut so_far = String::new();
    for word in reply.split_inclusive(' ') {
        so_far.push_str(word);
        chunks.push(so_far.clone());
    }
    Script::text(chunks)
}

#[async_trait]
impl Collaborator for ScriptedCollaborator {
    async fn stream(
        &self,
        request: CollaboratorRequest,
        sink: CollaboratorSink,
    ) -> Result<StreamResult, AssistError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let script = self.next_script(&request)?;

        sink.accepted();
        for chunk in script.chunks {
            if let Some(delay) = self.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            sink.chunk(chunk);
        }

        match script.outcome {
            ScriptOutcome::Complete(result) => Ok(result),
            ScriptOutcome::Fail(error) => Err(error),
            ScriptOutcome::Hang => futures::future::pending().await,
        }
    }
}
