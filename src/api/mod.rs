pub mod client;
pub mod collaborator;
pub mod logging;
pub mod mock_client;
pub mod stream;

pub use client::GeminiClient;
pub use collaborator::{Collaborator, CollaboratorEvent, CollaboratorRequest, CollaboratorSink};
pub use mock_client::{Script, ScriptOutcome, ScriptedCollaborator};
pub use stream::StreamParser;
