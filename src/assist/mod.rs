//! The assistant overlay: input parsing, lifecycle state machine and the
//! session controller that drives a collaborator.

pub mod command;
pub mod machine;
pub mod session;
pub mod state;

pub use command::{parse, Directive, DirectiveForm, PromptDirective, SAVE_COMMAND};
pub use machine::{EventDisposition, Insertion, OverlayMachine, ResultKind, SubmitOutcome};
pub use session::{AssistSession, InvocationUpdate, SessionUpdate};
pub use state::{
    Invocation, InvocationId, OverlayMode, OverlayPlacement, StreamResult, FAILURE_MESSAGE,
    SAVE_CONFIRMATION,
};
