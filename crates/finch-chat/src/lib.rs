//! Conversational dispatch layer for the Finch finance agent.
//!
//! Decides whether each utterance continues the previous exchange, sends it
//! to the backend agent with the right context, interprets the mixed-content
//! response, and replays CSV exports through the forwarding proxy.

pub mod classifier;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod response;
pub mod types;

pub use classifier::{FollowupClassifier, KeywordClassifier};
pub use context::{ChatSession, ContextStore};
pub use dispatcher::{AgentDispatcher, HttpAgentDispatcher};
pub use error::{ChatError, DispatchError, ExportError};
pub use export::ExportReplayer;
pub use orchestrator::ChatOrchestrator;
pub use response::ResponseInterpreter;
pub use types::{
    AgentRequest, ContextSnapshot, ExportedFile, InterpretedTurn, RawAgentResponse, Role,
    SessionParams, Turn,
};
