//! Chat orchestrator: one session's coordinator.
//!
//! Wires the classifier, dispatcher, interpreter, and Context Store together
//! for a single open conversation. Every user action goes through here.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use finch_core::FinchConfig;

use crate::classifier::{FollowupClassifier, KeywordClassifier};
use crate::context::ChatSession;
use crate::dispatcher::{AgentDispatcher, HttpAgentDispatcher};
use crate::error::ChatError;
use crate::export::ExportReplayer;
use crate::response::ResponseInterpreter;
use crate::types::{ContextSnapshot, ExportedFile, SessionParams, Turn};

/// Agent reply appended after an explicit reset.
pub const RESET_REPLY: &str = "Context reset. Ask a new question anytime.";

/// Default reset command.
const DEFAULT_RESET_COMMAND: &str = "reset";

/// Session-scoped coordinator for one conversation view.
pub struct ChatOrchestrator {
    dispatcher: Arc<dyn AgentDispatcher>,
    classifier: Box<dyn FollowupClassifier>,
    interpreter: ResponseInterpreter,
    session: Mutex<ChatSession>,
    session_id: Uuid,
    reset_command: String,
}

impl ChatOrchestrator {
    /// Create an orchestrator with the keyword classifier.
    pub fn new(
        dispatcher: Arc<dyn AgentDispatcher>,
        interpreter: ResponseInterpreter,
        params: SessionParams,
    ) -> Self {
        let session = ChatSession::new(params);
        let session_id = session.id;
        info!(session_id = %session_id, "Chat session opened");
        Self {
            dispatcher,
            classifier: Box::new(KeywordClassifier::default()),
            interpreter,
            session: Mutex::new(session),
            session_id,
            reset_command: DEFAULT_RESET_COMMAND.to_string(),
        }
    }

    /// Build an HTTP-backed orchestrator from the loaded configuration.
    pub fn from_config(config: &FinchConfig) -> Result<Self, ChatError> {
        let dispatcher = HttpAgentDispatcher::from_config(&config.chat)?;
        let interpreter = ResponseInterpreter::new(config.backend.api_base.clone())
            .with_placeholder(config.chat.placeholder_message.clone());
        let params = SessionParams::new(config.chat.company_id);
        Ok(Self::new(Arc::new(dispatcher), interpreter, params)
            .with_reset_command(config.chat.reset_command.clone()))
    }

    /// Replace the follow-up classification strategy.
    pub fn with_classifier(mut self, classifier: Box<dyn FollowupClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_reset_command(mut self, command: impl Into<String>) -> Self {
        self.reset_command = command.into();
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    // =========================================================================
    // User actions
    // =========================================================================

    /// Handle typed input.
    ///
    /// Returns the agent turn appended for this input. The reset command
    /// never reaches the dispatcher.
    pub async fn send(&self, text: &str) -> Result<Turn, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if text.to_lowercase() == self.reset_command.to_lowercase() {
            return self.reset(text);
        }

        let followup = self.classifier.classify(text);
        debug!(session_id = %self.session_id, followup, "Classified input");
        self.dispatch(text, followup).await
    }

    /// Handle a follow-up chip click. The stored context is always attached.
    pub async fn send_followup(&self, label: &str) -> Result<Turn, ChatError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.dispatch(label, true).await
    }

    /// Replay the current export reference with the `lastParams` captured
    /// alongside it. Nothing is exportable after a reset or after a turn that
    /// offered no export.
    pub async fn export_latest(&self, replayer: &ExportReplayer) -> Result<ExportedFile, ChatError> {
        let (reference, last_params) = self
            .lock()?
            .context_store()
            .export_request()
            .ok_or(ChatError::NoExport)?;

        info!(session_id = %self.session_id, reference = %reference, "Exporting");
        Ok(replayer.export_csv(&reference, &last_params).await?)
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn history(&self) -> Result<Vec<Turn>, ChatError> {
        Ok(self.lock()?.history().to_vec())
    }

    /// Current context and follow-up suggestions.
    pub fn snapshot(&self) -> Result<ContextSnapshot, ChatError> {
        Ok(self.lock()?.context_store().get())
    }

    pub fn followups(&self) -> Result<Vec<String>, ChatError> {
        Ok(self.lock()?.context_store().followups().to_vec())
    }

    pub fn last_params(&self) -> Result<Value, ChatError> {
        Ok(self.lock()?.context_store().last_params())
    }

    /// Export reference currently available for `export_latest`.
    pub fn export_reference(&self) -> Result<Option<String>, ChatError> {
        Ok(self
            .lock()?
            .context_store()
            .export_reference()
            .map(str::to_string))
    }

    /// Whether a dispatch is awaiting its response.
    pub fn is_busy(&self) -> Result<bool, ChatError> {
        Ok(self.lock()?.in_flight().is_some())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> Result<MutexGuard<'_, ChatSession>, ChatError> {
        self.session
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }

    fn reset(&self, text: &str) -> Result<Turn, ChatError> {
        let mut session = self.lock()?;
        session.reset();
        session.push(Turn::user(text));
        let reply = Turn::agent(RESET_REPLY);
        session.push(reply.clone());
        info!(session_id = %self.session_id, "Context reset");
        Ok(reply)
    }

    async fn dispatch(&self, text: &str, followup: bool) -> Result<Turn, ChatError> {
        let (seq, params, context) = {
            let mut session = self.lock()?;
            if let Some(pending) = session.in_flight() {
                debug!(session_id = %self.session_id, pending, "Refusing send while busy");
                return Err(ChatError::Busy);
            }
            let context = if followup {
                session.context_store().context().cloned()
            } else {
                None
            };
            session.push(Turn::user(text));
            let seq = session.begin_dispatch();
            (seq, session.params.clone(), context)
        };

        info!(
            session_id = %self.session_id,
            seq,
            with_context = context.is_some(),
            "Dispatching to agent"
        );

        let result = self.dispatcher.ask(text, &params, context.as_ref()).await;

        let mut session = self.lock()?;
        session.finish_dispatch(seq);

        match result {
            Ok(raw) => {
                let interpreted = self.interpreter.interpret(raw);
                let turn = interpreted.to_turn();
                let applied = session.context_store_mut().apply(
                    seq,
                    interpreted.next_context,
                    interpreted.next_followups,
                    interpreted.export_reference,
                );
                if !applied {
                    warn!(session_id = %self.session_id, seq, "Discarding superseded response");
                    return Err(ChatError::Superseded(seq));
                }
                session.push(turn.clone());
                Ok(turn)
            }
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    seq,
                    status = e.status(),
                    error = %e,
                    "Agent dispatch failed"
                );
                if session.context_store().is_current(seq) {
                    session.push(Turn::agent(format!("Oops: {}", e.user_message())));
                }
                Err(e.into())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
