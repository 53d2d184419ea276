//! Session state: display history plus the Context Store.
//!
//! The Context Store holds the opaque context, follow-up suggestions and
//! export reference from the most recent successful dispatch. It also hands
//! out dispatch sequence numbers so a response that is no longer the latest
//! can never overwrite newer state.

use chrono::Local;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{ContextSnapshot, SessionParams, Turn};

// =============================================================================
// ContextStore
// =============================================================================

/// Most recent backend context and follow-ups for one session.
///
/// The export reference is captured with the context that produced it, so an
/// export always replays the `lastParams` of the same dispatch.
#[derive(Debug, Default)]
pub struct ContextStore {
    context: Option<Value>,
    followups: Vec<String>,
    export_reference: Option<String>,
    issued: u64,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored context and follow-ups.
    pub fn get(&self) -> ContextSnapshot {
        ContextSnapshot {
            context: self.context.clone(),
            followups: self.followups.clone(),
            export_reference: self.export_reference.clone(),
        }
    }

    pub fn context(&self) -> Option<&Value> {
        self.context.as_ref()
    }

    pub fn followups(&self) -> &[String] {
        &self.followups
    }

    pub fn export_reference(&self) -> Option<&str> {
        self.export_reference.as_deref()
    }

    /// Replace context and follow-ups wholesale. Any export reference is dropped.
    pub fn set(&mut self, context: Option<Value>, followups: Vec<String>) {
        self.context = context;
        self.followups = followups;
        self.export_reference = None;
    }

    /// Drop all stored state and invalidate every outstanding dispatch.
    pub fn clear(&mut self) {
        self.set(None, Vec::new());
        self.issued += 1;
    }

    /// Issue the sequence number for a new dispatch.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// The most recently issued sequence number.
    pub fn latest(&self) -> u64 {
        self.issued
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.issued
    }

    /// Store a dispatch result only if `seq` is still the latest issued.
    ///
    /// Returns `false` (and leaves the store untouched) for stale responses.
    pub fn apply(
        &mut self,
        seq: u64,
        context: Option<Value>,
        followups: Vec<String>,
        export_reference: Option<String>,
    ) -> bool {
        if !self.is_current(seq) {
            tracing::debug!(seq, latest = self.issued, "Discarding stale dispatch result");
            return false;
        }
        self.set(context, followups);
        self.export_reference = export_reference;
        true
    }

    /// `context.lastParams`, or an empty object when absent.
    pub fn last_params(&self) -> Value {
        self.context
            .as_ref()
            .and_then(|c| c.get("lastParams"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Export reference and the `lastParams` captured with it.
    pub fn export_request(&self) -> Option<(String, Value)> {
        self.export_reference
            .clone()
            .map(|reference| (reference, self.last_params()))
    }
}

// =============================================================================
// ChatSession
// =============================================================================

/// One open conversation view.
#[derive(Debug)]
pub struct ChatSession {
    pub id: Uuid,
    pub params: SessionParams,
    /// Epoch seconds.
    pub started_at: i64,
    history: Vec<Turn>,
    store: ContextStore,
    in_flight: Option<u64>,
}

impl ChatSession {
    pub fn new(params: SessionParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            params,
            started_at: Local::now().timestamp(),
            history: Vec::new(),
            store: ContextStore::new(),
            in_flight: None,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Append a turn. History is append-only.
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn context_store(&self) -> &ContextStore {
        &self.store
    }

    pub fn context_store_mut(&mut self) -> &mut ContextStore {
        &mut self.store
    }

    /// Sequence number of the dispatch currently awaiting a response.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Mark a new dispatch as outstanding and return its sequence number.
    pub fn begin_dispatch(&mut self) -> u64 {
        let seq = self.store.issue();
        self.in_flight = Some(seq);
        seq
    }

    /// Release the in-flight slot if it still belongs to `seq`.
    pub fn finish_dispatch(&mut self, seq: u64) {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
    }

    /// Explicit reset: clear the context and free the in-flight slot.
    ///
    /// Any response still on the wire is stale afterwards.
    pub fn reset(&mut self) {
        self.store.clear();
        self.in_flight = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
