//! Error types for the conversational dispatch layer.

use finch_core::error::FinchError;

/// Failure of a single agent dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("agent request failed ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("agent response was malformed ({status}): {reason}")]
    Malformed {
        status: u16,
        body: String,
        reason: String,
    },
    #[error("agent transport unavailable: {0}")]
    Transport(String),
}

impl DispatchError {
    /// HTTP status of the failed call, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::Status { status, .. } | DispatchError::Malformed { status, .. } => {
                Some(*status)
            }
            DispatchError::Transport(_) => None,
        }
    }

    /// Raw response body text, if one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            DispatchError::Status { body, .. } | DispatchError::Malformed { body, .. } => {
                Some(body)
            }
            DispatchError::Transport(_) => None,
        }
    }

    /// Text shown to the user in the failure turn.
    ///
    /// The backend's plain-text body wins; an empty body falls back to the
    /// status code.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Status { status, body } => {
                if body.trim().is_empty() {
                    format!("Agent request failed ({})", status)
                } else {
                    body.clone()
                }
            }
            DispatchError::Malformed { status, .. } => {
                format!("Agent response was malformed ({})", status)
            }
            DispatchError::Transport(msg) => msg.clone(),
        }
    }
}

/// Failure of an export replay.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export failed ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("export transport unavailable: {0}")]
    Transport(String),
    #[error("invalid export reference: {0}")]
    InvalidReference(String),
}

impl ExportError {
    /// HTTP status of the failed call, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a request is already in flight for this session")]
    Busy,
    #[error("response for dispatch #{0} was superseded")]
    Superseded(u64),
    #[error("no export is available")]
    NoExport,
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ChatError> for FinchError {
    fn from(err: ChatError) -> Self {
        FinchError::Chat(err.to_string())
    }
}
