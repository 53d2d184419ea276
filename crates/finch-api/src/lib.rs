//! Finch API crate - the forwarding proxy.
//!
//! Every `/api/*` request from the client is relayed to the configured
//! backend origin, so the client only ever talks to one origin.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
