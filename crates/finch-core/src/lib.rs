//! Shared configuration and error types for the Finch workspace.

pub mod config;
pub mod error;

pub use config::FinchConfig;
pub use error::{FinchError, Result};
