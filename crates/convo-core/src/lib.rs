//! convo-core - Core library for convo
//!
//! This crate provides everything the convo CLI drives:
//!
//! - **client**: Conversation API client (list / create / end)
//! - **embed**: Call embed boundary and the system-browser embed
//! - **session**: Session lifecycle controller (create → join → end → reset)
//! - **config**: Layered configuration (env > file > defaults)

pub mod client;
pub mod config;
pub mod embed;
pub mod error;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use session::{ControllerOptions, SessionController, SessionState, UiState};
