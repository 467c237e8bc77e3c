//! Error types for convo-core.

use thiserror::Error;

/// Result type alias using convo-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for convo operations
#[derive(Error, Debug)]
pub enum Error {
    // Conversation API errors
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No API key configured. Set CONVO_API_KEY or api.api_key in the config file.")]
    MissingApiKey,

    // Call embed errors
    #[error("Embed error: {0}")]
    Embed(String),

    #[error("Call frame {0} has been destroyed")]
    FrameDestroyed(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a non-success API response
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
