//! Configuration management for convo.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (CONVO_*, TAVUS_API_KEY)
//! 2. Config file (`$CONVO_CONFIG` or the platform data dir's config.toml)
//! 3. Default values

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::CreateConversationRequest;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "CONVO_API_KEY";
/// Vendor-named fallback for the API key.
pub const API_KEY_FALLBACK_ENV: &str = "TAVUS_API_KEY";
/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "CONVO_API_URL";
/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "CONVO_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Conversation API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// What to ask for when creating a conversation
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Call frame presentation
    #[serde(default)]
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the Conversation API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent in the `x-api-key` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Replica that joins the call
    #[serde(default = "default_replica_id")]
    pub replica_id: String,

    /// Instructions given to the replica
    #[serde(default = "default_context")]
    pub conversational_context: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,

    /// End every other conversation owned by the key before creating one
    #[serde(default = "default_true")]
    pub cleanup_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameConfig {
    #[serde(default)]
    pub show_leave_button: bool,
    #[serde(default = "default_full")]
    pub width: String,
    #[serde(default = "default_full")]
    pub height: String,
    #[serde(default = "default_border")]
    pub border: String,
    #[serde(default = "default_border_radius")]
    pub border_radius: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://tavusapi.com/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_replica_id() -> String {
    "r1fbfc941b".to_string()
}

fn default_context() -> String {
    "You join a video conversation with a customer. Ask them their name and see how they are \
     doing. Answer all the questions they ask you in a patient and friendly manner. Keep your \
     answers crisp, concise and to the point."
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_full() -> String {
    "100%".to_string()
}

fn default_border() -> String {
    "0".to_string()
}

fn default_border_radius() -> String {
    "10px".to_string()
}

fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "convo", "convo") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".convo")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            replica_id: default_replica_id(),
            conversational_context: default_context(),
            persona_id: None,
            conversation_name: None,
            cleanup_existing: default_true(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            show_leave_button: false,
            width: default_full(),
            height: default_full(),
            border: default_border(),
            border_radius: default_border_radius(),
        }
    }
}

impl ConversationConfig {
    /// Build the create request body from these settings.
    pub fn to_request(&self) -> CreateConversationRequest {
        CreateConversationRequest {
            replica_id: self.replica_id.clone(),
            conversational_context: self.conversational_context.clone(),
            persona_id: self.persona_id.clone(),
            conversation_name: self.conversation_name.clone(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, then apply the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay environment values. The lookup is injected so tests can
    /// avoid touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(API_KEY_ENV)
            .or_else(|| lookup(API_KEY_FALLBACK_ENV))
            .filter(|k| !k.trim().is_empty());
        if let Some(key) = key {
            self.api.api_key = Some(key.trim().to_string());
        }

        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    /// The API key, or `Error::MissingApiKey`.
    pub fn api_key(&self) -> Result<&str> {
        self.api
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingApiKey)
    }
}
