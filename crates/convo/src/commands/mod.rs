//! Command implementations for the convo CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod config;
pub mod conversations;
pub mod create;
pub mod doctor;
pub mod run;

use anyhow::{Context, Result};
use convo_core::client::ConversationClient;
use convo_core::Config;

/// Build the API client, with a hint when the key is missing.
pub(crate) fn client(config: &Config) -> Result<ConversationClient> {
    ConversationClient::new(config).with_context(|| {
        format!(
            "Cannot reach the Conversation API (config: {})",
            Config::config_path().display()
        )
    })
}

/// Spinner shown while waiting on the API.
pub(crate) fn spinner(message: &str) -> Result<indicatif::ProgressBar> {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(spinner)
}
