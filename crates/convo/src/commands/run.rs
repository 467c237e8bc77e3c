//! Interactive conversation session.
//!
//! The terminal counterpart of the call widget: the conversation is created
//! on start, then the user picks Join / End until they quit. The live call
//! is torn down on every exit path.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Select};
use std::sync::Arc;
use tracing::debug;

use convo_core::embed::BrowserEmbed;
use convo_core::{Config, ControllerOptions, SessionController, SessionState, UiState};

/// Something the user can do from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Join,
    End,
    NewConversation,
    Quit,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Join => "Join Video Chat",
            Action::End => "End Conversation",
            Action::NewConversation => "Start New Conversation",
            Action::Quit => "Quit",
        }
    }
}

/// Actions offered for a UI state. End only shows while joined.
fn available_actions(ui: &UiState) -> Vec<Action> {
    let mut actions = Vec::new();
    if ui.can_join() {
        actions.push(Action::Join);
    }
    if ui.can_end() {
        actions.push(Action::End);
    }
    if ui.join_url.is_none() && !ui.joined && ui.state != SessionState::Creating {
        actions.push(Action::NewConversation);
    }
    actions.push(Action::Quit);
    actions
}

pub async fn execute(config: &Config) -> Result<()> {
    let client = super::client(config)?;
    let mut controller = SessionController::new(
        Arc::new(client),
        Arc::new(BrowserEmbed::detect()),
        ControllerOptions::from(config),
    );

    println!("{}", "convo".cyan().bold());
    println!("{}", "─".repeat(50));

    let spinner = super::spinner("Creating conversation...")?;
    controller.start().await;
    spinner.finish_and_clear();

    let result = interact(&mut controller).await;
    controller.dispose();
    result
}

async fn interact(controller: &mut SessionController) -> Result<()> {
    loop {
        controller.process_events();
        let ui = controller.ui();
        render(&ui);

        let actions = available_actions(&ui);
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()
            .context("Failed to read selection")?;

        let action = actions[choice];
        debug!("Selected {:?}", action);
        match action {
            Action::Join => controller.join().await,
            Action::End => controller.end_session().await,
            Action::NewConversation => {
                controller.reset();
                let spinner = super::spinner("Creating conversation...")?;
                controller.start().await;
                spinner.finish_and_clear();
            }
            Action::Quit => {
                if controller.is_joined() {
                    controller.end_session().await;
                }
                return Ok(());
            }
        }
    }
}

fn render(ui: &UiState) {
    println!();
    let state = match ui.state {
        SessionState::Joined => ui.state.to_string().green(),
        SessionState::Failed => ui.state.to_string().red(),
        SessionState::Ready => ui.state.to_string().cyan(),
        _ => ui.state.to_string().normal(),
    };
    println!("  State: {}", state);
    if let Some(url) = &ui.join_url {
        println!("  URL:   {}", url);
    }
    if !ui.status_message.is_empty() {
        println!("  {}", ui.status_message.dimmed());
    }
    if !ui.error_message.is_empty() {
        println!("  {}", ui.error_message.red());
    }
}
