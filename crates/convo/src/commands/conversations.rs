//! Conversation maintenance commands: list, end, cleanup.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;

use convo_core::client::{end_all_conversations, ConversationApi};
use convo_core::types::Conversation;
use convo_core::Config;

pub async fn list(json: bool, config: &Config) -> Result<()> {
    let client = super::client(config)?;
    let conversations = client
        .list_conversations()
        .await
        .context("Failed to list conversations")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!("{}", "No conversations.".yellow());
        return Ok(());
    }

    println!("{}", "Conversations".cyan().bold());
    println!("{}", "─".repeat(60));
    let now = Utc::now();
    for conversation in &conversations {
        println!("{}", format_row(conversation, now));
    }
    println!();
    println!("{} total", conversations.len());

    Ok(())
}

pub async fn end(conversation_id: &str, config: &Config) -> Result<()> {
    let client = super::client(config)?;
    client
        .end_conversation(conversation_id)
        .await
        .with_context(|| format!("Failed to end conversation {}", conversation_id))?;

    println!("{} Ended {}", "✓".green(), conversation_id);
    Ok(())
}

pub async fn cleanup(config: &Config) -> Result<()> {
    let client = super::client(config)?;
    let spinner = super::spinner("Cleaning up existing conversations...")?;
    let report = end_all_conversations(&client).await;
    spinner.finish_and_clear();

    if report.found == 0 {
        println!("{}", "No conversations to end.".yellow());
        return Ok(());
    }

    println!(
        "{} Ended {}/{} conversations",
        "✓".green(),
        report.ended,
        report.found
    );
    if report.failed > 0 {
        println!(
            "  {}",
            format!("{} could not be ended (see logs)", report.failed).red()
        );
    }
    Ok(())
}

fn format_row(conversation: &Conversation, now: DateTime<Utc>) -> String {
    let status = conversation.status.as_deref().unwrap_or("unknown");
    let status = match status {
        "active" => status.green(),
        "ended" => status.dimmed(),
        _ => status.yellow(),
    };
    let age = conversation
        .created_at_utc()
        .map(|created| format_age(now - created))
        .unwrap_or_else(|| "-".to_string());
    let name = conversation.conversation_name.as_deref().unwrap_or("");

    format!(
        "  {:<20} {:<8} {:>8}  {}",
        conversation.resolved_id().unwrap_or("-"), status, age, name
    )
}

/// Compact age such as `42s`, `5m`, `3h`, `2d`.
fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
