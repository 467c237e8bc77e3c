//! One-shot conversation creation.
//!
//! Runs the same lifecycle controller as `convo run` but stops once the
//! session is Ready, printing the join URL instead of opening it. The
//! process exits right after, so the sweep of older conversations is
//! awaited here instead of being left to the controller's detached task.

use anyhow::{bail, Result};
use colored::Colorize;
use std::sync::Arc;

use convo_core::client::{end_all_conversations_except, CleanupReport, ConversationApi};
use convo_core::embed::BrowserEmbed;
use convo_core::{Config, ControllerOptions, SessionController};

/// A conversation made by [`create`].
#[derive(Debug)]
struct Created {
    id: Option<String>,
    url: String,
    status: String,
    cleanup: Option<CleanupReport>,
}

pub async fn execute(no_cleanup: bool, config: &Config) -> Result<()> {
    let client = super::client(config)?;

    let spinner = super::spinner("Creating conversation...")?;
    let created = create(Arc::new(client), ControllerOptions::from(config), !no_cleanup).await;
    spinner.finish_and_clear();
    let created = created?;

    println!("{} {}", "✓".green(), created.status);
    if let Some(id) = &created.id {
        println!("  ID:  {}", id);
    }
    println!("  URL: {}", created.url.cyan());
    if let Some(report) = created.cleanup {
        if report.found > 0 {
            println!(
                "  Ended {}/{} older conversations",
                report.ended, report.found
            );
        }
    }
    Ok(())
}

/// Create a conversation, then end every other one when `cleanup` is set.
async fn create(
    api: Arc<dyn ConversationApi>,
    mut options: ControllerOptions,
    cleanup: bool,
) -> Result<Created> {
    options.cleanup_existing = false;

    let mut controller = SessionController::new(
        Arc::clone(&api),
        Arc::new(BrowserEmbed::with_opener(None)),
        options,
    );

    let Some(url) = controller.start().await else {
        bail!("{}", controller.ui().error_message);
    };
    let id = controller.session().id.clone();

    let cleanup = if cleanup {
        Some(end_all_conversations_except(api.as_ref(), id.as_deref()).await)
    } else {
        None
    };

    Ok(Created {
        id,
        url,
        status: controller.ui().status_message,
        cleanup,
    })
}
