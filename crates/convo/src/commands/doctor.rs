//! Diagnostics command.

use anyhow::Result;
use colored::Colorize;

use convo_core::client::ConversationApi;
use convo_core::embed::BrowserEmbed;
use convo_core::Config;

pub async fn execute(config: &Config) -> Result<()> {
    println!("{}", "convo Doctor".cyan().bold());
    println!("{}", "─".repeat(50));
    println!();

    let mut issues = Vec::new();

    // Check config file
    print!("  Config file: ");
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("{}", "✓ exists".green());
    } else {
        println!("{}", "○ not found (using defaults)".yellow());
    }

    // Check API key
    print!("  API key: ");
    let key_present = config.api_key().is_ok();
    if key_present {
        println!("{}", "✓ set".green());
    } else {
        println!("{}", "✗ missing".red());
        issues.push("Set CONVO_API_KEY (or TAVUS_API_KEY)");
    }

    // Check API connectivity
    print!("  API ({}): ", config.api.base_url);
    if key_present {
        match super::client(config) {
            Ok(client) => match client.list_conversations().await {
                Ok(conversations) => println!(
                    "{}",
                    format!("✓ reachable ({} conversations)", conversations.len()).green()
                ),
                Err(e) => {
                    println!("{}", format!("✗ {}", e).red());
                    issues.push("Cannot reach the Conversation API");
                }
            },
            Err(e) => {
                println!("{}", format!("✗ {}", e).red());
                issues.push("Cannot build the HTTP client");
            }
        }
    } else {
        println!("{}", "○ skipped (no API key)".yellow());
    }

    // Check browser opener
    print!("  Browser opener: ");
    match BrowserEmbed::detect().opener() {
        Some(path) => println!("{}", format!("✓ {}", path.display()).green()),
        None => println!("{}", "○ not found (join URLs will be printed)".yellow()),
    }

    println!();
    if issues.is_empty() {
        println!("{}", "All checks passed.".green().bold());
    } else {
        println!("{}", format!("{} issue(s) found:", issues.len()).red().bold());
        for issue in &issues {
            println!("  • {}", issue);
        }
    }

    Ok(())
}
