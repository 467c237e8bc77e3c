//! Configuration commands.

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::cli::{ConfigAction, ConfigCommand};
use convo_core::Config;

pub fn execute(cmd: ConfigCommand, config: &Config) -> Result<()> {
    match cmd.action {
        ConfigAction::Show => show(config),
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init(force),
    }
}

fn show(config: &Config) -> Result<()> {
    let mut shown = config.clone();
    shown.api.api_key = shown.api.api_key.as_deref().map(mask_key);
    let content = toml::to_string_pretty(&shown).context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}

fn init(force: bool) -> Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    // Keys stay in the environment, never in the written file.
    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

/// Keep the last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
