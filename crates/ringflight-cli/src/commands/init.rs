//! Write a default ringflight.toml.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let config_path = base_path.join(CONFIG_FILE);
    if config_path.exists() {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
        return Ok(());
    }

    Config::default().save(&config_path)?;
    println!("  {} Created {}", "✓".green(), config_path.display());

    println!();
    println!("Next steps:");
    println!("  {} edit [cluster] peers in {}", "1.".blue(), CONFIG_FILE);
    println!("  {} ringflight route <keys>", "2.".blue());
    println!("  {} ringflight distribution", "3.".blue());

    Ok(())
}
