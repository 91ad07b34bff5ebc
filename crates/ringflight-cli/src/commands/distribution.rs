//! Report how evenly keys spread across peers.

use anyhow::{bail, Result};
use colored::Colorize;
use ringflight::HashRing;
use std::collections::BTreeMap;

use crate::config::Config;

/// Width of the share bar at 100%.
const BAR_WIDTH: f64 = 40.0;

pub fn run(config: &Config, samples: usize) -> Result<()> {
    if config.cluster.peers.is_empty() {
        bail!("No peers configured. Pass {} or edit the config.", "--nodes".cyan());
    }
    if samples == 0 {
        bail!("Sample count must be greater than 0");
    }

    let mut ring = HashRing::from_config(&config.ring)?;
    ring.add(&config.cluster.peers);

    let mut counts: BTreeMap<&str, usize> = ring.nodes().into_iter().map(|n| (n, 0)).collect();
    for i in 0..samples {
        let key = format!("key-{}", i);
        if let Some(owner) = ring.get(&key) {
            *counts.entry(owner).or_default() += 1;
        }
    }

    let ideal = 1.0 / counts.len() as f64;

    println!("{}", "Key Distribution".white().bold());
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "  {} samples, {} virtual nodes, {} hash",
        samples,
        ring.len(),
        config.ring.hash
    );
    println!();

    for (node, count) in &counts {
        let share = *count as f64 / samples as f64;
        let deviation = (share - ideal) / ideal * 100.0;
        let bar = "█".repeat((share * BAR_WIDTH).round() as usize);
        let deviation_text = format!("{:+.1}%", deviation);
        let deviation_text = if deviation.abs() > 20.0 {
            deviation_text.red()
        } else {
            deviation_text.green()
        };

        println!(
            "  {:<28} {:>7} {:>6.2}% {:>8}  {}",
            node,
            count,
            share * 100.0,
            deviation_text,
            bar.cyan()
        );
    }

    Ok(())
}
