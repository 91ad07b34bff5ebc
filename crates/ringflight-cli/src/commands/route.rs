//! Show which peer owns each key.

use anyhow::{bail, Result};
use colored::Colorize;
use ringflight::{HashRing, PeerRouter, Route};

use crate::config::Config;

pub fn run(config: &Config, keys: &[String], fallbacks: usize) -> Result<()> {
    if config.cluster.peers.is_empty() {
        bail!("No peers configured. Pass {} or edit the config.", "--nodes".cyan());
    }

    let router = PeerRouter::new(config.cluster.self_name.as_str(), &config.ring)?;
    router.set_peers(&config.cluster.peers);

    let mut ring = HashRing::from_config(&config.ring)?;
    ring.add(&config.cluster.peers);

    println!(
        "{} {} peers, {} replicas, {} hash, self {}",
        "ring".blue().bold(),
        config.cluster.peers.len(),
        config.ring.replicas,
        config.ring.hash,
        config.cluster.self_name.cyan()
    );
    println!();

    for key in keys {
        let route = match router.pick(key) {
            Route::Local => "local".green(),
            Route::Remote(peer) => peer.yellow(),
        };
        println!("  {:<24} → {}", key, route);

        if fallbacks > 0 {
            let candidates = ring.get_n(key, fallbacks + 1);
            for (i, candidate) in candidates.iter().enumerate().skip(1) {
                println!("  {:<24}   {} {}", "", format!("#{}", i).dimmed(), candidate);
            }
        }
    }

    Ok(())
}
