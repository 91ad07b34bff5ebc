//! Demonstrate call coalescing with concurrent callers.

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use ringflight::CallGroup;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

pub fn run(callers: usize, delay_ms: u64, rounds: usize) -> Result<()> {
    if callers == 0 {
        bail!("Caller count must be greater than 0");
    }

    let group: Arc<CallGroup<u64, String>> = Arc::new(CallGroup::new());
    let executions = Arc::new(AtomicUsize::new(0));

    println!(
        "{} {} callers × {} rounds, load takes {}ms",
        "coalesce".blue().bold(),
        callers,
        rounds,
        delay_ms
    );

    let start = Instant::now();
    for round in 0..rounds {
        let barrier = Arc::new(Barrier::new(callers));
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let group = Arc::clone(&group);
                let executions = Arc::clone(&executions);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    group.call("demo", || {
                        let n = executions.fetch_add(1, Ordering::SeqCst) + 1;
                        thread::sleep(Duration::from_millis(delay_ms));
                        Ok(n as u64)
                    })
                })
            })
            .collect();

        let mut results = Vec::with_capacity(callers);
        for handle in handles {
            let result = handle
                .join()
                .map_err(|_| anyhow!("Caller thread panicked"))?;
            results.push(result.map_err(|e| anyhow!(e))?);
        }

        results.dedup();
        println!(
            "  round {}: {} distinct result(s) {:?}",
            round + 1,
            results.len(),
            results
        );
    }

    let executions = executions.load(Ordering::SeqCst);
    let calls = callers * rounds;
    println!();
    println!(
        "  {} calls, {} executions, {} suppressed in {:.1?}",
        calls,
        executions.to_string().green().bold(),
        calls.saturating_sub(executions),
        start.elapsed()
    );

    Ok(())
}
