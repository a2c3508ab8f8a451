//! # Playground
//!
//! Drives every built-in command once, with delays scaled down, and prints the
//! published slots as they change.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example playground
//! ```

use std::{sync::Arc, time::Duration};

use tasklane::{Commands, Config, LogWriter, Runner, Slot, Subscribe, Timings};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cfg = Config {
        grace: Duration::from_secs(5),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runner = Runner::builder(cfg).with_subscribers(subs).build();
    let commands = Commands::with_timings(runner.clone(), Timings::default().scaled(0.2));

    let mut status = runner.publisher().subscribe(Slot::Status);
    let watcher = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let p = status.borrow_and_update().clone();
            println!(" ├─► status #{}: {}", p.version, p.value);
        }
    });

    println!("Serial:");
    for h in commands.run_serial().await? {
        h.await?;
    }

    println!("Concurrent:");
    for h in commands.run_concurrent().await? {
        h.await?;
    }

    println!("Bridged:");
    let fetched = commands.fetch().await?.await?;
    println!(" └─► fetched: {fetched}");

    println!("Isolated:");
    for _ in 0..3 {
        let n = commands.increment_counter().await?;
        println!(" ├─► counter: {n}");
    }

    println!("Load:");
    match commands.load_data().await?.await {
        Ok(v) => println!(" ├─► load ok: {v}"),
        Err(e) => println!(" ├─► load failed: {e}"),
    }
    let bg = commands.load_background().await?;
    let count = commands.load_count().await?;
    println!(" ├─► background: {}", bg.await?);
    println!(" └─► count: {}", count.await?);

    runner.publisher().flush().await?;
    println!();
    println!("Slots:");
    for (slot, value) in runner.publisher().snapshot() {
        println!(" ├─► {}: {value}", slot.name());
    }
    println!(" └─► counter (mirror): {}", commands.counter_value());

    runner.shutdown().await?;
    watcher.abort();
    Ok(())
}
