//! Chat room client.
//!
//! Demonstrates:
//! - Building a client and registering an event handler
//! - Joining the `/chat_room` namespace
//! - Emitting a message periodically while polling for inbound events
//!
//! Usage:
//!   cargo run --example chat
//!   cargo run --example chat -- http://192.168.0.10:3000
//!   cargo run --example chat -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use socketio_legacy::{Client, Endpoint};
use tokio::time::{Instant, interval, sleep};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "http://localhost:3000";
const NAMESPACE: &str = "/chat_room";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const EMIT_INTERVAL: Duration = Duration::from_secs(5);

// ============================================================================
// Args
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    url: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: args
                .iter()
                .find(|a| !a.starts_with("--"))
                .cloned()
                .unwrap_or_else(|| DEFAULT_URL.to_owned()),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "socketio_legacy=debug"
    } else {
        "socketio_legacy=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Chat Room ===\n");

    let endpoint = Endpoint::parse(&args.url)
        .context("parsing server URL")?
        .with_namespace(NAMESPACE);

    let mut client = Client::builder().build()?;
    client.on("chat message", |event| {
        println!("    <- {}", event.first_str().unwrap_or("<non-string>"));
        None
    })?;

    println!("[1] Connecting to {endpoint}...");
    client
        .connect(endpoint)
        .await
        .context("connecting to chat server")?;
    if let Some(sid) = client.session_id() {
        println!("    ✓ Session {sid}\n");
    }

    println!("[2] Chatting (Ctrl+C to quit)...");
    let started = Instant::now();
    let mut ticker = interval(EMIT_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let message = format!("uptime {}s", started.elapsed().as_secs());
                client.emit("chat_message", &message).await?;
                println!("    -> {message}");
            }
            _ = sleep(POLL_INTERVAL) => {
                client.poll().await?;
            }
        }
    }

    println!("\n[3] Leaving...");
    client.disconnect().await;
    println!("    ✓ Done");
    Ok(())
}
