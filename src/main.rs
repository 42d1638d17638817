//! BlueLight - a terminal client for a campus emergency-reporting portal.
//!
//! This binary wires the session core together: it keeps the token pair
//! fresh and gates every protected area of the portal behind the
//! navigation guard.

mod app;
mod auth;
mod api;
mod config;
mod guard;
mod models;
mod policy;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use auth::CredentialStore;
use config::Config;

/// Set up the tracing subscriber.
fn init_tracing() {
    // RUST_LOG controls the filter; warnings only by default. Logs go to
    // stderr so they never interleave with the interactive prompt.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a .env file when present.
    let _ = dotenvy::dotenv();

    // Flags short-circuit before the shell starts.
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        print_usage();
        return Ok(());
    }
    if args.len() > 1 && args[1] == "--status" {
        return print_session_status();
    }
    if args.len() > 1 {
        eprintln!("Unknown option: {}", args[1]);
        print_usage();
        std::process::exit(2);
    }

    init_tracing();
    info!("BlueLight client starting");

    let mut app = App::new()?;
    let result = app.run().await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("BlueLight client shutting down");
    Ok(())
}

/// Print the persisted session state without touching it.
fn print_session_status() -> Result<()> {
    let store = CredentialStore::open(Config::state_dir());
    if !store.is_persistent() {
        println!("No state directory available; sessions are not persisted.");
        return Ok(());
    }
    app::print_status(&store.read());
    Ok(())
}

fn print_usage() {
    println!("bluelight - terminal client for the BlueLight campus emergency portal");
    println!();
    println!("Usage: bluelight [OPTION]");
    println!();
    println!("Options:");
    println!("  --status    Print the persisted session state and exit");
    println!("  -h, --help  Show this help");
    println!();
    println!("Environment:");
    println!("  BLUELIGHT_API_BASE  Portal API base URL (overrides the config file)");
    println!("  BLUELIGHT_EMAIL     Sign-in email (skips the prompt)");
    println!("  BLUELIGHT_PASSWORD  Sign-in password (skips the prompt)");
    println!("  RUST_LOG            Log filter (default: warn)");
}
