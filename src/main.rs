//! command-center - local dashboard backend
//!
//! Serves a small JSON API over a task document, an append-only event log
//! and the newest log file of an external process.

use clap::Parser;
use command_center::cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();

    // Offline commands stay quiet unless RUST_LOG says otherwise; the server
    // logs requests at info by default.
    let serving = matches!(cli.command, None | Some(Commands::Serve));
    let fallback = if serving {
        "command_center=info,tower_http=info"
    } else {
        "off"
    };
    // Ignore invalid/huge filters instead of failing startup.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = cli.run() {
        eprintln!("error: {err}");
        let code = if err.status_code().is_client_error() { 2 } else { 1 };
        std::process::exit(code);
    }
}
