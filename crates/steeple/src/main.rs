// SPDX-FileCopyrightText: 2026 Steeple Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Steeple - a multi-tenant SMS/MMS messaging gateway.
//!
//! This is the binary entry point for the gateway.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Steeple - a multi-tenant SMS/MMS messaging gateway.
#[derive(Parser, Debug)]
#[command(name = "steeple", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway server.
    Serve,
    /// Print the resolved configuration (secrets redacted).
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match steeple_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            steeple_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.gateway.log_level)),
        )
        .init();

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(err) = serve::run(config).await {
                tracing::error!(error = %err, "gateway exited with error");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config(config);
        }
        None => {
            println!("steeple: use --help for available commands");
        }
    }
}

/// Print the resolved config as TOML with secrets masked.
fn print_config(mut config: steeple_config::SteepleConfig) {
    if config.provider.api_key.is_some() {
        config.provider.api_key = Some("[redacted]".to_string());
    }
    match toml::to_string_pretty(&config) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("steeple: failed to render config: {err}"),
    }
}
