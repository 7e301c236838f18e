//! Trendgate CLI: serve the trends API or query the provider once.
//!
//! ```bash
//! trendgate serve --port 8080
//! trendgate related "mini split" --geo US
//! trendgate interest hvac,furnace
//! trendgate config
//! ```
//!
//! See `trendgate --help` for all available commands and options.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "trendgate",
    about = "Caching, throttling front for a rate-limited trends provider",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API until Ctrl-C
    Serve {
        /// Config file (defaults to ./trendgate.toml when present)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Listen address, overrides config and TG_HOST
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides config, TG_PORT and PORT
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Fetch related queries for one keyword and print them as JSON
    Related {
        keyword: String,

        /// Region code, defaults to the configured default_geo
        #[arg(long, short)]
        geo: Option<String>,

        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Fetch interest over time for up to five comma-separated keywords
    Interest {
        keywords: String,

        #[arg(long, short)]
        geo: Option<String>,

        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config, host, port } => {
            commands::serve::run(config.as_deref(), host, port).await
        }
        Commands::Related { keyword, geo, config } => {
            commands::fetch::related(&keyword, geo.as_deref(), config.as_deref()).await
        }
        Commands::Interest { keywords, geo, config } => {
            commands::fetch::interest(&keywords, geo.as_deref(), config.as_deref()).await
        }
        Commands::Config { config } => commands::config::run(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
