use clap::Parser;
use tracing_subscriber::EnvFilter;

use linkogenei_agent::cli::commands::{cmd_detect, cmd_platforms, cmd_save, cmd_scan};
use linkogenei_agent::cli::config::{Cli, Commands, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Platforms => cmd_platforms(&config)?,
        Commands::Detect { origin } => {
            if !cmd_detect(&config, &origin)? {
                std::process::exit(1);
            }
        }
        Commands::Scan { page, origin, json } => {
            cmd_scan(&config, &page, origin.as_deref(), json)?;
        }
        Commands::Save { page, token, post } => {
            let saved = cmd_save(&config, cli.endpoint.as_deref(), &page, &token, post).await?;
            if !saved {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// RUST_LOG wins; otherwise -v raises the level from warn.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkogenei_agent={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
