mod artifacts;
mod cdp;
mod cli;
mod commands;
mod compare;
mod config;
mod driver;
mod model;
mod pages;
mod report;
mod run;
mod scenarios;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storecheck=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { url, force } => {
            commands::init(&url, force)?;
        }
        cli::Command::Compare {
            left,
            right,
            diff,
            threshold,
            engine,
            include_aa,
        } => {
            let code =
                commands::compare(&left, &right, diff.as_deref(), threshold, engine, include_aa)
                    .await?;
            std::process::exit(code);
        }
        cli::Command::List { filter } => {
            commands::list(filter.as_deref());
        }
        cli::Command::Run {
            filter,
            persona,
            url,
            threshold,
            timings,
            browser,
        } => {
            let overrides = CliOverrides {
                url,
                threshold,
                browser,
                ..Default::default()
            };
            let config = ResolvedRunConfig::new(overrides)?;
            let code = commands::run(config, filter.as_deref(), persona, timings).await?;
            std::process::exit(code);
        }
    }

    Ok(())
}
