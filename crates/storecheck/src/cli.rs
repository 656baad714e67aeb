use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::compare::Engine;
use crate::config;
use crate::config::{BrowserConfig, DEFAULT_BASE_URL};
use crate::model::Persona;

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_threshold(v)
}

fn parse_persona(s: &str) -> Result<Persona, String> {
    s.parse().map_err(|e| format!("{e}"))
}

#[derive(Parser)]
#[command(
    name = "storecheck",
    about = "End-to-end checks for the Sauce Labs demo store, plus a pixel comparator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .storecheck/config.toml with default settings
    Init {
        /// Store base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        url: String,
        /// Overwrite existing config and gitignore
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Count the pixels that differ between two images (exit 0 when none do)
    Compare {
        left: PathBuf,
        right: PathBuf,
        /// Write a diff image here
        #[arg(long)]
        diff: Option<PathBuf>,
        /// Per-pixel sensitivity (0.0-1.0). Lower is more sensitive.
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,
        #[arg(long, value_enum)]
        engine: Option<Engine>,
        /// Count anti-aliased pixels as differences
        #[arg(long)]
        include_aa: bool,
    },

    /// Print every scenario id, grouped by suite
    List {
        /// Only list scenarios whose id or title contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Run the scenarios against the store and report (exit 0/1)
    Run {
        /// Only run scenarios whose id or title contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Only run scenarios for this persona (`problem` or `problem_user`)
        #[arg(long, value_parser = parse_persona)]
        persona: Option<Persona>,
        /// Store base URL (overrides config)
        #[arg(long)]
        url: Option<String>,
        /// Per-pixel sensitivity for image checks (0.0-1.0)
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,
        /// Print per-scenario timing breakdown table
        #[arg(long)]
        timings: bool,
        #[command(flatten)]
        browser: BrowserConfig,
    },
}
