//! Flare CLI - Command-line tools for particle emitter configs

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{behaviors, simulate, validate};

#[derive(Parser)]
#[command(name = "flare")]
#[command(about = "Simulate and validate 2D particle emitter configs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an emitter headless and report particle counts
    Simulate {
        /// Path to emitter config (.json or .toml)
        config: String,

        /// Number of updates to run
        #[arg(long, default_value = "60")]
        frames: u32,

        /// Seconds per update
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// Random seed, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Check that a config builds a working emitter
    Validate {
        /// Path to emitter config (.json or .toml)
        config: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// List registered behavior and spawn shape types
    Behaviors,
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            dt,
            seed,
            format,
        } => simulate::run(simulate::SimulateArgs {
            config,
            frames,
            dt,
            seed,
            format,
        }),
        Commands::Validate { config, format } => validate::run(&config, &format),
        Commands::Behaviors => behaviors::run(),
    }
}
