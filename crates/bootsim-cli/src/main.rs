//! Bootsim command-line interface.
//!
//! Plays a simulated secure-boot chain in the terminal.
//!
//! # Quick Start
//!
//! ```bash
//! # List the boot stages
//! bootsim stages
//!
//! # Play a normal boot through, instantly
//! bootsim run
//!
//! # Watch a tampered image trip safe mode, in real time at 2x
//! bootsim run --mode tampered --speed 2 --realtime
//!
//! # Inspect the hardware view at stage 6
//! bootsim inspect 6 --mode tampered
//! ```

mod commands;
mod style;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bootsim::BootMode;
use bootsim_config::{BootSimConfig, ColorMode, ConfigLoader};
use clap::{Parser, Subcommand};

/// Bootsim - watch a secure-boot chain of trust verify itself.
#[derive(Parser)]
#[command(name = "bootsim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Read configuration from this file instead of the layered sources.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// List the boot stages.
    Stages {
        /// Print the catalog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Play the boot chain through to completion.
    Run {
        /// Firmware image: normal or tampered.
        #[arg(short, long)]
        mode: Option<BootMode>,

        /// Playback multiplier (0.25 to 3.0, in steps of 0.25).
        #[arg(short, long)]
        speed: Option<f64>,

        /// Wait out each stage on the wall clock.
        #[arg(long, conflicts_with = "step")]
        realtime: bool,

        /// Step through the stages manually instead of on timers.
        #[arg(long)]
        step: bool,
    },

    /// Show the simulated hardware state at one stage.
    Inspect {
        /// Stage to seek to (0 through the stage count).
        stage: u32,

        /// Firmware image: normal or tampered.
        #[arg(short, long)]
        mode: Option<BootMode>,

        /// Print a JSON snapshot.
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration.
    Show {
        /// Project directory to resolve bootsim.toml from.
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Output format (toml, json).
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BootSimConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ConfigLoader::new()
            .load()
            .context("Failed to load configuration")?,
    };

    // Initialize logging; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    style::set_no_color(cli.no_color || !color_enabled(config.display.color));

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Stages { json } => commands::stages::run(json),
        Commands::Run {
            mode,
            speed,
            realtime,
            step,
        } => commands::run::run(
            &config,
            &commands::run::RunArgs {
                mode,
                speed,
                realtime,
                step,
            },
        ),
        Commands::Inspect { stage, mode, json } => {
            commands::inspect::run(&config, stage, mode, json)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { dir, format } => commands::config::show(&dir, &format),
        },
    }
}

fn color_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
        }
    }
}
