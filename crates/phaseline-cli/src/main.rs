mod config;
mod render_cmd;
mod segments_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use phaseline_core::export::OutputFormat;

use config::{CliOverrides, PhaselineConfig};

#[derive(Parser)]
#[command(name = "phaseline", about = "Render multi-project phase timelines")]
struct Cli {
    /// Config file path (defaults to ~/.config/phaseline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `render` with no flags.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the timeline chart for today
    Render(RenderArgs),
    /// Print the computed timeline segments without rendering
    Segments {
        /// Input file: .csv, .xlsx or .toml
        #[arg(long)]
        input: Option<PathBuf>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write a config file with every default spelled out
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct RenderArgs {
    /// Input file: .csv, .xlsx or .toml
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory the chart is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Reference date for the today line and file name (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Image format: png or svg
    #[arg(long)]
    format: Option<OutputFormat>,
}

/// Execute the `phaseline init` command: write config file.
fn cmd_init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config::config_path);

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    config::save_config(&config::ConfigFile::with_defaults(), &path)?;
    println!("Config written to {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Render(RenderArgs::default())) {
        Commands::Render(args) => {
            let overrides = CliOverrides {
                config: cli.config,
                input: args.input,
                output_dir: args.output_dir,
                format: args.format,
            };
            let resolved = PhaselineConfig::resolve(&overrides)?;
            let today = args
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let path = render_cmd::run_render(&resolved, today)
                .with_context(|| format!("render run for {today} failed"))?;
            println!("Chart written to {}", path.display());
        }
        Commands::Segments { input, json } => {
            let overrides = CliOverrides {
                config: cli.config,
                input,
                ..CliOverrides::default()
            };
            let resolved = PhaselineConfig::resolve(&overrides)?;
            segments_cmd::run_segments(&resolved, json)?;
        }
        Commands::Init { force } => {
            cmd_init(cli.config, force)?;
        }
    }

    Ok(())
}
