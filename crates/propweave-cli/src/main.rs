//! propweave CLI - plan and apply change-notification weaving over type manifests.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;
mod config;

use commands::weave::{OutputFormat, WeaveArgs};
use commands::{config as config_cmd, weave};
use config::Config;

/// propweave - decide which types receive the change-notification capability.
///
/// Reads one or more type manifests (JSON), classifies the types of the
/// woven module and reports or applies the injection plan.
#[derive(Parser, Debug)]
#[command(
    name = "pw",
    author,
    version,
    about = "propweave: plan change-notification weaving",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the woven module and print the plan without changing anything.
    Plan {
        /// Manifest files or directories containing them.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Module to weave (required when several manifests are loaded).
        #[arg(short, long)]
        module: Option<String>,

        /// Output format: text or json.
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Report every conflict instead of stopping at the first one.
        #[arg(long)]
        collect_conflicts: bool,
    },

    /// Stamp the capability on the planned types and write the woven manifest.
    Apply {
        /// Manifest files or directories containing them.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Module to weave (required when several manifests are loaded).
        #[arg(short, long)]
        module: Option<String>,

        /// Where to write the woven module's manifest.
        #[arg(short, long)]
        output: PathBuf,

        /// Report every conflict instead of stopping at the first one.
        #[arg(long)]
        collect_conflicts: bool,
    },

    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Reset configuration to defaults.
    Reset,

    /// Show path to config file.
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    // Logs go to stderr so `--format json` stays parseable.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Plan {
            inputs,
            module,
            format,
            collect_conflicts,
        } => {
            let format: OutputFormat = format.parse()?;
            let args = WeaveArgs {
                inputs: &inputs,
                module: module.as_deref(),
                collect_conflicts,
            };
            weave::plan(&config, args, format)?;
        }

        Commands::Apply {
            inputs,
            module,
            output,
            collect_conflicts,
        } => {
            let args = WeaveArgs {
                inputs: &inputs,
                module: module.as_deref(),
                collect_conflicts,
            };
            weave::apply(&config, args, &output)?;
        }

        Commands::Config(config_cmd_inner) => {
            let mut config = config;
            match config_cmd_inner {
                ConfigCommands::Show => {
                    config_cmd::show(&config)?;
                }
                ConfigCommands::Set { key, value } => {
                    config_cmd::set(&mut config, &key, &value)?;
                }
                ConfigCommands::Get { key } => {
                    config_cmd::get(&config, &key)?;
                }
                ConfigCommands::Reset => {
                    config_cmd::reset()?;
                }
                ConfigCommands::Path => {
                    if let Some(path) = Config::config_file_path() {
                        println!("{}", path.display());
                    } else {
                        println!("(no config file path available)");
                    }
                }
            }
        }
    }

    Ok(())
}
