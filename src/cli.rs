use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::logging;
use crate::output::OutputMode;

mod commands;

#[derive(Parser)]
#[command(name = "panel-clean")]
#[command(version)]
#[command(about = "Reclaim disk space left behind by a 1Panel installation")]
#[command(
    long_about = "panel-clean scans the panel's well-known directories for reclaimable \
    artifacts (upgrade packages, snapshots, rollback staging, uploads, downloads, logs) \
    and deletes a selection of them.\n\n\
    Deletion is permanent.\n\n\
    Examples:\n  \
    panel-clean scan                         # Show the report\n  \
    panel-clean scan --json > report.json    # Machine-readable report\n  \
    panel-clean clean --defaults --dry-run   # Preview the default selection\n  \
    panel-clean clean --selection sel.json   # Clean a chosen selection\n  \
    panel-clean stats                        # Last clean statistics"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Where the panel lives; shared by every command that touches it
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Config file (defaults to the per-user config location)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Application base directory, e.g. /opt
    #[arg(long, value_name = "PATH")]
    pub base_dir: Option<PathBuf>,

    /// Backup directory (defaults to <base-dir>/1panel/backup)
    #[arg(long, value_name = "PATH")]
    pub backup_dir: Option<PathBuf>,
}

impl PathArgs {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load config")?;
        config.apply_cli_overrides(self.base_dir.clone(), self.backup_dir.clone());
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the report of reclaimable artifacts (read-only)
    #[command(visible_alias = "s")]
    Scan {
        #[command(flatten)]
        paths: PathArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a selection of report items
    #[command(visible_alias = "c")]
    Clean {
        #[command(flatten)]
        paths: PathArgs,

        /// JSON selection list, `-` for stdin
        #[arg(long, value_name = "FILE", conflicts_with = "defaults", required_unless_present = "defaults")]
        selection: Option<PathBuf>,

        /// Clean what a fresh scan selects by default
        #[arg(long)]
        defaults: bool,

        /// Show what would be removed without removing anything
        #[arg(long)]
        dry_run: bool,

        /// Never restart the service, even after a cache clean
        #[arg(long)]
        no_restart: bool,

        /// Keep statistics and task records in memory only
        #[arg(long)]
        no_store: bool,
    },

    /// Show statistics of the last clean
    Stats {
        #[command(flatten)]
        paths: PathArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or reset configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long, conflicts_with = "show")]
        reset: bool,

        /// Config file to operate on
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> anyhow::Result<()> {
        let output_mode = OutputMode::from_flags(self.quiet, self.verbose);
        let verbosity: i8 = if self.quiet {
            -1
        } else {
            self.verbose.min(i8::MAX as u8) as i8
        };

        let log_config = match &self.command {
            Commands::Scan { paths, .. }
            | Commands::Clean { paths, .. }
            | Commands::Stats { paths, .. } => paths.load_config().map(|c| c.log).ok(),
            Commands::Config { .. } => None,
        }
        .unwrap_or_default();
        let _guard = logging::init_logger(&log_config, verbosity);

        match self.command {
            Commands::Scan { paths, json } => {
                commands::scan_command::handle_scan(&paths.load_config()?, json, output_mode)
            }
            Commands::Clean {
                paths,
                selection,
                defaults,
                dry_run,
                no_restart,
                no_store,
            } => commands::clean_command::handle_clean(
                &paths.load_config()?,
                commands::clean_command::CleanArgs {
                    selection,
                    defaults,
                    dry_run,
                    no_restart,
                    no_store,
                },
                output_mode,
            ),
            Commands::Stats { paths, json } => {
                commands::stats_command::handle_stats(&paths.load_config()?, json)
            }
            Commands::Config {
                show,
                reset,
                config,
            } => commands::config_command::handle_config(show, reset, config),
        }
    }
}
