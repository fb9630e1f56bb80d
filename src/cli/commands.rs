//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: one full pinning cycle
//! - preview: selections only, history untouched
//! - specials: special collections active on a date
//! - history: stored pin history and the current cool-down set

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Collexions - rotate which collections are pinned
#[derive(Parser, Debug)]
#[command(name = "collexions")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one pinning cycle and record it in history
    Run {
        /// Catalog snapshot file (YAML or JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Seed the random selection for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show what a cycle would pin without pinning or recording anything
    Preview {
        /// Catalog snapshot file (YAML or JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Seed the random selection for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List special collections active on a date
    Specials {
        /// Date to evaluate (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show pin history and titles still in their cool-down
    History,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["collexions", "run", "--catalog", "catalog.yml"]).unwrap();
        match cli.command {
            Commands::Run { catalog, seed } => {
                assert_eq!(catalog, PathBuf::from("catalog.yml"));
                assert!(seed.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_preview_with_seed_and_global_config() {
        let cli = Cli::try_parse_from([
            "collexions",
            "preview",
            "--catalog",
            "snap.json",
            "--seed",
            "7",
            "--config",
            "custom.yml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        assert!(matches!(cli.command, Commands::Preview { seed: Some(7), .. }));
    }

    #[test]
    fn test_parse_specials_date() {
        let cli = Cli::try_parse_from(["collexions", "specials", "--date", "2025-12-24"]).unwrap();
        match cli.command {
            Commands::Specials { date } => assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 24)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_specials_bad_date() {
        assert!(Cli::try_parse_from(["collexions", "specials", "--date", "Christmas"]).is_err());
    }

    #[test]
    fn test_parse_history_verbose() {
        let cli = Cli::try_parse_from(["collexions", "-v", "history"]).unwrap();
        assert!(cli.is_verbose());
        assert!(matches!(cli.command, Commands::History));
    }

    #[test]
    fn test_run_requires_catalog() {
        assert!(Cli::try_parse_from(["collexions", "run"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["collexions"]).is_err());
    }
}
