//! # Gait-CLI
//!
//! Command-line front end for FSR gait analysis. Loads a `time,force` CSV
//! recording, runs the filter → slope → detection pipeline and prints the
//! detected heel strikes and toe-offs.
//!
//! ## Usage
//!
//! ```bash
//! # Butterworth 8 Hz (default), thresholds from the command line
//! gait analyze fsr.csv --on 25 --off 15 --min-phase 0.15
//!
//! # Moving average, settings from a file, JSON report
//! gait analyze fsr.csv --config gait.toml --filter moving-average --window 5 --json
//! ```

use clap::{Parser, Subcommand};

pub mod analyze;
pub mod config;
pub mod recording;

pub use crate::config::{DetectionSettings, FilterKind, FilterSettings, Settings};

/// FSR gait event analysis
#[derive(Parser, Debug)]
#[command(name = "gait")]
#[command(author, version, about = "Heel strike and toe-off detection from FSR force recordings")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter a recording and detect gait events
    Analyze(analyze::AnalyzeArgs),

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "gait",
            "analyze",
            "walk.csv",
            "--filter",
            "moving-average",
            "--window",
            "5",
            "--on",
            "30",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.input.to_str(), Some("walk.csv"));
                assert_eq!(args.filter, Some(FilterKind::MovingAverage));
                assert_eq!(args.window, Some(5));
                assert_eq!(args.force_on, Some(30.0));
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
