//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Mortdash - mortality statistics dashboard builder
///
/// Joins mortality records with division names and cause descriptions,
/// filters them to one reporting year and renders the seven dashboard
/// panels as Markdown or JSON.
///
/// Examples:
///   mortdash --data-dir ./data
///   mortdash --data-dir ./data --year 2019 --format json -o dashboard.json
///   mortdash --mortality deaths.csv --causes causes.csv --divisions divipola.csv
///   mortdash --data-dir ./data --dry-run
///   mortdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the three input tables
    #[arg(short, long, value_name = "DIR", env = "MORTDASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Mortality table (CSV), relative to the data directory
    #[arg(long, value_name = "FILE")]
    pub mortality: Option<PathBuf>,

    /// Cause-of-death description table (CSV), relative to the data directory
    #[arg(long, value_name = "FILE")]
    pub causes: Option<PathBuf>,

    /// Administrative-division table (CSV), relative to the data directory
    #[arg(long, value_name = "FILE")]
    pub divisions: Option<PathBuf>,

    /// Reporting year to filter the mortality records to
    #[arg(short, long, value_name = "YEAR", env = "MORTDASH_YEAR")]
    pub year: Option<i32>,

    /// Field delimiter of the input tables
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Output file path for the dashboard
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mortdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Load and prepare the data, print preparation counters and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when no record matches the reporting year
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Generate a default .mortdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(year) = self.year {
            if !(1900..=2100).contains(&year) {
                return Err(format!("Year must be between 1900 and 2100, got {}", year));
            }
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        if let Some(ref dir) = self.data_dir {
            if !dir.is_dir() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data_dir: None,
            mortality: None,
            causes: None,
            divisions: None,
            year: Some(2019),
            delimiter: None,
            output: None,
            format: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            fail_on_empty: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_year_out_of_range() {
        let mut args = make_args();
        args.year = Some(19);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let mut args = make_args();
        args.data_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "mortdash",
            "--year",
            "2020",
            "--format",
            "json",
            "--delimiter",
            ";",
        ])
        .unwrap();
        assert_eq!(args.year, Some(2020));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.delimiter, Some(';'));
    }
}
