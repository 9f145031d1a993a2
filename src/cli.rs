//! CLI argument parsing for groum-ingest

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for comparison results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "groum-ingest")]
#[command(version)]
#[command(about = "Ingest mined API-usage pattern dumps into graph artifacts", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a range of clusters into DOT, ACDFG and summary files
    Process {
        /// Pipeline configuration (TOML); defaults apply when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// First cluster id (inclusive)
        #[arg(long, value_name = "ID", default_value = "1")]
        first: u32,

        /// Last cluster id (inclusive)
        #[arg(long, value_name = "ID")]
        last: u32,
    },

    /// Parse one dump and print its statistics table
    Parse {
        /// Dump file to parse
        dump: PathBuf,

        /// The dump is an anomaly dump
        #[arg(long)]
        anomalies: bool,

        /// Cluster id recorded in every row
        #[arg(long, value_name = "ID", default_value = "0")]
        cluster: u32,

        /// Minimum pattern frequency
        #[arg(long = "min-frequency", value_name = "N", default_value = "20")]
        min_frequency: u32,
    },

    /// Compare the patterns of two cluster summary files
    Compare {
        /// Summary file of the first tool run
        left: PathBuf,

        /// Summary file of the second tool run
        right: PathBuf,

        /// Only compare patterns calling every method listed in this file
        #[arg(long = "require-methods", value_name = "FILE")]
        require_methods: Option<PathBuf>,

        /// Take `required_methods` from a pipeline configuration instead
        #[arg(short, long, value_name = "FILE", conflicts_with = "require_methods")]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_process_range() {
        let cli = Cli::parse_from(["groum-ingest", "process", "--first", "3", "--last", "9"]);
        match cli.command {
            Command::Process {
                config,
                first,
                last,
            } => {
                assert!(config.is_none());
                assert_eq!(first, 3);
                assert_eq!(last, 9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cli_process_requires_last() {
        assert!(Cli::try_parse_from(["groum-ingest", "process"]).is_err());
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["groum-ingest", "parse", "run1.out"]);
        assert!(!cli.debug);
        match cli.command {
            Command::Parse {
                dump,
                anomalies,
                cluster,
                min_frequency,
            } => {
                assert_eq!(dump, PathBuf::from("run1.out"));
                assert!(!anomalies);
                assert_eq!(cluster, 0);
                assert_eq!(min_frequency, 20);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cli_debug_is_global() {
        let cli = Cli::parse_from(["groum-ingest", "parse", "--anomalies", "a.out", "--debug"]);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_compare_format() {
        let cli = Cli::parse_from([
            "groum-ingest",
            "compare",
            "a.txt",
            "b.txt",
            "--format",
            "json",
            "--require-methods",
            "methods_1.txt",
        ]);
        match cli.command {
            Command::Compare {
                format,
                require_methods,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(require_methods, Some(PathBuf::from("methods_1.txt")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cli_compare_filter_sources_conflict() {
        assert!(Cli::try_parse_from([
            "groum-ingest",
            "compare",
            "a.txt",
            "b.txt",
            "--config",
            "groum.toml",
            "--require-methods",
            "methods_1.txt",
        ])
        .is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(
            Cli::try_parse_from(["groum-ingest", "compare", "a", "b", "--format", "csv"]).is_err()
        );
    }
}
