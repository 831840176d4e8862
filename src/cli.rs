//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use core_runtime::logging::{LogFormat, LogLevel};

/// Queue a OneDrive folder tree on an aria2 daemon.
///
/// Reads the configured OneDrive targets through Microsoft Graph, flattens
/// them into a list of files and submits each file to aria2 over JSON-RPC.
#[derive(Parser, Debug)]
#[command(name = "drive-relay")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "./config.json")]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    /// Collect and print the items without queuing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn log_level(&self) -> LogLevel {
        match self.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["drive-relay"]).unwrap();
        assert_eq!(args.config, PathBuf::from("./config.json"));
        assert_eq!(args.verbose, 0);
        assert_eq!(args.log_format, LogFormatArg::Compact);
        assert!(!args.dry_run);
        assert_eq!(args.log_level(), LogLevel::Info);
    }

    #[test]
    fn test_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["drive-relay", "-v"]).unwrap();
        assert_eq!(args.log_level(), LogLevel::Debug);

        let args = Args::try_parse_from(["drive-relay", "-vvv"]).unwrap();
        assert_eq!(args.verbose, 3);
        assert_eq!(args.log_level(), LogLevel::Trace);
    }

    #[test]
    fn test_config_and_format() {
        let args = Args::try_parse_from([
            "drive-relay",
            "--config",
            "/etc/relay.json",
            "--log-format",
            "json",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("/etc/relay.json"));
        assert_eq!(LogFormat::from(args.log_format), LogFormat::Json);
        assert!(args.dry_run);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result = Args::try_parse_from(["drive-relay", "--log-format", "xml"]);
        assert!(result.is_err());
    }
}
