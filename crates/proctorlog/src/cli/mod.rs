//! Command-line interface for proctorlog.
//!
//! This module provides the CLI structure for the `proctord` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, RiskCommand, ServeCommand, StatusCommand};

/// proctord - Exam-proctoring record service
///
/// Registers students, records flagged exam events and scores risk from
/// event counts over a small HTTP/JSON API.
#[derive(Debug, Parser)]
#[command(name = "proctord")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeCommand),

    /// Show store location and collection sizes
    Status(StatusCommand),

    /// Compute the risk score for an email from stored events
    Risk(RiskCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "proctord");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().verbosity();

        assert_eq!(parse(&["proctord", "-q", "status"]), crate::logging::Verbosity::Quiet);
        assert_eq!(parse(&["proctord", "status"]), crate::logging::Verbosity::Normal);
        assert_eq!(parse(&["proctord", "-v", "status"]), crate::logging::Verbosity::Verbose);
        assert_eq!(parse(&["proctord", "-vv", "status"]), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve_with_port() {
        let cli = Cli::try_parse_from(["proctord", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.port, Some(9000));
                assert!(cmd.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_risk() {
        let cli = Cli::try_parse_from(["proctord", "risk", "ada@example.com", "--json"]).unwrap();
        match cli.command {
            Command::Risk(cmd) => {
                assert_eq!(cmd.email, "ada@example.com");
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_risk_requires_email() {
        assert!(Cli::try_parse_from(["proctord", "risk"]).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["proctord", "config", "validate", "-f", "/tmp/c.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["proctord", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
