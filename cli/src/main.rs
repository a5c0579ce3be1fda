#![deny(missing_docs)]

//! # API Check CLI
//!
//! Command Line Interface for OpenAPI compliance checking.
//!
//! Supported Commands:
//! - `check`: Validates an implementation document against a base document.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

mod check;
mod error;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI compliance checker")]
struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that an implementation document complies with the base document.
    Check(check::CheckArgs),
}

fn init_logging(verbose: bool) -> CliResult<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

fn run(cli: &Cli) -> CliResult<ExitCode> {
    init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Check(args) => {
            let outcome = check::execute(args)?;
            println!("{}", outcome.output);
            Ok(if outcome.compliant {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "apicheck",
            "check",
            "--base",
            "base.yaml",
            "impl.yaml",
            "--enum-policy",
            "base-subset",
            "--reserved-prefix",
            "/api/",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Check(args) = cli.command;
        assert_eq!(args.base.to_str(), Some("base.yaml"));
        assert_eq!(args.implementation.to_str(), Some("impl.yaml"));
        assert_eq!(args.enum_policy, check::EnumPolicyArg::BaseSubset);
        assert_eq!(args.reserved_prefix, "/api/");
        assert_eq!(args.format, check::OutputFormat::Json);
    }

    #[test]
    fn test_check_requires_implementation_path() {
        assert!(Cli::try_parse_from(["apicheck", "check", "--base", "base.yaml"]).is_err());
    }
}
