#![deny(missing_docs)]

//! # Check Command
//!
//! Loads the base and implementation documents and validates compliance.
//!
//! Text output reports non-compliance as an error. JSON output always prints
//! the finding records and signals non-compliance through the exit status.

use std::path::{Path, PathBuf};

use apicheck_core::{
    check_compliance, validate_compliance, CheckOptions, Document, EnumPolicy,
    DEFAULT_MAX_SCHEMA_DEPTH, DEFAULT_RESERVED_PREFIX,
};

use crate::error::{CliError, CliResult};

/// Printed when the implementation passes every check.
pub const COMPLIANT: &str = "Spec is compliant with the base spec";

/// Enum rule direction, as spelled on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPolicyArg {
    /// Implementation enums may only narrow the base enum.
    ImplSubset,
    /// Implementation enums must keep every base value.
    BaseSubset,
}

impl From<EnumPolicyArg> for EnumPolicy {
    fn from(arg: EnumPolicyArg) -> Self {
        match arg {
            EnumPolicyArg::ImplSubset => EnumPolicy::ImplSubsetOfBase,
            EnumPolicyArg::BaseSubset => EnumPolicy::BaseSubsetOfImpl,
        }
    }
}

/// Report format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report.
    Text,
    /// A JSON array of finding records.
    Json,
}

/// What the command prints, and whether the implementation passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Text for standard output.
    pub output: String,
    /// `false` when any finding was reported.
    pub compliant: bool,
}

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Path to the base OpenAPI document (YAML or JSON).
    #[arg(long, env = "APICHECK_BASE_SPEC")]
    pub base: PathBuf,

    /// Path to the implementation OpenAPI document (YAML or JSON).
    #[arg(value_name = "IMPL")]
    pub implementation: PathBuf,

    /// Paths under this prefix must be declared by the base document.
    #[arg(long, env = "APICHECK_RESERVED_PREFIX", default_value = DEFAULT_RESERVED_PREFIX)]
    pub reserved_prefix: String,

    /// Direction of the enum compatibility rule.
    #[arg(
        long,
        value_enum,
        env = "APICHECK_ENUM_POLICY",
        default_value_t = EnumPolicyArg::ImplSubset
    )]
    pub enum_policy: EnumPolicyArg,

    /// Maximum schema nesting depth before a schema is rejected.
    #[arg(long, default_value_t = DEFAULT_MAX_SCHEMA_DEPTH)]
    pub max_schema_depth: usize,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl CheckArgs {
    fn options(&self) -> CheckOptions {
        CheckOptions::default()
            .with_reserved_prefix(self.reserved_prefix.as_str())
            .with_enum_policy(self.enum_policy.into())
            .with_max_schema_depth(self.max_schema_depth)
    }
}

/// Executes the check.
///
/// In text format a non-compliant implementation yields `Err` carrying the
/// formatted report.
pub fn execute(args: &CheckArgs) -> CliResult<Outcome> {
    let base = load(&args.base)?;
    let implementation = load(&args.implementation)?;
    let options = args.options();

    match args.format {
        OutputFormat::Text => {
            validate_compliance(&base, &implementation, &options)?;
            Ok(Outcome {
                output: COMPLIANT.to_string(),
                compliant: true,
            })
        }
        OutputFormat::Json => {
            let errors = check_compliance(&base, &implementation, &options)?;
            Ok(Outcome {
                output: serde_json::to_string_pretty(&errors.records())?,
                compliant: errors.is_empty(),
            })
        }
    }
}

fn load(path: &Path) -> CliResult<Document> {
    if !path.exists() {
        return Err(CliError::General(format!(
            "Spec file not found: {}",
            path.display()
        )));
    }
    Ok(Document::load(path)?)
}
