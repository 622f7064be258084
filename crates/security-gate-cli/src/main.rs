// crates/security-gate-cli/src/main.rs
// ============================================================================
// Module: Security Gate CLI Entry Point
// Description: Command dispatcher for envelope validation and gate runs.
// Purpose: Give CI pipelines a deterministic pass/fail surface.
// Dependencies: clap, security-gate-config, security-gate-core, security-gate-crypto,
//               security-gate-network, serde, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! Commands:
//! - `envelope validate <FILE>` validates one envelope or an array.
//! - `policy list` prints the security policy presets.
//! - `run --input <FILE>` executes the configured gates.
//!
//! Exit codes: `0` when everything passed, `1` when validation failed, `2`
//! on operational errors (unreadable input, bad configuration, unknown
//! policy). Inputs are untrusted and read with a size limit.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use security_gate_cli::render::render_batch;
use security_gate_cli::render::render_policies;
use security_gate_cli::render::render_run;
use security_gate_config::CONFIG_ENV_VAR;
use security_gate_config::DEFAULT_CONFIG_NAME;
use security_gate_config::SecurityGateConfig;
use security_gate_core::GateRunReport;
use security_gate_core::GateRunner;
use security_gate_crypto::CryptoGate;
use security_gate_crypto::SecurityPolicy;
use security_gate_network::NetworkGate;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a JSON input file.
const MAX_INPUT_BYTES: usize = 8 * 1024 * 1024;
/// Exit code for failed validation.
const EXIT_INVALID: u8 = 1;
/// Exit code for operational errors.
const EXIT_OPERATIONAL: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "security-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Crypto envelope utilities.
    Envelope {
        /// Selected envelope subcommand.
        #[command(subcommand)]
        command: EnvelopeCommand,
    },
    /// Security policy utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
    /// Execute configured security gates.
    Run(RunCommand),
}

/// Envelope subcommands.
#[derive(Subcommand, Debug)]
enum EnvelopeCommand {
    /// Validate one envelope or an array of envelopes.
    Validate(EnvelopeValidateCommand),
}

/// Arguments for `envelope validate`.
#[derive(Args, Debug)]
struct EnvelopeValidateCommand {
    /// JSON file holding an envelope object or an array of envelopes.
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Security policy preset.
    #[arg(long, value_name = "NAME", default_value = "staging")]
    policy: String,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// List security policy presets and their toggles.
    List {
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// JSON input handed to every gate.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Configuration file (defaults to `SECURITY_GATE_CONFIG` or `security-gate.toml`).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Gates to run, in order; all gates when omitted.
    #[arg(long = "gate", value_name = "NAME")]
    gates: Vec<String>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operational failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors raised while reading bounded input files.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// Underlying I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// File exceeds the size limit.
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge {
        /// Observed size.
        size: u64,
        /// Configured limit.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Envelope {
            command: EnvelopeCommand::Validate(command),
        } => command_envelope_validate(&command),
        Commands::Policy {
            command: PolicyCommand::List {
                format,
            },
        } => command_policy_list(format),
        Commands::Run(command) => command_run(command).await,
    }
}

// ============================================================================
// SECTION: Envelope Command
// ============================================================================

/// Validates envelopes from a file under a named policy.
fn command_envelope_validate(command: &EnvelopeValidateCommand) -> CliResult<ExitCode> {
    let policy = SecurityPolicy::from_name(&command.policy)
        .map_err(|err| CliError::new(err.to_string()))?;
    let value = read_json(&command.file)?;
    let envelopes = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => {
            return Err(CliError::new(format!(
                "{}: expected an envelope object or an array of envelopes",
                command.file.display()
            )));
        }
    };

    let batch = CryptoGate::with_policy(policy).validate_batch(&envelopes);
    match command.format {
        OutputFormat::Text => write_stdout_line(&render_batch(&batch, &envelopes))?,
        OutputFormat::Json => write_json(&json!({
            "policy": policy.name(),
            "results": batch.results,
            "summary": batch.summary,
        }))?,
    }
    Ok(exit_for(batch.summary.invalid == 0))
}

// ============================================================================
// SECTION: Policy Command
// ============================================================================

/// Lists the policy presets.
fn command_policy_list(format: OutputFormat) -> CliResult<ExitCode> {
    match format {
        OutputFormat::Text => write_stdout_line(&render_policies())?,
        OutputFormat::Json => {
            let policies: Vec<Value> = SecurityPolicy::all()
                .into_iter()
                .map(|policy| json!({"name": policy.name(), "config": policy.config()}))
                .collect();
            write_json(&Value::Array(policies))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the configured gates against an input file.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let input = read_json(&command.input)?;
    let runner = build_runner(&config)?;

    let report: GateRunReport = if command.gates.is_empty() {
        match runner.execute_all(&input, None).await {
            Ok(report) => report,
            Err(err) => err.into_report(),
        }
    } else {
        runner.execute_selected(command.gates.as_slice(), &input, None).await
    };

    match command.format {
        OutputFormat::Text => write_stdout_line(&render_run(&report))?,
        OutputFormat::Json => write_json(&report)?,
    }
    Ok(exit_for(report.summary.all_passed()))
}

/// Loads configuration, falling back to defaults when no file is present.
fn load_config(path: Option<&Path>) -> CliResult<SecurityGateConfig> {
    let implicit_file =
        std::env::var_os(CONFIG_ENV_VAR).is_some() || Path::new(DEFAULT_CONFIG_NAME).exists();
    if path.is_none() && !implicit_file {
        return Ok(SecurityGateConfig::default());
    }
    SecurityGateConfig::load(path).map_err(|err| CliError::new(err.to_string()))
}

/// Builds a runner with the crypto and network gates registered.
fn build_runner(config: &SecurityGateConfig) -> CliResult<GateRunner> {
    let audit = config.audit.build_sink().map_err(|err| CliError::new(err.to_string()))?;
    let runner = GateRunner::new(config.runner.clone()).with_audit_sink(audit);
    let crypto = config.crypto.build_gate().map_err(|err| CliError::new(err.to_string()))?;
    runner.register_gate(crypto).map_err(|err| CliError::new(err.to_string()))?;
    runner
        .register_gate(NetworkGate::new(config.network))
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(runner)
}

// ============================================================================
// SECTION: I/O Helpers
// ============================================================================

/// Maps an overall pass flag to an exit code.
fn exit_for(passed: bool) -> ExitCode {
    if passed { ExitCode::SUCCESS } else { ExitCode::from(EXIT_INVALID) }
}

/// Reads and parses a bounded JSON file.
fn read_json(path: &Path) -> CliResult<Value> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("{}: invalid JSON: {err}", path.display())))
}

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Writes pretty-printed JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an operational error and returns the matching exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(EXIT_OPERATIONAL)
}
