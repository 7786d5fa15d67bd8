// crates/qa-platform-cli/src/main.rs
// ============================================================================
// Module: QA Platform CLI Entry Point
// Description: Command dispatcher for the forum server and its fixtures.
// Purpose: Serve the HTTP API, validate config, and seed stores.
// Dependencies: clap, qa-platform-config, qa-platform-core, qa-platform-server, tokio
// ============================================================================

//! ## Overview
//! The `qa-platform` binary starts the forum HTTP server, validates a
//! configuration file without serving, and loads JSON fixture bundles into
//! the configured store. Fixture files are untrusted input and are read with
//! a hard size limit.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use qa_platform_config::QaPlatformConfig;
use qa_platform_config::StoreConfig;
use qa_platform_core::Clock;
use qa_platform_core::FixtureReport;
use qa_platform_core::ForumFixture;
use qa_platform_core::ForumStore;
use qa_platform_core::SystemClock;
use qa_platform_server::ForumServer;
use qa_platform_server::audit::audit_sink_from_config;
use qa_platform_server::open_store;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum fixture bundle size in bytes.
const MAX_FIXTURE_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "qa-platform", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the forum HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Fixture utilities.
    Fixtures {
        /// Selected fixture subcommand.
        #[command(subcommand)]
        command: FixturesCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to qa-platform.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Optional fixture bundle loaded into the store before serving.
    #[arg(long, value_name = "PATH")]
    fixtures: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to qa-platform.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Fixture subcommands.
#[derive(Subcommand, Debug)]
enum FixturesCommand {
    /// Load a JSON fixture bundle into the configured store.
    ///
    /// Loading is not atomic: rows applied before a failing row are kept.
    Load(FixturesLoadCommand),
}

/// Arguments for fixture loading.
#[derive(Args, Debug)]
struct FixturesLoadCommand {
    /// Path to the fixture bundle JSON file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Optional config file path (defaults to qa-platform.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

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
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("qa-platform {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Fixtures {
            command,
        } => command_fixtures(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let fixture = command.fixtures.as_deref().map(read_fixture).transpose()?;
    let server = tokio::task::spawn_blocking(move || build_server(config, fixture))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))??;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the store, applies an optional fixture, and builds the server.
fn build_server(
    config: QaPlatformConfig,
    fixture: Option<ForumFixture>,
) -> CliResult<ForumServer> {
    let store = open_store(&config.store)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    if let Some(fixture) = fixture {
        let report = apply_fixture(store.as_ref(), fixture)?;
        write_stderr_line(&render_report(&report))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let audit = audit_sink_from_config(&config.server.audit)
        .map_err(|err| CliError::new(format!("server init failed: audit sink: {err}")))?;
    Ok(ForumServer::with_parts(config, store, Arc::new(SystemClock), audit))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<QaPlatformConfig> {
    QaPlatformConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Fixture Commands
// ============================================================================

/// Dispatches fixture subcommands.
fn command_fixtures(command: FixturesCommand) -> CliResult<ExitCode> {
    match command {
        FixturesCommand::Load(command) => command_fixtures_load(&command),
    }
}

/// Executes the fixture load command.
fn command_fixtures_load(command: &FixturesLoadCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let fixture = read_fixture(&command.file)?;
    if matches!(config.store, StoreConfig::Memory) {
        write_stderr_line("warning: memory store selected; loaded fixtures are discarded on exit")
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let store = open_store(&config.store)
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    let report = apply_fixture(store.as_ref(), fixture)?;
    let json = serde_json::to_string(&report)
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
    write_stdout_line(&json).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Reads and parses a fixture bundle.
fn read_fixture(path: &Path) -> CliResult<ForumFixture> {
    let bytes = read_bytes_with_limit(path, MAX_FIXTURE_BYTES).map_err(|err| {
        CliError::new(format!("failed to read fixture {}: {err}", path.display()))
    })?;
    ForumFixture::from_json(&bytes).map_err(|err| {
        CliError::new(format!("failed to parse fixture {}: {err}", path.display()))
    })
}

/// Applies a fixture bundle stamped with the current time.
///
/// Rows written before a failure stay in the store, and the error says so.
fn apply_fixture(store: &dyn ForumStore, fixture: ForumFixture) -> CliResult<FixtureReport> {
    fixture.apply(store, SystemClock.now()).map_err(|err| {
        CliError::new(format!("failed to apply fixture (rows before the failure were kept): {err}"))
    })
}

/// Formats a fixture report for humans.
fn render_report(report: &FixtureReport) -> String {
    format!(
        "fixtures loaded: created={} relations={} skipped={}",
        report.created, report.relations, report.skipped
    )
}

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

/// Errors raised while reading a size-limited file.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// File I/O failure.
    #[error("{0}")]
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    #[error("file size {size} exceeds limit {limit}")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
