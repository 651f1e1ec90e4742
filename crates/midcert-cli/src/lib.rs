// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod command_actions;
mod command_output_adapters;

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use clap::{error::ErrorKind, ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use midcert_core::{resolve_log_level, ExitCode, MachineError, ENV_MIDCERT_LOG_JSON};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const CRATE_NAME: &str = "midcert-cli";

const MIDCERT_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "midcert", version)]
#[command(about = "MID certification dataset generator, validator and pre-audit analytics")]
#[command(help_template = MIDCERT_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  MIDCERT_DATA_DIR   Data directory (default ./data)\n  MIDCERT_CONFIG     Generator config file\n  MIDCERT_LOG_LEVEL  Log verbosity override\n  MIDCERT_LOG_JSON   Emit logs as JSON when set to 1"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the four raw CSV tables
    Generate(GenerateArgs),
    /// Run the data-quality checks against the raw tables
    Validate,
    /// Load the raw tables into the SQLite store
    Load,
    /// Compute KPIs from the store
    Kpi,
    /// Build the pre-audit checklist and export it as CSV
    Checklist {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate, validate, load, compute KPIs and build the checklist
    Run(GenerateArgs),
    /// Print the effective generator configuration and resolved paths
    Config(GenerateArgs),
    /// Print a shell completion script
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub(crate) struct GenerateArgs {
    /// JSON generator config; unknown fields are rejected
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long)]
    pub(crate) applications: Option<u32>,
    #[arg(long)]
    pub(crate) clients: Option<u32>,
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
    trace: bool,
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub(crate) json: bool,
}

#[derive(Debug)]
pub(crate) struct CliError {
    pub(crate) exit_code: ExitCode,
    pub(crate) machine: MachineError,
}

impl CliError {
    pub(crate) fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", message),
        }
    }

    pub(crate) fn validation(code: &str, message: String) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new(code, &message),
        }
    }

    pub(crate) fn dependency(message: String) -> Self {
        Self {
            exit_code: ExitCode::DependencyFailure,
            machine: MachineError::new("dependency_failure", &message),
        }
    }

    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
    });
    let data_dir = midcert_core::resolve_data_dir(cli.data_dir);

    match command {
        Commands::Generate(args) => command_actions::generate(&data_dir, &args, output_mode),
        Commands::Validate => command_actions::validate(&data_dir, output_mode),
        Commands::Load => command_actions::load(&data_dir, output_mode),
        Commands::Kpi => command_actions::kpi(&data_dir, output_mode),
        Commands::Checklist { out } => command_actions::checklist(&data_dir, out, output_mode),
        Commands::Run(args) => command_actions::run_pipeline(&data_dir, &args, output_mode),
        Commands::Config(args) => command_actions::show_config(&data_dir, &args, output_mode),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    }
}

fn log_directive(flags: LogFlags) -> Option<&'static str> {
    if flags.trace {
        Some("trace")
    } else if flags.verbose > 1 {
        Some("debug")
    } else if flags.verbose == 1 {
        Some("info")
    } else if flags.quiet {
        Some("error")
    } else {
        None
    }
}

/// Flags win over `RUST_LOG`, which wins over `MIDCERT_LOG_LEVEL`. Logs go to
/// stderr so stdout stays parseable under `--json`.
fn init_tracing(flags: LogFlags) {
    let filter = match log_directive(flags) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(resolve_log_level().unwrap_or_else(|| "warn".to_string()))
        }),
    };
    let log_json = std::env::var(ENV_MIDCERT_LOG_JSON)
        .map(|v| matches!(v.trim(), "1" | "true"))
        .unwrap_or(false);
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing already initialised: {err}");
    }
}

fn print_completion<G: Generator>(generator: G) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(generator, &mut command, name, &mut std::io::stdout());
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("error: {}", error.machine.message);
        for (key, value) in &error.machine.details {
            eprintln!("  {key}: {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(quiet: bool, verbose: u8, trace: bool) -> LogFlags {
        LogFlags {
            quiet,
            verbose,
            trace,
        }
    }

    #[test]
    fn log_flags_map_to_directives() {
        assert_eq!(log_directive(flags(false, 0, false)), None);
        assert_eq!(log_directive(flags(true, 0, false)), Some("error"));
        assert_eq!(log_directive(flags(false, 1, false)), Some("info"));
        assert_eq!(log_directive(flags(false, 2, false)), Some("debug"));
        assert_eq!(log_directive(flags(true, 0, true)), Some("trace"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
