mod commands;

use clap::Parser;
use hym_core::domain::{Failure, HymError};
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let args = std::env::args().collect::<Vec<_>>();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_hym_error();
            eprintln!("{}", diagnostic.fatal_report());
            diagnostic.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when running in-process.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[derive(Parser)]
#[command(
    name = "hym2viz",
    version,
    about = "Convert HYM binary output into visualization databases"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Convert binary field files into one database per cycle
    Convert(commands::ConvertArgs),
    /// Print a summary of one variable stored in a database
    Extract(commands::ExtractArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Convert(args) => commands::run_convert_command(args),
        CliCommand::Extract(args) => commands::run_extract_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(HymError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<HymError> for CliError {
    fn from(error: HymError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_hym_error(&self) -> HymError {
        match self {
            Self::Usage(message) => HymError::new(Failure::CliUsage, message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => HymError::new(Failure::Cli, format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, init_logging, parse_and_dispatch};

    #[test]
    fn logging_can_be_initialised_more_than_once() {
        init_logging(false);
        init_logging(true);
    }

    #[test]
    fn usage_errors_map_to_input_exit_code() {
        let args = vec!["hym2viz".to_string(), "convert".to_string()];
        let error = parse_and_dispatch(args).expect_err("missing arguments should fail");
        assert!(matches!(error, CliError::Usage(_)));
        let diagnostic = error.as_hym_error();
        assert_eq!(diagnostic.placeholder(), "INPUT.CLI_USAGE");
        assert_eq!(diagnostic.exit_code(), 2);
        assert!(diagnostic.fatal_report().ends_with("FATAL EXIT CODE: 2"));
    }
}
