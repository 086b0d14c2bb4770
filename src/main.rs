//! Leasehold CLI entry point.
//!
//! Parses arguments, loads the store's config, sets up logging, dispatches
//! the command, and maps the outcome to an exit code.

use leasehold::cli::Cli;
use leasehold::commands;
use leasehold::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let result = commands::load_config(&cli.store).and_then(|config| {
        logging::init(&config.log_filter);
        commands::dispatch(cli, config, &mut std::io::stdout().lock())
    });

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
