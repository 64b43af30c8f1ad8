mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;
use mediadash_client::{ApiError, FailureKind};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    platform::logging::initialize(cli.verbose, cli.log_file.as_deref());

    match platform::app::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            // The session observer already told the user to log in again.
            let expired = err
                .downcast_ref::<ApiError>()
                .is_some_and(|err| err.kind == FailureKind::SessionExpired);
            if !expired {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
