use clap::Parser;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

use roomchat::config::Cli;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Must run before any other thread exists, so before the runtime starts.
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let config = match Cli::parse().into_config(local_offset) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("roomchat: {error}");
            return std::process::ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("roomchat: failed to start runtime: {error}");
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(roomchat::app::run(config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "roomchat exited");
            eprintln!("roomchat: {error}");
            std::process::ExitCode::FAILURE
        }
    }
}
