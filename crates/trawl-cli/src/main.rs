//! trawl CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trawl_cli::cli::{Cli, Commands};
use trawl_cli::commands::{open_store, GetCommand, ListCommand};
use trawl_cli::output::OutputFormat;
use trawl_core::CancellationToken;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), trawl_cli::CliError> {
    let service = open_store(cli.fixture.as_deref())?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Get(args) => {
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_shutdown(cancel.clone()));
            let mut stderr = io::stderr();
            GetCommand::new(service)
                .execute(&mut stdout, &mut stderr, &args, &cancel)
                .await?;
        }
        Commands::List { command } => {
            ListCommand::new(service)
                .execute(&mut stdout, &format, &command)
                .await?;
        }
    }

    Ok(())
}

/// Cancels `cancel` on SIGINT, or SIGTERM on unix.
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("received SIGINT, stopping"),
        () = terminate => info!("received SIGTERM, stopping"),
        () = cancel.cancelled() => return,
    }
    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use trawl_cli::cli::ListCommands;

    #[test]
    fn cli_parses_get() {
        let cli = Cli::parse_from(["trawl", "get", "/app/web", "-f"]);
        assert!(matches!(cli.command, Commands::Get(ref args) if args.follow));
    }

    #[test]
    fn cli_parses_list_groups() {
        let cli = Cli::parse_from(["trawl", "list", "groups"]);
        match cli.command {
            Commands::List {
                command: ListCommands::Groups { prefix },
            } => assert_eq!(prefix, "/"),
            other => panic!("expected list groups, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_without_store_fails() {
        let mut cli = Cli::parse_from(["trawl", "list", "groups"]);
        cli.fixture = None;
        let result = run(cli).await;
        assert!(matches!(result, Err(trawl_cli::CliError::Usage(_))));
    }
}
