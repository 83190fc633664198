use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use gam::api::Session;
use gam::args::Words;
use gam::cli::Cli;
use gam::command::{self, Command, Context};
use gam::commands;
use gam::config::Config;
use gam::credentials::{self, CredentialRecord};
use gam::error::exit_code;
use gam::http::Transport;

/// Exit status when the operator interrupts a run.
const INTERRUPTED: i32 = 50;

fn main() {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    let default_filter = if config.debug { "warn,gam=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Calls are sequential; two workers leave room for the signal handler.
    let runtime = match Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start the runtime: {}", err);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(async {
        tokio::select! {
            result = async_main(cli, &config) => match result {
                Ok(()) => 0,
                Err(err) => {
                    eprintln!("{:#}", err);
                    exit_code(&err)
                }
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                INTERRUPTED
            }
        }
    });
    std::process::exit(code);
}

async fn async_main(cli: Cli, config: &Config) -> Result<()> {
    let command = command::parse(Words::new(cli.words))?;
    if !command.needs_session() {
        return run_local(&command, config).await;
    }

    let record = load_or_authorize(config).await?;
    let transport = Transport::new(config.timeout)?.with_credentials(&record);
    let session = Session::new(transport, config.endpoints.clone(), &record.domain);
    debug!("acting on {}", session.domain());
    let ctx = Context {
        session: &session,
        config,
    };
    command::run(&ctx, command).await
}

/// Commands that run without saved credentials.
async fn run_local(command: &Command, config: &Config) -> Result<()> {
    match command {
        Command::OAuthRequest => {
            commands::oauth::request(config).await?;
        }
        _ => commands::version::run(),
    }
    Ok(())
}

/// The saved record, or a fresh one from the interactive flow when the
/// file is missing or unreadable.
async fn load_or_authorize(config: &Config) -> Result<CredentialRecord> {
    match credentials::load(&config.oauth_file) {
        Ok(Some(record)) => Ok(record),
        Ok(None) => {
            eprintln!(
                "No credentials found at {}; starting authorization.",
                config.oauth_file.display()
            );
            commands::oauth::request(config).await
        }
        Err(err) => {
            warn!("{}", err);
            eprintln!("{}; starting authorization again.", err);
            commands::oauth::request(config)
                .await
                .context("replacing the unreadable credential file")
        }
    }
}
