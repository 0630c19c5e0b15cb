use crate::config::{Config, ConfigError};
use crate::ip_source::mydns::{IPNotifierMyDns, MYDNS_URL_TEMPLATE};
use crate::runner::{Runner, EXIT_FAILURE, EXIT_SUCCESS};
use crate::schedule::ScheduleError;
use crate::sink::Sink;
use clap::Parser;
use opts::Opts;
use reqwest::{Client, ClientBuilder};
use std::io;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
mod config;
mod ip_source;
mod logging;
mod opts;
mod runner;
mod schedule;
mod sink;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Applies to both the MyDNS login and the webhook post.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Error occured while reading config: {0}")]
    Config(#[from] ConfigError),
    #[error("Error while creating the HTTP client: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Error while scheduling notifications: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("Error while setting up the runtime: {0}")]
    Io(#[from] io::Error),
}

fn http_client() -> Result<Client, ClientError> {
    let client = ClientBuilder::new()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
#[cfg(unix)]
fn watch_shutdown(shutdown: CancellationToken) -> Result<(), ClientError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received {}, shutting down", name);
        shutdown.cancel();
    });
    Ok(())
}

#[cfg(not(unix))]
fn watch_shutdown(shutdown: CancellationToken) -> Result<(), ClientError> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
            }
            Err(err) => error!("Unable to listen for Ctrl-C: {}", err),
        }
    });
    Ok(())
}

async fn run(conf: Config, url_template: &str) -> Result<u8, ClientError> {
    let schedule = conf.schedule()?;
    let client = http_client()?;
    let notifier = IPNotifierMyDns::with_url_template(client.clone(), url_template);
    let sink = Sink::new(client, &conf.log.slack);
    let runner = Runner::new(conf.notice, Box::new(notifier), sink);

    match schedule {
        None => Ok(runner.run_once().await),
        Some(schedule) => {
            let shutdown = CancellationToken::new();
            watch_shutdown(shutdown.clone())?;
            runner.run_scheduled(&schedule, shutdown).await?;
            Ok(EXIT_SUCCESS)
        }
    }
}

fn notifier_main(opts: &Opts) -> Result<u8, ClientError> {
    let conf = config::load_config(&opts.config)?;
    config::validate_config(&conf)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(conf, MYDNS_URL_TEMPLATE))
}

fn main() -> ExitCode {
    // Invalid arguments print usage and exit with 2 here
    let opts = Opts::parse();
    tracing::subscriber::with_default(logging::subscriber(opts.verbosity), || {
        match notifier_main(&opts) {
            Ok(code) => ExitCode::from(code),
            Err(err) => {
                error!("{}", err);
                ExitCode::from(EXIT_FAILURE)
            }
        }
    })
}
