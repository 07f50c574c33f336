use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use volley_client::{
    DEFAULT_SERVICE, HttpClientConfig, ReqwestAuthenticator, ReqwestFetcher, XrpcEndpoints,
    build_client,
};
use volley_core::aggregate::{FailurePolicy, TracingAggregateReporter};
use volley_core::config::{MAX_TIMEOUT_SECS, RunConfig};
use volley_core::error::{AppError, ErrorCategory};
use volley_core::models::AuthCredentials;
use volley_core::run::RunService;

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "volley",
    version,
    about = "Authenticate once, then fetch many resources in parallel under one deadline"
)]
struct Cli {
    /// Account handle or identifier used to create the session
    #[arg(long, env = "HANDLE")]
    handle: Option<String>,

    /// Account password (an app password is recommended)
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Service base URL
    #[arg(short, long, env = "VOLLEY_SERVICE", default_value = DEFAULT_SERVICE)]
    service: String,

    /// Deadline for the whole run, in seconds
    #[arg(
        short,
        long,
        env = "VOLLEY_TIMEOUT_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    timeout_secs: u64,

    /// Let every request finish instead of cancelling the rest on the first failure
    #[arg(long, default_value_t = false)]
    keep_going: bool,

    /// Resource URL to fetch; repeatable (defaults to the account's profile and feeds)
    #[arg(short, long = "url")]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    if let Err(e) = init_tracing() {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    match cmd_run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(error_status(&e))
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("volley=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn cmd_run(cli: Cli) -> Result<ExitCode> {
    // Missing credentials stop here, before any network traffic
    let credentials = AuthCredentials::resolve(cli.handle, cli.password)?;
    let endpoints = XrpcEndpoints::new(&cli.service)?;

    let urls = if cli.urls.is_empty() {
        endpoints.default_targets(&credentials.identifier)
    } else {
        cli.urls
    };

    let policy = if cli.keep_going {
        FailurePolicy::DrainAll
    } else {
        FailurePolicy::FailFast
    };
    let config = RunConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_failure_policy(policy);

    let client = build_client(&HttpClientConfig::default())?;
    let service = RunService::new(
        ReqwestAuthenticator::with_client(client.clone()),
        ReqwestFetcher::with_client(client),
        config,
    );

    tracing::info!(service = %endpoints.base(), urls = urls.len(), "Starting run");

    let report = service
        .run(
            &endpoints.create_session(),
            &credentials,
            &urls,
            &TracingAggregateReporter,
        )
        .await
        .context("Authentication failed")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let halt = output::write_report(&mut out, &report).context("Failed to write output")?;

    Ok(match halt {
        Some(halt) => {
            eprintln!("Error: {}", halt.message);
            exit_code(halt.category)
        }
        None => ExitCode::SUCCESS,
    })
}

fn exit_status(category: ErrorCategory) -> u8 {
    match category {
        ErrorCategory::Config => 2,
        ErrorCategory::RequestBuild => 3,
        ErrorCategory::Transport => 4,
        ErrorCategory::Decode => 5,
        ErrorCategory::Internal => 1,
    }
}

fn exit_code(category: ErrorCategory) -> ExitCode {
    ExitCode::from(exit_status(category))
}

/// Errors that are not an [`AppError`] exit with 1.
fn error_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<AppError>()
        .map_or(1, |e| exit_status(e.category()))
}
