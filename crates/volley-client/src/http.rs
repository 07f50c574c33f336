use std::error::Error as _;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;
use volley_core::error::AppError;

pub const DEFAULT_USER_AGENT: &str = concat!("Volley/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the shared HTTP client.
///
/// No overall request timeout is set; every request is bounded by its
/// execution scope.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Build the client shared by the authenticator and the fetcher.
pub fn build_client(config: &HttpClientConfig) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

/// Parse a request target, accepting only `http` and `https`.
pub(crate) fn parse_target(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::RequestBuildError {
        url: url.to_string(),
        message: format!("Invalid URL: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AppError::RequestBuildError {
            url: url.to_string(),
            message: format!("URL scheme '{scheme}' is not allowed (only http/https)"),
        }),
    }
}

pub(crate) fn build_error(url: &str, e: &reqwest::Error) -> AppError {
    AppError::RequestBuildError {
        url: url.to_string(),
        message: error_chain(e),
    }
}

pub(crate) fn transport_error(url: &str, e: &reqwest::Error) -> AppError {
    let message = if e.is_timeout() {
        format!("Timed out: {}", error_chain(e))
    } else if e.is_connect() {
        format!("Connection failed: {}", error_chain(e))
    } else {
        error_chain(e)
    };

    AppError::TransportError {
        url: url.to_string(),
        message,
    }
}

/// XRPC error body: `{"error": "...", "message": "..."}`.
#[derive(Deserialize)]
struct XrpcError {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

pub(crate) fn status_error(url: &str, status: reqwest::StatusCode, body: &str) -> AppError {
    let message = match serde_json::from_str::<XrpcError>(body) {
        Ok(XrpcError {
            error,
            message: Some(message),
        }) => format!("{error}: {message}"),
        Ok(XrpcError { error, message: None }) => error,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
        Err(_) => truncate(body.trim(), 200),
    };

    AppError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
        message,
    }
}

/// Render an error with its source chain, e.g. `error sending request: connection refused`.
fn error_chain(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
