use reqwest::Client;
use volley_core::error::AppError;
use volley_core::scope::{ExecutionScope, ScopeState};
use volley_core::traits::Fetcher;

use crate::http::{self, HttpClientConfig};

/// HTTP fetcher using reqwest.
///
/// Issues a GET per call with every header carried by the scope (notably the
/// bearer `Authorization` header) and returns the raw response body. The
/// request is dropped, closing its connection, as soon as the scope expires
/// or is cancelled.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::with_client(http::build_client(
            &HttpClientConfig::default(),
        )?))
    }

    /// Use an existing client, sharing its connection pool.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, scope: &ExecutionScope, url: &str) -> Result<Vec<u8>, AppError> {
        let closed = |state: ScopeState| AppError::ScopeClosed {
            url: url.to_string(),
            state,
        };

        let target = http::parse_target(url)?;
        let mut builder = self.client.get(target);
        for (name, value) in scope.headers().iter() {
            builder = builder.header(name, value);
        }
        let request = builder.build().map_err(|e| http::build_error(url, &e))?;

        let response = scope
            .run(self.client.execute(request))
            .await
            .map_err(closed)?
            .map_err(|e| http::transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = scope
                .run(response.text())
                .await
                .map_err(closed)?
                .unwrap_or_default();
            return Err(http::status_error(url, status, &body));
        }

        let body = scope
            .run(response.bytes())
            .await
            .map_err(closed)?
            .map_err(|e| AppError::DecodeError {
                url: url.to_string(),
                message: format!("Failed to read response body: {e}"),
            })?;

        tracing::debug!(%url, status = status.as_u16(), bytes = body.len(), "Fetched");

        Ok(body.to_vec())
    }
}
