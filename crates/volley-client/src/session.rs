use reqwest::Client;
use volley_core::error::AppError;
use volley_core::models::{AuthCredentials, AuthResult};
use volley_core::scope::{ExecutionScope, ScopeState};
use volley_core::traits::Authenticator;

use crate::http::{self, HttpClientConfig};

/// Session authenticator: POSTs `{identifier, password}` and decodes the
/// session from the response body.
#[derive(Clone)]
pub struct ReqwestAuthenticator {
    client: Client,
}

impl ReqwestAuthenticator {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self::with_client(http::build_client(
            &HttpClientConfig::default(),
        )?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Authenticator for ReqwestAuthenticator {
    async fn authenticate(
        &self,
        scope: &ExecutionScope,
        endpoint: &str,
        credentials: &AuthCredentials,
    ) -> Result<AuthResult, AppError> {
        let closed = |state: ScopeState| AppError::ScopeClosed {
            url: endpoint.to_string(),
            state,
        };

        let target = http::parse_target(endpoint)?;
        let request = self
            .client
            .post(target)
            .json(credentials)
            .build()
            .map_err(|e| http::build_error(endpoint, &e))?;

        let response = scope
            .run(self.client.execute(request))
            .await
            .map_err(closed)?
            .map_err(|e| http::transport_error(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = scope
                .run(response.text())
                .await
                .map_err(closed)?
                .unwrap_or_default();
            return Err(http::status_error(endpoint, status, &body));
        }

        let body = scope
            .run(response.bytes())
            .await
            .map_err(closed)?
            .map_err(|e| AppError::DecodeError {
                url: endpoint.to_string(),
                message: format!("Failed to read response body: {e}"),
            })?;

        let session: AuthResult =
            serde_json::from_slice(&body).map_err(|e| AppError::DecodeError {
                url: endpoint.to_string(),
                message: format!("Invalid session response: {e}"),
            })?;

        tracing::debug!(%endpoint, handle = %session.handle, "Session created");

        Ok(session)
    }
}
