use crate::aggregate::{self, Aggregate, AggregateReporter};
use crate::config::RunConfig;
use crate::error::AppError;
use crate::fanout::FanOut;
use crate::models::{AuthCredentials, AuthResult};
use crate::scope::{ExecutionScope, RequestHeaders};
use crate::traits::{Authenticator, Fetcher};

/// Session and collected outcomes of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub session: AuthResult,
    pub aggregate: Aggregate,
}

/// Orchestrates one run: scope → authenticate → attach headers → fan out → collect.
///
/// Generic over the authenticator and fetcher so it can be exercised without
/// real HTTP calls.
pub struct RunService<A, F>
where
    A: Authenticator,
    F: Fetcher,
{
    authenticator: A,
    fetcher: F,
    config: RunConfig,
}

impl<A, F> RunService<A, F>
where
    A: Authenticator,
    F: Fetcher,
{
    pub fn new(authenticator: A, fetcher: F, config: RunConfig) -> Self {
        Self {
            authenticator,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Authenticate at `auth_endpoint`, then fetch every URL in parallel.
    ///
    /// Authentication errors end the run before any fetch is launched. Fetch
    /// errors are reported per outcome inside the returned [`Aggregate`].
    pub async fn run<R: AggregateReporter>(
        &self,
        auth_endpoint: &str,
        credentials: &AuthCredentials,
        urls: &[String],
        reporter: &R,
    ) -> Result<RunReport, AppError> {
        // 1. Scope, released on every exit path
        let scope = ExecutionScope::new(self.config.timeout);
        let _guard = scope.release_guard();

        // 2. Authenticate
        tracing::info!(
            endpoint = %auth_endpoint,
            identifier = %credentials.identifier,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "Authenticating"
        );
        let session = scope
            .run(
                self.authenticator
                    .authenticate(&scope, auth_endpoint, credentials),
            )
            .await
            .map_err(|state| AppError::ScopeClosed {
                url: auth_endpoint.to_string(),
                state,
            })??;
        tracing::info!(handle = %session.handle, did = %session.account_id, "Authenticated");

        // 3. Attach the bearer header before any worker exists
        let scope = scope.with_headers(RequestHeaders::bearer(&session.access_token));

        // 4 & 5. Fan out and collect
        let fan_out = FanOut::launch(&self.fetcher, &scope, urls);
        let aggregate =
            aggregate::collect(fan_out, &scope, self.config.failure_policy, reporter).await;

        Ok(RunReport { session, aggregate })
    }
}
