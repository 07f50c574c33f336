//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{AuthCredentials, AuthResult};
use crate::scope::ExecutionScope;
use crate::traits::{Authenticator, Fetcher};

// ---------------------------------------------------------------------------
// MockAuthenticator
// ---------------------------------------------------------------------------

/// Build a session carrying `token`.
pub fn session(token: &str) -> AuthResult {
    AuthResult {
        access_token: token.to_string(),
        refresh_token: format!("{token}-refresh"),
        account_id: "did:plc:mock".to_string(),
        handle: "mock.test".to_string(),
        active: true,
        ..Default::default()
    }
}

/// Mock authenticator returning queued sessions.
#[derive(Clone)]
pub struct MockAuthenticator {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a session with token `mock-token`.
    responses: Arc<Mutex<Vec<Result<AuthResult, AppError>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAuthenticator {
    pub fn new(token: &str) -> Self {
        Self::with_responses(vec![Ok(session(token))])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<AuthResult, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Recorded `(endpoint, identifier)` pairs.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Authenticator for MockAuthenticator {
    async fn authenticate(
        &self,
        _scope: &ExecutionScope,
        endpoint: &str,
        credentials: &AuthCredentials,
    ) -> Result<AuthResult, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), credentials.identifier.clone()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(session("mock-token"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Scripted behaviour for one URL.
#[derive(Debug, Clone)]
pub enum MockReply {
    Body(Vec<u8>),
    Fail(String),
    Delayed(Duration, Vec<u8>),
    FailAfter(Duration, String),
    /// Never completes; only the scope can end it.
    Hang,
    Panic,
}

/// A fetch seen by [`MockFetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFetch {
    pub url: String,
    pub authorization: Option<String>,
}

/// Mock fetcher with per-URL replies. Unscripted URLs return `{}`.
#[derive(Clone, Default)]
pub struct MockFetcher {
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedFetch>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, reply: MockReply) -> Self {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedFetch> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, scope: &ExecutionScope, url: &str) -> Result<Vec<u8>, AppError> {
        let reply = {
            self.calls.lock().unwrap().push(RecordedFetch {
                url: url.to_string(),
                authorization: scope.headers().authorization().map(str::to_string),
            });
            self.replies
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| MockReply::Body(b"{}".to_vec()))
        };

        match reply {
            MockReply::Body(body) => Ok(body),
            MockReply::Fail(message) => Err(AppError::TransportError {
                url: url.to_string(),
                message,
            }),
            MockReply::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            MockReply::FailAfter(delay, message) => {
                tokio::time::sleep(delay).await;
                Err(AppError::TransportError {
                    url: url.to_string(),
                    message,
                })
            }
            MockReply::Hang => std::future::pending().await,
            MockReply::Panic => panic!("mock fetcher panicked for {url}"),
        }
    }
}
