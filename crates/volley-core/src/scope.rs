//! Deadline-bound, cancellable execution scope shared by every request of a run.
//!
//! A scope starts [`Active`](ScopeState::Active) and moves to
//! [`Expired`](ScopeState::Expired) when its deadline elapses or to
//! [`Cancelled`](ScopeState::Cancelled) when [`ExecutionScope::cancel`] is
//! called. Dropping the [`ScopeGuard`] returned by
//! [`ExecutionScope::release_guard`] marks it [`Released`](ScopeState::Released).
//! Once a scope has left `Active`, [`ExecutionScope::run`] fails immediately.
//!
//! Clones share the same deadline, cancellation signal, and headers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of an [`ExecutionScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Active,
    Expired,
    Cancelled,
    Released,
}

impl ScopeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeState::Active => "active",
            ScopeState::Expired => "expired",
            ScopeState::Cancelled => "cancelled",
            ScopeState::Released => "released",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScopeState::Active)
    }
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Headers applied to every request bound to a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    authorization: Option<String>,
    extra: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers carrying `Authorization: Bearer <token>`.
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
            extra: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.authorization.is_none() && self.extra.is_empty()
    }

    /// All header pairs, `Authorization` first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.authorization
            .as_deref()
            .map(|value| ("Authorization", value))
            .into_iter()
            .chain(
                self.extra
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )
    }
}

/// Deadline used when the requested timeout overflows the clock (about 30 years).
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone)]
pub struct ExecutionScope {
    token: CancellationToken,
    deadline: Instant,
    timeout: Duration,
    released: Arc<AtomicBool>,
    headers: Arc<RequestHeaders>,
}

impl ExecutionScope {
    /// Create an active scope whose deadline is `timeout` from now.
    ///
    /// A timeout past the clock's range is clamped to [`FAR_FUTURE`].
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self {
            token: CancellationToken::new(),
            deadline,
            timeout,
            released: Arc::new(AtomicBool::new(false)),
            headers: Arc::new(RequestHeaders::default()),
        }
    }

    /// Derive a scope carrying `headers` that shares this scope's deadline
    /// and cancellation signal.
    pub fn with_headers(&self, headers: RequestHeaders) -> Self {
        Self {
            token: self.token.clone(),
            deadline: self.deadline,
            timeout: self.timeout,
            released: Arc::clone(&self.released),
            headers: Arc::new(headers),
        }
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> ScopeState {
        if self.released.load(Ordering::Acquire) {
            ScopeState::Released
        } else if self.token.is_cancelled() {
            ScopeState::Cancelled
        } else if Instant::now() >= self.deadline {
            ScopeState::Expired
        } else {
            ScopeState::Active
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_terminal()
    }

    /// Resolves once the scope is cancelled or its deadline elapses.
    pub async fn closed(&self) {
        tokio::select! {
            () = self.token.cancelled() => {}
            () = tokio::time::sleep_until(self.deadline) => {}
        }
    }

    /// Drive `fut` to completion unless the scope closes first.
    ///
    /// The future is dropped as soon as the scope expires or is cancelled,
    /// which aborts any I/O it owns.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ScopeState>
    where
        F: Future,
    {
        match self.state() {
            ScopeState::Active => {}
            state => return Err(state),
        }

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(self.cancelled_state()),
            () = tokio::time::sleep_until(self.deadline) => Err(ScopeState::Expired),
            output = fut => Ok(output),
        }
    }

    /// Guard that releases the scope when dropped, on every exit path.
    pub fn release_guard(&self) -> ScopeGuard {
        ScopeGuard {
            scope: self.clone(),
        }
    }

    fn cancelled_state(&self) -> ScopeState {
        if self.released.load(Ordering::Acquire) {
            ScopeState::Released
        } else {
            ScopeState::Cancelled
        }
    }
}

/// Releases its scope on drop. See [`ExecutionScope::release_guard`].
#[derive(Debug)]
pub struct ScopeGuard {
    scope: ExecutionScope,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scope.released.store(true, Ordering::Release);
        self.scope.token.cancel();
        tracing::debug!("Execution scope released");
    }
}
