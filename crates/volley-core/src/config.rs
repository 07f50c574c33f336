use std::time::Duration;

use crate::aggregate::FailurePolicy;
use crate::error::AppError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for a run deadline, in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Settings for one authenticated fan-out run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Deadline for the whole run, authentication included.
    pub timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RunConfig {
    /// Read configuration from environment variables.
    ///
    /// - `VOLLEY_TIMEOUT_SECS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        let timeout = match std::env::var("VOLLEY_TIMEOUT_SECS") {
            Err(_) => DEFAULT_TIMEOUT,
            Ok(raw) => Duration::from_secs(parse_timeout_secs(&raw)?),
        };

        Ok(Self {
            timeout,
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Parse a timeout in whole seconds, between 1 and [`MAX_TIMEOUT_SECS`].
pub fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    let parsed: u64 = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid VOLLEY_TIMEOUT_SECS '{raw}': must be an integer between 1 and {MAX_TIMEOUT_SECS}"
        ))
    })?;
    if !(1..=MAX_TIMEOUT_SECS).contains(&parsed) {
        return Err(AppError::ConfigError(format!(
            "VOLLEY_TIMEOUT_SECS must be between 1 and {MAX_TIMEOUT_SECS}, got {parsed}"
        )));
    }
    Ok(parsed)
}
