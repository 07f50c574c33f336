use std::future::Future;

use crate::error::AppError;
use crate::models::{AuthCredentials, AuthResult};
use crate::scope::ExecutionScope;

/// Exchanges credentials for a session.
pub trait Authenticator: Send + Sync + Clone {
    /// Performs one exchange bound to `scope`. Implementations must not cache
    /// sessions between calls.
    fn authenticate(
        &self,
        scope: &ExecutionScope,
        endpoint: &str,
        credentials: &AuthCredentials,
    ) -> impl Future<Output = Result<AuthResult, AppError>> + Send;
}

/// Fetches the raw body of a URL with the headers carried by the scope.
pub trait Fetcher: Send + Sync + Clone + 'static {
    /// Must return promptly with an error once `scope` expires or is cancelled.
    fn fetch(
        &self,
        scope: &ExecutionScope,
        url: &str,
    ) -> impl Future<Output = Result<Vec<u8>, AppError>> + Send;
}
