pub mod aggregate;
pub mod config;
pub mod error;
pub mod fanout;
pub mod models;
pub mod run;
pub mod scope;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use aggregate::{
    Aggregate, AggregateEvent, AggregateReporter, FailurePolicy, TracingAggregateReporter,
};
pub use config::RunConfig;
pub use error::{AppError, ErrorCategory};
pub use fanout::FanOut;
pub use models::{AuthCredentials, AuthResult, DidDocument, RequestOutcome};
pub use run::{RunReport, RunService};
pub use scope::{ExecutionScope, RequestHeaders, ScopeGuard, ScopeState};
pub use traits::{Authenticator, Fetcher};
