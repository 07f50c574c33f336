use crate::error::AppError;
use crate::fanout::FanOut;
use crate::models::RequestOutcome;
use crate::scope::ExecutionScope;

/// What the aggregator does with the workers still running after the first failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Cancel the shared scope so siblings abort, then drain their outcomes.
    #[default]
    FailFast,
    /// Let every request run to completion.
    DrainAll,
}

/// Events emitted while collecting outcomes.
#[derive(Debug, Clone)]
pub enum AggregateEvent<'a> {
    Waiting {
        expected: usize,
    },
    Arrived {
        outcome: &'a RequestOutcome,
        received: usize,
        expected: usize,
    },
    FirstFailure {
        url: &'a str,
        error: &'a AppError,
    },
    SiblingsCancelled {
        pending: usize,
    },
    Finished {
        successes: usize,
        failures: usize,
    },
}

/// Trait for receiving aggregation events (decoupled logging).
pub trait AggregateReporter: Send + Sync {
    fn report(&self, event: AggregateEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAggregateReporter;

impl AggregateReporter for TracingAggregateReporter {
    fn report(&self, event: AggregateEvent<'_>) {
        match event {
            AggregateEvent::Waiting { expected } => {
                tracing::debug!(%expected, "Waiting for outcomes");
            }
            AggregateEvent::Arrived {
                outcome,
                received,
                expected,
            } => match outcome {
                RequestOutcome::Success { url, body } => {
                    tracing::info!(%url, bytes = body.len(), %received, %expected, "Outcome received");
                }
                RequestOutcome::Failure { url, error } => {
                    tracing::warn!(%url, %error, %received, %expected, "Outcome failed");
                }
            },
            AggregateEvent::FirstFailure { url, error } => {
                tracing::warn!(%url, %error, "First failure, reporting stops here");
            }
            AggregateEvent::SiblingsCancelled { pending } => {
                tracing::info!(%pending, "Cancelled remaining fetches");
            }
            AggregateEvent::Finished {
                successes,
                failures,
            } => {
                tracing::info!(%successes, %failures, "All outcomes collected");
            }
        }
    }
}

/// Every outcome of a fan-out, in arrival order.
#[derive(Debug)]
pub struct Aggregate {
    outcomes: Vec<RequestOutcome>,
    first_failure: Option<usize>,
}

impl Aggregate {
    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<RequestOutcome> {
        self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.first_failure.is_none()
    }

    pub fn first_failure(&self) -> Option<&RequestOutcome> {
        self.first_failure.map(|i| &self.outcomes[i])
    }

    /// Outcomes that arrived before the first failure. All of them are successes.
    pub fn reportable(&self) -> &[RequestOutcome] {
        let end = self.first_failure.unwrap_or(self.outcomes.len());
        &self.outcomes[..end]
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

/// Receive one outcome per submitted fetch.
///
/// Reporting stops at the first failure, but the channel is always drained so
/// that no worker is left running when this returns.
pub async fn collect<R: AggregateReporter>(
    mut fan_out: FanOut,
    scope: &ExecutionScope,
    policy: FailurePolicy,
    reporter: &R,
) -> Aggregate {
    let expected = fan_out.submitted();
    let mut outcomes = Vec::with_capacity(expected);
    let mut first_failure = None;

    reporter.report(AggregateEvent::Waiting { expected });

    while outcomes.len() < expected {
        let Some(outcome) = fan_out.next_outcome().await else {
            break;
        };

        reporter.report(AggregateEvent::Arrived {
            outcome: &outcome,
            received: outcomes.len() + 1,
            expected,
        });

        if first_failure.is_none()
            && let RequestOutcome::Failure { url, error } = &outcome
        {
            first_failure = Some(outcomes.len());
            reporter.report(AggregateEvent::FirstFailure { url, error });

            let pending = expected - outcomes.len() - 1;
            if policy == FailurePolicy::FailFast && pending > 0 {
                scope.cancel();
                reporter.report(AggregateEvent::SiblingsCancelled { pending });
            }
        }

        outcomes.push(outcome);
    }

    fan_out.join_all().await;

    if outcomes.len() != expected {
        tracing::error!(
            received = outcomes.len(),
            %expected,
            "Outcome channel closed early"
        );
    }

    let aggregate = Aggregate {
        outcomes,
        first_failure,
    };
    reporter.report(AggregateEvent::Finished {
        successes: aggregate.success_count(),
        failures: aggregate.failure_count(),
    });

    aggregate
}
