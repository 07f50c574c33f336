//! One task per URL, all reporting into a shared outcome channel.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::{Id, JoinSet};

use crate::error::AppError;
use crate::models::RequestOutcome;
use crate::scope::ExecutionScope;
use crate::traits::Fetcher;

/// Fetch `url` and send exactly one outcome on `outcomes`.
///
/// The fetch is raced against `scope`, so a fetcher that ignores the scope
/// still cannot outlive it.
pub async fn fetch_into<F: Fetcher>(
    fetcher: &F,
    scope: &ExecutionScope,
    url: String,
    outcomes: &mpsc::Sender<RequestOutcome>,
) {
    tracing::debug!(%url, "Fetching");

    let result = match scope.run(fetcher.fetch(scope, &url)).await {
        Ok(result) => result,
        Err(state) => Err(AppError::ScopeClosed {
            url: url.clone(),
            state,
        }),
    };

    match &result {
        Ok(body) => tracing::debug!(%url, bytes = body.len(), "Fetch succeeded"),
        Err(e) => tracing::debug!(%url, error = %e, "Fetch failed"),
    }

    if outcomes
        .send(RequestOutcome::from_result(url, result))
        .await
        .is_err()
    {
        tracing::warn!("Outcome receiver dropped before all fetches reported");
    }
}

/// A launched set of fetch workers and the receiving end of their channel.
///
/// Dropping a `FanOut` aborts any worker still running.
pub struct FanOut {
    tasks: JoinSet<()>,
    urls: HashMap<Id, String>,
    outcomes: mpsc::Receiver<RequestOutcome>,
    submitted: usize,
}

impl FanOut {
    /// Spawn one worker per URL. The headers in `scope` must already be final.
    pub fn launch<F: Fetcher>(fetcher: &F, scope: &ExecutionScope, urls: &[String]) -> Self {
        let (tx, rx) = mpsc::channel(urls.len().max(1));
        let mut tasks = JoinSet::new();
        let mut ids = HashMap::with_capacity(urls.len());

        for url in urls {
            let fetcher = fetcher.clone();
            let scope = scope.clone();
            let tx = tx.clone();
            let task_url = url.clone();
            let handle = tasks.spawn(async move {
                fetch_into(&fetcher, &scope, task_url, &tx).await;
            });
            ids.insert(handle.id(), url.clone());
        }

        tracing::info!(count = urls.len(), "Launched fetch workers");

        Self {
            tasks,
            urls: ids,
            outcomes: rx,
            submitted: urls.len(),
        }
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Next outcome in arrival order, or `None` once every worker has reported.
    ///
    /// A worker that dies without reporting surfaces as a
    /// [`AppError::WorkerPanicked`] failure for its URL.
    pub async fn next_outcome(&mut self) -> Option<RequestOutcome> {
        if let Some(outcome) = self.outcomes.recv().await {
            return Some(outcome);
        }

        // Every sender is gone: the remaining tasks either finished cleanly or died.
        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((id, ())) => {
                    self.urls.remove(&id);
                }
                Err(e) => {
                    let url = self.urls.remove(&e.id()).unwrap_or_default();
                    tracing::error!(%url, error = %e, "Fetch worker died");
                    return Some(RequestOutcome::Failure {
                        error: AppError::WorkerPanicked {
                            url: url.clone(),
                            message: e.to_string(),
                        },
                        url,
                    });
                }
            }
        }

        None
    }

    /// Wait for every worker task to exit.
    pub async fn join_all(&mut self) {
        while self.tasks.join_next().await.is_some() {}
        self.urls.clear();
    }
}
