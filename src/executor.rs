use crate::model::CatalogIdentifier;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Admits per-identifier work through a fixed number of permits.
pub struct HarvesterExecutor {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl HarvesterExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `task` once a permit is free. Returns `None` without polling
    /// `task` if `cancel` fires first.
    #[instrument(skip(self, id, cancel, task), fields(identifier = %id))]
    pub async fn execute<F, T>(
        &self,
        id: &CatalogIdentifier,
        cancel: &CancellationToken,
        task: F,
    ) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = self.semaphore.acquire() => permit.ok(),
        };
        let _permit = permit?;

        if cancel.is_cancelled() {
            debug!("Run cancelled, not starting item");
            return None;
        }

        debug!("Starting harvest item");
        let result = task.await;
        debug!("Finished harvest item");
        Some(result)
    }
}

impl Default for HarvesterExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}
