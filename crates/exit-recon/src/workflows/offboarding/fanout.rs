use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::adapters::{SystemAdapter, SystemDescriptor};
use super::domain::{EmployeeRecord, SystemStatusEntry};
use super::upstream::UpstreamError;

/// Outcome of querying one system during a batch.
#[derive(Debug, Clone)]
pub struct SystemRun {
    pub descriptor: SystemDescriptor,
    pub result: Result<Vec<SystemStatusEntry>, UpstreamError>,
}

impl SystemRun {
    pub fn failure(&self) -> Option<&UpstreamError> {
        self.result.as_ref().err()
    }
}

/// Queries every configured system concurrently, at most `max_concurrency` at a time.
#[derive(Debug, Clone)]
pub struct FanOut {
    adapters: Vec<Arc<dyn SystemAdapter>>,
    max_concurrency: usize,
}

impl FanOut {
    pub fn new(adapters: Vec<Arc<dyn SystemAdapter>>, max_concurrency: usize) -> Self {
        Self {
            adapters,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &SystemDescriptor> {
        self.adapters.iter().map(|adapter| adapter.descriptor())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Run every adapter against the roster. Results come back in catalog order and a
    /// failing or panicking adapter only affects its own entry.
    pub async fn collect(&self, roster: Arc<[EmployeeRecord]>) -> Vec<SystemRun> {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));

        let handles: Vec<JoinHandle<Result<Vec<SystemStatusEntry>, UpstreamError>>> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let roster = Arc::clone(&roster);
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.map_err(|err| {
                        UpstreamError::Transport {
                            system: adapter.descriptor().id.to_string(),
                            detail: err.to_string(),
                        }
                    })?;
                    adapter.fetch_statuses(&roster).await
                })
            })
            .collect();

        let mut runs = Vec::with_capacity(handles.len());
        for (adapter, handle) in self.adapters.iter().zip(handles) {
            let descriptor = adapter.descriptor().clone();
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(UpstreamError::Transport {
                    system: descriptor.id.to_string(),
                    detail: format!("adapter task aborted: {join_error}"),
                }),
            };

            match &result {
                Ok(entries) => {
                    info!(system = %descriptor.id, reported = entries.len(), "system responded")
                }
                Err(err) => error!(system = %descriptor.id, error = %err, "system unavailable"),
            }

            runs.push(SystemRun { descriptor, result });
        }

        runs
    }
}
