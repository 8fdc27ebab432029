use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Optional admission limits: a process-wide in-flight call cap and
/// per-downstream-host outbound caps. Both are off unless configured.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyLimits {
    calls: Option<Arc<Semaphore>>,
    per_host: Arc<HashMap<String, Arc<Semaphore>>>,
}

impl ConcurrencyLimits {
    pub fn new(max_concurrent_calls: usize, per_host_limits: &BTreeMap<String, usize>) -> Self {
        Self {
            calls: (max_concurrent_calls > 0).then(|| Arc::new(Semaphore::new(max_concurrent_calls))),
            per_host: Arc::new(
                per_host_limits
                    .iter()
                    .filter(|(_, n)| **n > 0)
                    .map(|(host, n)| (host.to_ascii_lowercase(), Arc::new(Semaphore::new(*n))))
                    .collect(),
            ),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Admit one call. `None` when the call cap is saturated.
    pub fn try_admit_call(&self) -> Option<CallPermit> {
        match &self.calls {
            None => Some(CallPermit { _permit: None }),
            Some(sem) => match sem.clone().try_acquire_owned() {
                Ok(p) => Some(CallPermit { _permit: Some(p) }),
                Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => None,
            },
        }
    }

    /// Wait for an outbound slot to `host`, if that host is limited.
    pub async fn acquire_host(&self, host: &str) -> Option<OwnedSemaphorePermit> {
        let sem = self.per_host.get(&host.to_ascii_lowercase())?;
        sem.clone().acquire_owned().await.ok()
    }
}

pub struct CallPermit {
    _permit: Option<OwnedSemaphorePermit>,
}
