use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Caps simultaneous in-flight requests per host.
///
/// One limiter is shared by every collector of a run, so the cap holds across all
/// stock tasks combined rather than per task.
pub struct DomainLimiter {
    parallelism: usize,
    domains: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl DomainLimiter {
    pub fn new(parallelism: usize) -> Self {
        DomainLimiter {
            parallelism: parallelism.max(1),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for a free slot on `host`. The slot is released when the permit drops.
    pub async fn acquire(&self, host: &str) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.semaphore(host).acquire_owned().await
    }

    fn semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            domains
                .entry(host.to_ascii_lowercase())
                .or_insert_with(|| Arc::new(Semaphore::new(self.parallelism))),
        )
    }
}
