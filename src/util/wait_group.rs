use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::Notify;

/// Counts outstanding tasks; `wait` resolves once every issued `Completion` is done.
#[derive(Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// One task's completion signal. Consumed by `done`, so it can be sent at most once.
#[must_use = "a dropped Completion never signals; call done()"]
pub struct Completion {
    inner: Arc<Inner>,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more task and hands back its completion signal.
    pub fn add(&self) -> Completion {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        Completion {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        loop {
            // 先註冊再檢查，避免在兩者之間錯過 notify_waiters
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }
}

impl Completion {
    pub fn done(self) {
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}
