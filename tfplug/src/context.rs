//! Cancellation handle passed to every provider and data source call
//!
//! The gRPC server owns one root context and cancels it on StopProvider.
//! Data sources can race their API calls against [`Context::cancelled`].

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

#[derive(Clone)]
pub struct Context {
    stop: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            stop: Arc::new(stop),
            deadline: None,
        }
    }

    /// Derived context that is cancelled with its parent or once `timeout`
    /// elapses, whichever comes first. Cancelling the child leaves the
    /// parent untouched.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };

        let child = Self {
            stop: Arc::new(watch::channel(self.is_cancelled()).0),
            deadline: Some(deadline),
        };

        let parent = self.clone();
        let stop = Arc::downgrade(&child.stop);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline.into()) => {}
                _ = parent.cancelled() => {}
            }
            if let Some(stop) = stop.upgrade() {
                stop.send_replace(true);
            }
        });

        child
    }

    pub fn is_cancelled(&self) -> bool {
        *self.stop.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn cancelled(&self) {
        let mut rx = self.stop.subscribe();
        // The sender is held by self, so the channel cannot close here
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    pub fn cancel(&self) {
        self.stop.send_replace(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn timeout_cancels_child() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));

        assert!(!ctx.is_cancelled());
        sleep(Duration::from_millis(100)).await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn manual_cancel_is_visible_to_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();

        ctx.cancel();

        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancel_reaches_child() {
        let parent = Context::new();
        let child = parent.with_timeout(Duration::from_secs(60));

        parent.cancel();

        tokio::time::timeout(Duration::from_secs(1), child.cancelled())
            .await
            .expect("child should be cancelled with its parent");
    }

    #[tokio::test]
    async fn child_cancel_leaves_parent_running() {
        let parent = Context::new();
        let child = parent.with_timeout(Duration::from_secs(60));

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn child_deadline_never_outlives_parent() {
        let parent = Context::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));

        assert_eq!(child.deadline(), parent.deadline());
        assert!(Context::new().deadline().is_none());
    }
}
