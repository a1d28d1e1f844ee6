//! Handle for a long-lived platform event listener
//!
//! Battery and orientation tracking run as tokio tasks that re-render on
//! every event. The caller owns the [`Subscription`] and ends delivery by
//! calling [`Subscription::unsubscribe`] or by dropping it.

use crate::capability::Capability;
use tokio::task::JoinHandle;

pub struct Subscription {
    capability: Capability,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(capability: Capability, task: JoinHandle<()>) -> Self {
        Self {
            capability,
            task: Some(task),
        }
    }

    /// Which capability this listener belongs to
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// True while the listener is still receiving events
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop delivering events. No render happens after this returns.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    /// Wait until the event source ends on its own
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::warn!("{} listener panicked", self.capability);
                }
            }
        }
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("{} listener stopped", self.capability);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("capability", &self.capability)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_task() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let sub = Subscription::new(Capability::Battery, task);
        assert!(sub.is_active());
        tokio::time::sleep(Duration::from_millis(35)).await;
        sub.unsubscribe();

        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test]
    async fn test_join_waits_for_source_end() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<u32>(4);
        let task = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        let sub = Subscription::new(Capability::Orientation, task);

        tx.send(1).await.unwrap();
        drop(tx);
        sub.join().await;
    }
}
