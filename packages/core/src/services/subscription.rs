//! Subscription handles returned by [`TreeService::subscribe`](super::TreeService::subscribe)

use tokio::task::JoinHandle;

/// Handle to a running change-event subscription
///
/// Delivery stops when [`cancel`](Subscription::cancel) is called or the
/// handle is dropped. Use [`detach`](Subscription::detach) to keep delivering
/// for as long as the backend keeps the feed open.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn running(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Handle for a subscription that was rejected up front
    pub(crate) fn inactive() -> Self {
        Self { task: None }
    }

    /// True while events can still be delivered
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop delivering events
    ///
    /// A callback already running completes; no later event is delivered.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Subscription cancelled");
        }
    }

    /// Let the subscription run without a handle
    pub fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
