use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

/// Listener invoked with the full, already materialised value on every change.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Owned handle to a running realtime listener.
///
/// `close` detaches the listener for good; later calls (and the implicit close
/// on drop) do nothing.
#[derive(Debug)]
pub struct Subscription {
    resource: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Run `listener` on the current tokio runtime until it finishes or the
    /// handle is closed.
    pub fn spawn<F>(resource: &'static str, listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            resource,
            task: Some(tokio::spawn(listener)),
        }
    }

    /// Detach the listener. Returns whether anything was still attached.
    pub fn close(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                debug!(resource = self.resource, "subscription closed");
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn close_is_idempotent_and_stops_the_listener() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = ticks.clone();
        let mut sub = Subscription::spawn("test", async move {
            loop {
                t.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(sub.close());
        assert!(!sub.close());
        assert!(sub.is_closed());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_close = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_close);
    }
}
