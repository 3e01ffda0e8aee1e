//! Background tasks that can be told to stop between units of work.
use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A spawned task paired with its stop signal.
///
/// The task body receives the stop receiver and is expected to observe it
/// only while idle (e.g. in a `select!` against its timer), so work that has
/// already started always runs to completion.  Dropping the handle also
/// stops the task, because the receiver then resolves with an error.
#[derive(Debug)]
pub(super) struct BackgroundTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Spawn `body` on the current tokio runtime.
    pub(super) fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, stop_rx) = oneshot::channel();
        Self {
            stop,
            handle: tokio::spawn(body(stop_rx)),
        }
    }

    /// Signal the task and wait until it has exited.
    pub(super) async fn stop(self) {
        self.stop.send(()).ok();
        self.handle.await.ok();
    }

    /// Signal the task without waiting for it.
    pub(super) fn cancel(self) {
        self.stop.send(()).ok();
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn stop_waits_for_exit() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let task = BackgroundTask::spawn(|mut stop| async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(5));
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        task.stop().await;
        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0, "task should have ticked before stopping");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop, "no ticks after stop");
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_task() {
        let (done_tx, done_rx) = oneshot::channel();
        let task = BackgroundTask::spawn(|stop| async move {
            stop.await.ok();
            done_tx.send(()).ok();
        });
        drop(task);
        tokio::time::timeout(Duration::from_secs(1), done_rx)
            .await
            .expect("task should exit when its handle is dropped")
            .unwrap();
    }
}
