use anyhow::Result;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Holds running service tasks and the shutdown channel they observe.
/// Call `shutdown()` to signal every task and wait for them to finish.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handles: Vec<JoinHandle<Result<()>>>,
}

impl ServiceHandle {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx, join_handles: vec![] }
    }

    /// Future that resolves once shutdown has been signalled (or the handle dropped).
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown_tx.subscribe();
        async move {
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    /// Attach a task so shutdown waits on it.
    pub fn attach(&mut self, h: JoinHandle<Result<()>>) {
        self.join_handles.push(h);
    }

    /// Signal shutdown, then await tasks in attach order. Task failures are logged, not returned.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx.send_replace(true);

        for h in self.join_handles {
            match h.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("service task returned error: {:?}", e),
                Err(e) => tracing::error!("task join error: {:?}", e),
            }
        }
        Ok(())
    }
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}
