use tokio::sync::watch;
use tokio::task::JoinHandle;
use std::future::Future;
use std::time::Duration;
use crate::utils::{FuzzError, Result};

/// Holds running tasks and shutdown channel for the fuzzer.
/// Call `shutdown()` to stop workers, watcher and replenisher.
pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    join_handles: Vec<(String, JoinHandle<Result<()>>)>,
}

impl ServiceHandle {
    /// Create a new ServiceHandle and return it together with a Receiver clonable by tasks.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        let handle = ServiceHandle { shutdown_tx: tx, join_handles: vec![] };
        (handle, rx)
    }

    /// Attach a background task handle (so we wait on it on shutdown).
    pub fn attach(&mut self, name: impl Into<String>, h: JoinHandle<Result<()>>) {
        self.join_handles.push((name.into(), h));
    }

    pub fn len(&self) -> usize {
        self.join_handles.len()
    }

    /// Wait until any attached task ends on its own. Tasks here are meant to
    /// run forever, so an early return is either a fatal error or a panic.
    pub async fn first_exit(&mut self) -> (String, Result<()>) {
        if self.join_handles.is_empty() {
            return std::future::pending().await;
        }
        let futs = self.join_handles.iter_mut().map(|(_, h)| h);
        let (res, idx, _) = futures::future::select_all(futs).await;
        let (name, _) = self.join_handles.remove(idx);
        let res = match res {
            Ok(r) => r,
            Err(e) => Err(FuzzError::Task(format!("join failed: {}", e))),
        };
        (name, res)
    }

    /// Signal shutdown to all tasks and await them sequentially.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for (name, h) in self.join_handles {
            match h.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(task = %name, "service task returned error: {}", e),
                Err(e) => tracing::error!(task = %name, "task join error: {:?}", e),
            }
        }
    }
}

/// Sleep for `d` unless shutdown comes first. Returns true on shutdown,
/// including when the sender is gone.
pub async fn sleep_or_shutdown(d: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(d) => *shutdown.borrow(),
        res = shutdown.changed() => res.is_err() || *shutdown.borrow(),
    }
}

/// Await `fut` unless shutdown comes first. Returns `None` on shutdown,
/// including when the sender is gone.
pub async fn until_shutdown<F: Future>(fut: F, shutdown: &mut watch::Receiver<bool>) -> Option<F::Output> {
    if *shutdown.borrow() {
        return None;
    }
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    return None;
                }
            }
        }
    }
}
