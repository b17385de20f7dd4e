use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Owns every background loop of a session so teardown can stop them all
pub struct TaskRegistry {
    cancel: CancellationToken,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a task that receives the registry's cancellation token
    pub fn spawn<F, Fut>(&self, name: &'static str, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task(self.cancel.child_token()));
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((name, handle));
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of tasks not yet finished
    pub fn active(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, h)| !h.is_finished())
            .count()
    }

    /// Cancel every task and wait for all of them to exit
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
        let names: Vec<&'static str> = handles.iter().map(|(name, _)| *name).collect();
        let results = futures::future::join_all(handles.into_iter().map(|(_, h)| h)).await;

        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => info!("Task {} stopped", name),
                Err(e) if e.is_cancelled() => info!("Task {} aborted", name),
                Err(e) => error!("Task {} panicked: {}", name, e),
            }
        }
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
