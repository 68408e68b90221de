//! Workflow supervision.
//!
//! Workflows are spawned rather than awaited by the caller, but they are
//! not fire-and-forget: the supervisor keeps the monitor task of the most
//! recent workflow so it can be joined, and it turns a panicking workflow
//! into a log line instead of a silently dead task.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use aurasight_core::Operation;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct WorkflowSupervisor {
    current: Mutex<Option<JoinHandle<()>>>,
}

impl WorkflowSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `workflow` on the runtime and track it.
    ///
    /// A panic inside the workflow is contained here; its RAII guards have
    /// already run by the time the monitor observes the `JoinError`.
    pub fn spawn<F>(&self, operation: Operation, workflow: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(workflow);
        let monitor = tokio::spawn(async move {
            match task.await {
                Ok(()) => tracing::debug!(%operation, "Workflow finished"),
                Err(e) if e.is_panic() => {
                    tracing::error!(%operation, "Workflow panicked; session released");
                }
                Err(e) => tracing::warn!(%operation, error = %e, "Workflow task cancelled"),
            }
        });

        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(monitor);

        // Only possible once the previous workflow released busy; its
        // monitor is detached and finishes on its own.
        if previous.is_some_and(|h| !h.is_finished()) {
            tracing::debug!(%operation, "Detached monitor of the previous workflow");
        }
    }

    /// Wait for the most recently spawned workflow to finish.
    ///
    /// Returns immediately when nothing is in flight.
    pub async fn join(&self) {
        let handle = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            // The monitor itself never panics.
            let _ = handle.await;
        }
    }

    /// Whether a tracked workflow is still running.
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
