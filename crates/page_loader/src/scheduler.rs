//! Background task registry.
//!
//! Side work spawned by the phases (fonts, the widget, the delayed phase) runs here as
//! named local tasks. Each outcome is logged on its own; the phase chain never awaits
//! them. Hosts may [`BackgroundTasks::drain`] to wait for everything to settle.

use core::cell::RefCell;
use core::future::Future;
use core::mem;
use std::rc::Rc;

use anyhow::Error;
use log::{debug, error, warn};
use serde::Serialize;
use tokio::task::{JoinHandle, spawn_local};

struct Task {
    name: String,
    handle: JoinHandle<Result<(), Error>>,
}

#[derive(Default)]
struct Registry {
    pending: Vec<Task>,
    spawned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub succeeded: usize,
    pub cancelled: usize,
    pub failed: Vec<TaskFailure>,
}

/// Cheap to clone; clones share the same registry.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    inner: Rc<RefCell<Registry>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `future` on the current `LocalSet`.
    ///
    /// # Panics
    /// Panics when called outside a `LocalSet`, as `spawn_local` does.
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: Future<Output = Result<(), Error>> + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let handle = spawn_local(async move {
            let result = future.await;
            match &result {
                Ok(()) => debug!("scheduler: task `{task_name}` finished"),
                Err(err) => error!("scheduler: task `{task_name}` failed: {err:#}"),
            }
            result
        });
        debug!("scheduler: spawned `{name}`");
        let mut registry = self.inner.borrow_mut();
        registry.spawned.push(name.clone());
        registry.pending.push(Task { name, handle });
    }

    /// Tasks not yet collected by [`Self::drain`].
    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .pending
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Names of every task spawned so far, in spawn order.
    pub fn spawned(&self) -> Vec<String> {
        self.inner.borrow().spawned.clone()
    }

    pub fn abort_all(&self) {
        for task in &self.inner.borrow().pending {
            task.handle.abort();
        }
    }

    /// Await every task, including tasks spawned while draining.
    pub async fn drain(&self) -> TaskSummary {
        let mut summary = TaskSummary::default();
        loop {
            let batch = mem::take(&mut self.inner.borrow_mut().pending);
            if batch.is_empty() {
                break;
            }
            for Task { name, handle } in batch {
                match handle.await {
                    Ok(Ok(())) => summary.succeeded += 1,
                    Ok(Err(err)) => summary.failed.push(TaskFailure {
                        name,
                        message: format!("{err:#}"),
                    }),
                    Err(join) if join.is_cancelled() => {
                        debug!("scheduler: task `{name}` cancelled");
                        summary.cancelled += 1;
                    }
                    Err(join) => {
                        warn!("scheduler: task `{name}` panicked: {join}");
                        summary.failed.push(TaskFailure {
                            name,
                            message: join.to_string(),
                        });
                    }
                }
            }
        }
        summary
    }
}
