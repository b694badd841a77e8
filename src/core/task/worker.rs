// ─── Background Tasks ───
// Runs blocking install work off the interactive thread and hands each
// result back to it exactly once.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::error::{InstallerError, InstallerResult};

type Completion = Box<dyn FnOnce() + Send + 'static>;

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// Creates a connected executor/dispatcher pair.
///
/// The executor may be cloned into any thread; the dispatcher stays with the
/// interactive context and runs completions when drained.
pub fn channel(runtime: Handle) -> (Executor, Dispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Executor {
            runtime,
            completions: tx,
        },
        Dispatcher { completions: rx },
    )
}

#[derive(Clone)]
pub struct Executor {
    runtime: Handle,
    completions: mpsc::UnboundedSender<Completion>,
}

impl Executor {
    /// Runs `work` on the blocking pool and queues `done` with its result.
    ///
    /// A panic inside `work` is delivered as `TaskFailed`. A task cancelled
    /// before it starts delivers nothing.
    pub fn submit<T, W, D>(&self, label: &str, work: W, done: D) -> TaskHandle
    where
        T: Send + 'static,
        W: FnOnce() -> InstallerResult<T> + Send + 'static,
        D: FnOnce(InstallerResult<T>) + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let completions = self.completions.clone();
        let runtime = self.runtime.clone();
        let task_label = label.to_string();

        let join = self.runtime.spawn(async move {
            let blocking_label = task_label.clone();
            let blocking = runtime.spawn_blocking(move || {
                if task_state
                    .compare_exchange(PENDING, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    return None;
                }
                debug!("Task '{}' started", blocking_label);
                Some(work())
            });

            let result = match blocking.await {
                Ok(Some(result)) => result,
                Ok(None) => {
                    debug!("Task '{}' cancelled before start", task_label);
                    return;
                }
                Err(e) => Err(InstallerError::TaskFailed {
                    label: task_label.clone(),
                    reason: e.to_string(),
                }),
            };

            if completions.send(Box::new(move || done(result))).is_err() {
                warn!("Task '{}' finished after its dispatcher was dropped", task_label);
            }
        });

        TaskHandle {
            label: label.to_string(),
            state,
            join,
        }
    }
}

/// Handle to one submitted task.
pub struct TaskHandle {
    label: String,
    state: Arc<AtomicU8>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Withdraws the task if it has not started. Running tasks are never
    /// interrupted; returns false for them.
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// Waits until the background side is done and its completion, if any,
    /// is queued.
    pub async fn join(self) {
        if let Err(e) = self.join.await {
            warn!("Task '{}' wrapper failed: {}", self.label, e);
        }
    }
}

/// Receives completions on the interactive context.
pub struct Dispatcher {
    completions: mpsc::UnboundedReceiver<Completion>,
}

impl Dispatcher {
    /// Runs every completion already queued and returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(completion) = self.completions.try_recv() {
            completion();
            ran += 1;
        }
        ran
    }

    /// Waits for the next completion and runs it. Returns false once every
    /// executor is gone and the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.completions.recv().await {
            Some(completion) => {
                completion();
                true
            }
            None => false,
        }
    }
}
