//=========================================================================
// Cross-Thread Task Queue
//=========================================================================
//
// FIFO of delayable units of work, produced on any thread and executed
// only by the render thread.
//
// Architecture:
// ```text
//   Window thread                          Render thread
//   ┌──────────────────┐                  ┌──────────────────────────┐
//   │ TaskSender       │  crossbeam MPSC  │ TaskQueue::drain(ctx)    │
//   │  .enqueue(..) ───┼─────────────────>│  ├─ pull new tasks       │
//   └──────────────────┘                  │  ├─ delay > 0: decrement │
//   (any thread, never blocks)            │  └─ delay == 0: execute  │
//                                         └──────────────────────────┘
// ```
//
// Delay units are drain calls, not wall-clock time. A task enqueued with
// delay N runs on the (N+1)-th drain after it was enqueued. A failing task
// is logged and dropped; the drain carries on with the next one. Tasks
// cannot be cancelled.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, warn};

//=== Internal Dependencies ===============================================

use super::config::DebugMode;
use super::error::EngineError;

//=== Task ================================================================

/// Work executed on the render thread against the context `C`.
pub type TaskAction<C> = Box<dyn FnOnce(&mut C) -> Result<(), EngineError> + Send>;

/// A named, optionally delayed unit of work.
pub struct Task<C> {
    name: String,
    remaining_delay: u32,
    action: TaskAction<C>,
}

impl<C> Task<C> {
    pub fn new<F>(name: impl Into<String>, delay_in_frames: u32, action: F) -> Self
    where
        F: FnOnce(&mut C) -> Result<(), EngineError> + Send + 'static,
    {
        Self {
            name: name.into(),
            remaining_delay: delay_in_frames,
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of drains this task will still be skipped for.
    pub fn remaining_delay(&self) -> u32 {
        self.remaining_delay
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("remaining_delay", &self.remaining_delay)
            .finish_non_exhaustive()
    }
}

//=== DrainReport =========================================================

/// What a single drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tasks that ran to completion.
    pub executed: usize,
    /// Tasks that returned an error or panicked (removed, not retried).
    pub failed: usize,
    /// Tasks skipped this pass because their delay had not elapsed.
    pub delayed: usize,
}

//=== TaskSender ==========================================================

/// Producer handle for a [`TaskQueue`]. Cheap to clone, usable from any thread.
pub struct TaskSender<C> {
    sender: Sender<Task<C>>,
}

impl<C> TaskSender<C> {
    /// Schedules `action` to run on the render thread after `delay_in_frames` drains.
    ///
    /// Never blocks. If the queue has already been dropped (render thread
    /// gone) the task is discarded with a warning.
    pub fn enqueue<F>(&self, name: impl Into<String>, delay_in_frames: u32, action: F)
    where
        F: FnOnce(&mut C) -> Result<(), EngineError> + Send + 'static,
    {
        self.submit(Task::new(name, delay_in_frames, action));
    }

    /// Schedules an already built task.
    pub fn submit(&self, task: Task<C>) {
        if let Err(rejected) = self.sender.send(task) {
            warn!(
                target: "tasks",
                "Task queue disconnected, dropping task [{}]",
                rejected.0.name
            );
        }
    }
}

impl<C> Clone for TaskSender<C> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

//=== TaskQueue ===========================================================

/// Consumer side of the cross-thread task queue. Owned by the render thread.
pub struct TaskQueue<C> {
    sender: Sender<Task<C>>,
    receiver: Receiver<Task<C>>,
    pending: VecDeque<Task<C>>,
    debug_mode: DebugMode,
}

impl<C> TaskQueue<C> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            pending: VecDeque::new(),
            debug_mode: DebugMode::None,
        }
    }

    /// Enables per-task delay logging when set to [`DebugMode::Full`].
    pub fn with_debug_mode(mut self, debug_mode: DebugMode) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Returns a producer handle for other threads.
    pub fn sender(&self) -> TaskSender<C> {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Schedules a task from the owning thread.
    pub fn enqueue<F>(&self, name: impl Into<String>, delay_in_frames: u32, action: F)
    where
        F: FnOnce(&mut C) -> Result<(), EngineError> + Send + 'static,
    {
        self.submit(Task::new(name, delay_in_frames, action));
    }

    /// Schedules an already built task from the owning thread.
    pub fn submit(&self, task: Task<C>) {
        // The queue holds its own receiver, so this cannot fail
        let _ = self.sender.send(task);
    }

    /// Schedules `task` ahead of everything already queued, including
    /// tasks other threads sent before this call.
    pub fn submit_first(&mut self, task: Task<C>) {
        self.pending.extend(self.receiver.try_iter());
        self.pending.push_front(task);
    }

    /// Number of tasks waiting, including ones not yet pulled by a drain.
    pub fn len(&self) -> usize {
        self.pending.len() + self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tasks kept back by the last drain, in queue order.
    ///
    /// Tasks enqueued since the last drain are not listed until the next
    /// drain or `submit_first` pulls them in.
    pub fn delayed(&self) -> impl Iterator<Item = &Task<C>> {
        self.pending.iter()
    }

    //--- drain() ----------------------------------------------------------

    /// Runs every ready task in insertion order and ages the delayed ones.
    ///
    /// Tasks enqueued by an action while this drain is running are picked
    /// up by the next drain.
    pub fn drain(&mut self, context: &mut C) -> DrainReport {
        self.pending.extend(self.receiver.try_iter());

        let mut report = DrainReport::default();
        let mut kept = VecDeque::with_capacity(self.pending.len());

        for mut task in self.pending.drain(..) {
            if task.remaining_delay > 0 {
                if self.debug_mode == DebugMode::Full {
                    debug!(
                        target: "tasks",
                        "Delaying task [{}] for {} frames",
                        task.name,
                        task.remaining_delay
                    );
                }
                task.remaining_delay -= 1;
                report.delayed += 1;
                kept.push_back(task);
                continue;
            }

            let Task { name, action, .. } = task;
            match panic::catch_unwind(AssertUnwindSafe(|| action(context))) {
                Ok(Ok(())) => report.executed += 1,
                Ok(Err(e)) => {
                    error!(target: "tasks", "Task [{}] failed: {}", name, e);
                    report.failed += 1;
                }
                Err(payload) => {
                    error!(
                        target: "tasks",
                        "Task [{}] panicked: {}",
                        name,
                        panic_message(payload.as_ref())
                    );
                    report.failed += 1;
                }
            }
        }

        self.pending = kept;
        report
    }
}

impl<C> Default for TaskQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

//--- Internal Helpers ----------------------------------------------------

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
