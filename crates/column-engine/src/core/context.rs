use crate::api::types::Command;
use crate::core::clock::{TaskId, TaskQueue};

/// Deferred work the session schedules on its virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Fade-out of the popup opened as `generation` has finished.
    FadeOut { generation: u64 },
    /// Periodic in-popup height refresh for `generation`.
    RefreshHeight { generation: u64 },
    /// Fullscreen layout has settled; run closest-match reconciliation.
    FullscreenSettle,
    /// Auto-scroll cooldown elapsed; maybe resume.
    ResumeAutoScroll,
    /// Initial-load sweep of the trigger table.
    StartupSweep,
    /// Evaluate the position held back by the scroll throttle.
    TrailingScroll,
}

/// Mutable per-session plumbing handed to every component: the virtual
/// clock, the task queue, and the outgoing command buffer.
pub struct SessionContext {
    now_ms: f64,
    tasks: TaskQueue<Task>,
    commands: Vec<Command>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            tasks: TaskQueue::new(),
            commands: Vec::with_capacity(32),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Move the clock forward. Negative deltas are ignored.
    pub fn advance(&mut self, dt_ms: f64) {
        if dt_ms > 0.0 {
            self.now_ms += dt_ms;
        }
    }

    pub fn emit(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn schedule_in(&mut self, delay_ms: f64, task: Task) -> TaskId {
        self.tasks.schedule_at(self.now_ms + delay_ms, task)
    }

    pub fn schedule_at(&mut self, due_ms: f64, task: Task) -> TaskId {
        self.tasks.schedule_at(due_ms, task)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.cancel(id)
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.is_pending(id)
    }

    /// Next task due at the current time, if any.
    pub fn pop_due(&mut self) -> Option<(TaskId, Task)> {
        self.tasks.pop_due(self.now_ms)
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Commands emitted since the last drain.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
