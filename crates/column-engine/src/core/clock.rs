/// Fixed-interval accumulator.
/// Turns variable frame deltas into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// The fixed interval per tick, in milliseconds.
    interval_ms: f64,
    /// Accumulated time from variable frame deltas.
    accumulator: f64,
}

impl FixedTimestep {
    /// Most ticks a single frame may produce.
    pub const MAX_STEPS: u32 = 10;

    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            accumulator: 0.0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed ticks to run.
    pub fn accumulate(&mut self, frame_ms: f64) -> u32 {
        self.accumulator += frame_ms;
        // Cap to prevent a long stall from producing a burst of ticks
        self.accumulator = self.accumulator.min(self.interval_ms * Self::MAX_STEPS as f64);
        let steps = (self.accumulator / self.interval_ms) as u32;
        self.accumulator -= steps as f64 * self.interval_ms;
        steps
    }

    /// Drop any partial tick.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }
}

/// Identifier of a scheduled task, usable as a cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    id: TaskId,
    due_ms: f64,
    payload: T,
}

/// Deferred tasks on a virtual clock.
///
/// Nothing fires by itself: the owner asks for due tasks after advancing its
/// clock. Tasks pop in due-time order, ties in scheduling order. A cancelled
/// task never pops.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    pending: Vec<Scheduled<T>>,
    next_id: u64,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(16),
            next_id: 1,
        }
    }

    /// Schedule `payload` to fire at absolute time `due_ms`.
    pub fn schedule_at(&mut self, due_ms: f64, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled { id, due_ms, payload });
        id
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(idx) = self.pending.iter().position(|t| t.id == id) {
            self.pending.swap_remove(idx);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TaskId, T)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .total_cmp(&b.due_ms)
                    .then(a.id.cmp(&b.id))
            })
            .map(|(idx, _)| idx)?;
        let task = self.pending.swap_remove(idx);
        Some((task.id, task.payload))
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|t| t.due_ms).min_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(16.0);
        assert_eq!(ts.accumulate(16.0), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(16.0);
        assert_eq!(ts.accumulate(8.0), 0);
        assert_eq!(ts.accumulate(10.0), 1);
    }

    #[test]
    fn caps_at_ten_steps() {
        let mut ts = FixedTimestep::new(16.0);
        assert_eq!(ts.accumulate(1000.0), 10);
    }

    #[test]
    fn tasks_pop_in_due_order() {
        let mut q = TaskQueue::new();
        q.schedule_at(300.0, "late");
        q.schedule_at(100.0, "early");
        q.schedule_at(100.0, "early-second");

        assert!(q.pop_due(50.0).is_none());
        assert_eq!(q.pop_due(400.0).map(|(_, p)| p), Some("early"));
        assert_eq!(q.pop_due(400.0).map(|(_, p)| p), Some("early-second"));
        assert_eq!(q.pop_due(400.0).map(|(_, p)| p), Some("late"));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut q = TaskQueue::new();
        let id = q.schedule_at(10.0, 1);
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.pop_due(100.0).is_none());
    }

    #[test]
    fn next_due_reports_earliest() {
        let mut q = TaskQueue::new();
        assert_eq!(q.next_due(), None);
        q.schedule_at(70.0, ());
        q.schedule_at(20.0, ());
        assert_eq!(q.next_due(), Some(20.0));
    }
}
