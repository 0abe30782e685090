/// Direction of a position change along the scroll axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Down,
    Up,
    Still,
}

/// Last evaluated scroll offset and when it was evaluated.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    last: f32,
    /// Time of the last evaluation; `None` until the first one.
    last_check_ms: Option<f64>,
}

impl PositionTracker {
    pub fn new(start: f32) -> Self {
        Self {
            last: start,
            last_check_ms: None,
        }
    }

    pub fn last(&self) -> f32 {
        self.last
    }

    /// Signed change from the last position to `new_pos`.
    pub fn delta(&self, new_pos: f32) -> f32 {
        new_pos - self.last
    }

    pub fn direction(&self, new_pos: f32) -> ScrollDirection {
        let d = self.delta(new_pos);
        if d > 0.0 {
            ScrollDirection::Down
        } else if d < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Still
        }
    }

    /// Accept `new_pos` as evaluated at `now_ms`.
    pub fn record(&mut self, new_pos: f32, now_ms: f64) {
        self.last = new_pos;
        self.last_check_ms = Some(now_ms);
    }

    /// Jump to `pos` without counting it as movement.
    pub fn resync(&mut self, pos: f32) {
        self.last = pos;
    }

    /// Whether an evaluation at `now_ms` respects the throttle window.
    pub fn is_due(&self, now_ms: f64, window_ms: f64) -> bool {
        match self.last_check_ms {
            Some(last) => now_ms - last >= window_ms,
            None => true,
        }
    }

    /// When the current throttle window ends.
    pub fn next_due(&self, window_ms: f64) -> f64 {
        self.last_check_ms.map_or(0.0, |last| last + window_ms)
    }
}
