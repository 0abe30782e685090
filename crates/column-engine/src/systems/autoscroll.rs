//! Auto-scroll driver.
//!
//! Produces small randomized scroll steps on a fixed tick while the page is
//! idle. It never touches the scroll position itself: the session applies each
//! step as an ordinary position change so the scheduler sees it like any
//! other scroll.

use crate::api::config::SessionConfig;
use crate::core::clock::{FixedTimestep, TaskId};
use crate::core::context::{SessionContext, Task};
use crate::core::rng::Rng;

/// Conditions outside the driver that can hold it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverGate {
    pub popup_active: bool,
    pub scroll_locked: bool,
    pub at_bottom: bool,
}

pub struct AutoScrollDriver {
    /// Configured on/off. A disabled driver never starts.
    enabled: bool,
    running: bool,
    last_interaction_ms: f64,
    /// Pending resume check; replaced on every new halt.
    resume_task: Option<TaskId>,
    timestep: FixedTimestep,
    rng: Rng,
    cooldown_ms: f64,
    step: [f32; 2],
}

impl AutoScrollDriver {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            enabled: config.auto_scroll_enabled(),
            running: false,
            last_interaction_ms: f64::NEG_INFINITY,
            resume_task: None,
            timestep: FixedTimestep::new(config.auto_scroll_tick_ms),
            rng: Rng::new(config.seed),
            cooldown_ms: config.auto_scroll_cooldown_ms,
            step: config.auto_scroll_step,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_pending_resume(&self) -> bool {
        self.resume_task.is_some()
    }

    /// Whether manual input happened within the cooldown window.
    pub fn in_cooldown(&self, now_ms: f64) -> bool {
        now_ms - self.last_interaction_ms < self.cooldown_ms
    }

    /// Start ticking. Returns false when disabled or already running.
    pub fn start(&mut self) -> bool {
        if !self.enabled || self.running {
            return false;
        }
        self.running = true;
        self.timestep.reset();
        log::info!("auto-scroll started");
        true
    }

    /// Stop ticking without scheduling a resume (popup opened, confirm shown).
    pub fn stop(&mut self) {
        if self.running {
            log::info!("auto-scroll stopped");
        }
        self.running = false;
    }

    /// Manual input: halt now and check again after the cooldown.
    pub fn note_interaction(&mut self, ctx: &mut SessionContext) {
        self.last_interaction_ms = ctx.now();
        if !self.enabled {
            return;
        }
        if self.running || self.resume_task.is_some() {
            if self.running {
                log::debug!("user interaction, pausing auto-scroll");
            }
            self.running = false;
            self.schedule_resume(ctx);
        }
    }

    /// Schedule a resume check one cooldown from now, replacing any earlier one.
    pub fn schedule_resume(&mut self, ctx: &mut SessionContext) {
        if !self.enabled {
            return;
        }
        if let Some(old) = self.resume_task.take() {
            ctx.cancel(old);
        }
        self.resume_task = Some(ctx.schedule_in(self.cooldown_ms, Task::ResumeAutoScroll));
    }

    /// A resume check fired. Stale checks (replaced or cancelled) are ignored.
    /// Returns whether the driver started.
    pub fn resume_check(&mut self, task: TaskId, now_ms: f64, gate: DriverGate) -> bool {
        if self.resume_task != Some(task) {
            return false;
        }
        self.resume_task = None;
        if self.in_cooldown(now_ms) || gate.popup_active || gate.scroll_locked {
            return false;
        }
        self.start()
    }

    /// Number of ticks due for a frame of `frame_ms`.
    pub fn ticks(&mut self, frame_ms: f64) -> u32 {
        if !self.running {
            return 0;
        }
        self.timestep.accumulate(frame_ms)
    }

    /// Next step in pixels, or `None` when held back. Reaching the bottom
    /// stops the driver.
    pub fn next_step(&mut self, now_ms: f64, gate: DriverGate) -> Option<f32> {
        if !self.running || self.in_cooldown(now_ms) {
            return None;
        }
        if gate.popup_active || gate.scroll_locked {
            return None;
        }
        if gate.at_bottom {
            log::info!("reached bottom, stopping auto-scroll");
            self.stop();
            return None;
        }
        Some(self.rng.range(self.step[0], self.step[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::ViewportProfile;

    fn driver() -> (AutoScrollDriver, SessionContext) {
        let config = SessionConfig::for_profile(ViewportProfile::Touch);
        (AutoScrollDriver::new(&config), SessionContext::new())
    }

    fn fire_resume(driver: &mut AutoScrollDriver, ctx: &mut SessionContext, gate: DriverGate) -> bool {
        let mut started = false;
        while let Some((id, task)) = ctx.pop_due() {
            if task == Task::ResumeAutoScroll {
                started |= driver.resume_check(id, ctx.now(), gate);
            }
        }
        started
    }

    #[test]
    fn disabled_on_desktop_by_default() {
        let mut d = AutoScrollDriver::new(&SessionConfig::for_profile(ViewportProfile::Desktop));
        assert!(!d.start());
    }

    #[test]
    fn steps_within_range() {
        let (mut d, _) = driver();
        d.start();
        assert_eq!(d.ticks(32.0), 2);
        for _ in 0..100 {
            let step = d.next_step(0.0, DriverGate::default()).unwrap();
            assert!((1.0..3.0).contains(&step));
        }
    }

    #[test]
    fn manual_interaction_halts_for_cooldown() {
        let (mut d, mut ctx) = driver();
        d.start();
        ctx.advance(5000.0);
        d.note_interaction(&mut ctx);
        assert!(!d.is_running());
        assert!(d.next_step(ctx.now(), DriverGate::default()).is_none());

        ctx.advance(2999.0);
        assert!(!fire_resume(&mut d, &mut ctx, DriverGate::default()));
        ctx.advance(1.0);
        assert!(fire_resume(&mut d, &mut ctx, DriverGate::default()));
        assert!(d.is_running());
    }

    #[test]
    fn repeated_interaction_replaces_resume_check() {
        let (mut d, mut ctx) = driver();
        d.start();
        d.note_interaction(&mut ctx);
        ctx.advance(2000.0);
        d.note_interaction(&mut ctx);
        assert_eq!(ctx.pending_tasks(), 1);

        // The first check would have been due at 3000
        ctx.advance(1000.0);
        assert!(!fire_resume(&mut d, &mut ctx, DriverGate::default()));
        ctx.advance(2000.0);
        assert!(fire_resume(&mut d, &mut ctx, DriverGate::default()));
    }

    #[test]
    fn resume_waits_for_popup() {
        let (mut d, mut ctx) = driver();
        d.schedule_resume(&mut ctx);
        ctx.advance(3000.0);
        let gate = DriverGate {
            popup_active: true,
            ..DriverGate::default()
        };
        assert!(!fire_resume(&mut d, &mut ctx, gate));
        assert!(!d.is_running());
    }

    #[test]
    fn bottom_stops_driver() {
        let (mut d, _) = driver();
        d.start();
        let gate = DriverGate {
            at_bottom: true,
            ..DriverGate::default()
        };
        assert!(d.next_step(0.0, gate).is_none());
        assert!(!d.is_running());
    }

    #[test]
    fn popup_gate_holds_without_stopping() {
        let (mut d, _) = driver();
        d.start();
        let gate = DriverGate {
            popup_active: true,
            ..DriverGate::default()
        };
        assert!(d.next_step(0.0, gate).is_none());
        assert!(d.is_running());
    }
}
