//! Popup trigger scheduling.
//!
//! Decides which descriptors activate as the scroll position changes, keeps
//! at most one popup active, and parks everything that matched while a popup
//! was open in a FIFO missed queue drained one entry per close.
//!
//! The scheduler never opens anything itself: it asks a [`PopupHost`]
//! (the lifecycle controller in a live session, a fake in tests).

use std::collections::VecDeque;

use crate::api::config::ProfileTuning;
use crate::core::tracker::{PositionTracker, ScrollDirection};
use crate::error::PopupError;
use crate::trigger::descriptor::TriggerDescriptor;
use crate::trigger::registry::TriggerRegistry;

/// What the scheduler needs from whoever owns the active popup.
pub trait PopupHost {
    /// Whether a popup (of any kind) is currently open or fading out.
    fn is_active(&self) -> bool;

    /// Open a text popup for `descriptor`. Only called while not active.
    fn open_trigger(&mut self, descriptor: &TriggerDescriptor) -> Result<(), PopupError>;
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

pub struct PopupScheduler {
    registry: TriggerRegistry,
    missed: VecDeque<String>,
    tracker: PositionTracker,
    tuning: ProfileTuning,
    fullscreen: bool,
    /// Whether the last evaluated change was a fast scroll.
    fast_scroll: bool,
}

impl PopupScheduler {
    pub fn new(registry: TriggerRegistry, tuning: ProfileTuning, start: f32) -> Self {
        Self {
            registry,
            missed: VecDeque::new(),
            tracker: PositionTracker::new(start),
            tuning,
            fullscreen: false,
            fast_scroll: false,
        }
    }

    // -- Accessors --

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn last_position(&self) -> f32 {
        self.tracker.last()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_fast_scroll(&self) -> bool {
        self.fast_scroll
    }

    /// Missed queue, front first.
    pub fn missed(&self) -> impl Iterator<Item = &str> {
        self.missed.iter().map(String::as_str)
    }

    pub fn missed_len(&self) -> usize {
        self.missed.len()
    }

    pub fn state(&self, host: &impl PopupHost) -> SchedulerState {
        if host.is_active() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    /// Zone half-width for the current fullscreen state.
    pub fn zone_buffer(&self) -> f32 {
        if self.fullscreen {
            self.tuning.fullscreen_zone_buffer
        } else {
            self.tuning.zone_buffer
        }
    }

    // -- Events --

    /// Evaluate a new scroll offset. Returns the descriptor activated by this
    /// event, if any. At most one activation happens per call; every other
    /// match goes to the missed queue.
    pub fn position_changed(
        &mut self,
        new_pos: f32,
        now_ms: f64,
        host: &mut impl PopupHost,
    ) -> Option<String> {
        let last = self.tracker.last();
        let delta = self.tracker.delta(new_pos);
        self.fast_scroll = delta.abs() > self.tuning.fast_scroll_threshold;
        let down = self.tracker.direction(new_pos) == ScrollDirection::Down;
        // Only downward fast scrolls extend past the landing point
        let jumped = self.fast_scroll && down;
        if self.fast_scroll {
            log::debug!("fast scroll {:.0} -> {:.0} (delta {:.0})", last, new_pos, delta);
        }

        let range = self.tuning.fast_scroll_range;
        let buffer = self.zone_buffer();
        let candidates: Vec<String> = self
            .registry
            .unshown()
            .filter(|d| {
                let p = d.position();
                let crossed = down && last < p && p <= new_pos;
                let jumped_over = jumped && last < p && p < new_pos + range;
                let in_zone = d.distance_to(new_pos) < buffer;
                crossed || jumped_over || in_zone
            })
            .map(|d| d.id.clone())
            .collect();

        self.tracker.record(new_pos, now_ms);
        self.route(candidates, host)
    }

    /// Record a fullscreen change. When the flag actually flips, all shown
    /// flags and the missed queue are cleared and tracking resyncs to `pos`.
    /// Returns whether it flipped; the caller schedules [`Self::reconcile`]
    /// after the settle delay.
    pub fn fullscreen_toggled(&mut self, fullscreen: bool, pos: f32) -> bool {
        if fullscreen == self.fullscreen {
            return false;
        }
        self.fullscreen = fullscreen;
        self.reset_tracking(pos);
        log::info!(
            "fullscreen {}, popup tracking reset at {:.0}",
            if fullscreen { "entered" } else { "exited" },
            pos
        );
        true
    }

    /// Closest-match reconciliation after a fullscreen transition.
    ///
    /// Every unshown descriptor within the reconcile band is activated or
    /// queued. If none is, the single nearest descriptor within the outer
    /// fallback bound is activated when idle.
    pub fn reconcile(&mut self, pos: f32, host: &mut impl PopupHost) -> Option<String> {
        let band = self.tuning.reconcile_band;
        let mut closest: Option<(f32, String)> = None;
        let mut in_band = Vec::new();

        for d in self.registry.unshown() {
            let distance = d.distance_to(pos);
            if closest.as_ref().map_or(true, |(best, _)| distance < *best) {
                closest = Some((distance, d.id.clone()));
            }
            if distance < band {
                in_band.push(d.id.clone());
            }
        }

        log::debug!("reconcile at {:.0}: {} in band", pos, in_band.len());
        if !in_band.is_empty() {
            return self.route(in_band, host);
        }

        match closest {
            Some((distance, id)) if distance < self.tuning.reconcile_fallback && !host.is_active() => {
                log::debug!("reconcile fallback to nearest `{}` ({:.0} away)", id, distance);
                self.activate(&id, host).then_some(id)
            }
            _ => None,
        }
    }

    /// Initial-load sweep: descriptors with `trigger - lead < pos < trigger + trail`.
    pub fn startup_sweep(
        &mut self,
        pos: f32,
        lead: f32,
        trail: f32,
        host: &mut impl PopupHost,
    ) -> Option<String> {
        let candidates: Vec<String> = self
            .registry
            .unshown()
            .filter(|d| pos > d.position() - lead && pos < d.position() + trail)
            .map(|d| d.id.clone())
            .collect();
        self.route(candidates, host)
    }

    /// The active popup went away. Activate the front of the missed queue,
    /// skipping entries whose target is missing, until one succeeds.
    pub fn popup_closed(&mut self, host: &mut impl PopupHost) -> Option<String> {
        while let Some(id) = self.missed.pop_front() {
            if host.is_active() {
                self.missed.push_front(id);
                break;
            }
            if self.registry.is_shown(&id) {
                continue;
            }
            if self.activate(&id, host) {
                return Some(id);
            }
        }
        None
    }

    /// Clear shown flags and the missed queue, and resync tracking to `pos`.
    /// Closing the active popup is the caller's job.
    pub fn reset(&mut self, pos: f32) {
        self.reset_tracking(pos);
        log::info!("popups reset at {:.0}", pos);
    }

    /// Move tracking to `pos` without evaluating it (initial page position).
    pub fn resync(&mut self, pos: f32) {
        self.tracker.resync(pos);
    }

    /// Mark `id` shown without activating it. Used after a fullscreen reset
    /// for the popup that is still on screen.
    pub fn keep_shown(&mut self, id: &str) {
        self.registry.mark_shown(id).ok();
    }

    // -- Internals --

    fn reset_tracking(&mut self, pos: f32) {
        self.registry.reset_all();
        self.missed.clear();
        self.tracker.resync(pos);
        self.fast_scroll = false;
    }

    /// Activate the first candidate that opens while idle, queue the rest.
    /// Candidates arrive in ascending trigger order.
    fn route(&mut self, candidates: Vec<String>, host: &mut impl PopupHost) -> Option<String> {
        let mut activated = None;
        for id in candidates {
            if activated.is_none() && !host.is_active() {
                if self.activate(&id, host) {
                    activated = Some(id);
                }
            } else {
                self.enqueue(&id);
            }
        }
        activated
    }

    fn activate(&mut self, id: &str, host: &mut impl PopupHost) -> bool {
        let Some(descriptor) = self.registry.find_by_id(id).cloned() else {
            return false;
        };
        let result = host.open_trigger(&descriptor);
        // Marked shown even on failure so a missing target is not retried on every scroll
        self.registry.mark_shown(id).ok();
        self.missed.retain(|m| m != id);
        match result {
            Ok(()) => {
                log::info!("popup `{}` activated", id);
                true
            }
            Err(err) => {
                log::warn!("skipping popup `{}`: {}", id, err);
                false
            }
        }
    }

    fn enqueue(&mut self, id: &str) -> bool {
        if self.registry.is_shown(id) || self.missed.iter().any(|m| m == id) {
            return false;
        }
        log::debug!("popup `{}` queued behind the active popup", id);
        self.missed.push_back(id.to_string());
        true
    }
}
