//! The session owns every piece of popup state and routes input, timers and
//! auto-scroll steps through them. Hosts talk to the engine only through
//! [`Session::push_input`], [`Session::tick`] and the emitted [`Command`]s.

use std::collections::HashSet;

use glam::Vec2;

use crate::api::config::{ProfileTuning, SessionConfig, ViewportProfile};
use crate::api::page::Page;
use crate::api::types::{Command, ConfirmSpec, Layout, PopupBody, PopupKind, Viewport};
use crate::core::clock::TaskId;
use crate::core::context::{SessionContext, Task};
use crate::error::PopupError;
use crate::input::queue::{InputEvent, InputQueue, KEY_ESCAPE, KEY_RESET};
use crate::systems::autoscroll::{AutoScrollDriver, DriverGate};
use crate::systems::lifecycle::{ActivePopup, OpenRequest, PopupLifecycle};
use crate::systems::milestone::{distance_cm, height_text, MilestoneDetector};
use crate::systems::scheduler::{PopupHost, PopupScheduler};
use crate::systems::sizing::{fit_image, fixed_layout};
use crate::trigger::descriptor::TriggerDescriptor;
use crate::trigger::registry::TriggerRegistry;

/// Scroll events this close to the last synthetic position are the host
/// echoing our own `ScrollTo`, not the user.
const ECHO_TOLERANCE: f32 = 8.0;

/// Lets the scheduler open text popups through the lifecycle controller.
struct TriggerHost<'a> {
    lifecycle: &'a mut PopupLifecycle,
    ctx: &'a mut SessionContext,
    config: &'a SessionConfig,
    viewport: Viewport,
    at: f32,
}

impl PopupHost for TriggerHost<'_> {
    fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    fn open_trigger(&mut self, descriptor: &TriggerDescriptor) -> Result<(), PopupError> {
        let text = height_text(self.at, self.viewport.inner.y);
        self.lifecycle
            .open_text(
                descriptor,
                self.at,
                self.viewport.inner,
                self.config.profile,
                text,
                self.ctx,
            )
            .map(|_| ())
    }
}

pub struct Session {
    config: SessionConfig,
    tuning: ProfileTuning,
    ctx: SessionContext,
    input: InputQueue,
    scheduler: PopupScheduler,
    lifecycle: PopupLifecycle,
    driver: AutoScrollDriver,
    milestone: MilestoneDetector,
    confirm: Option<ConfirmSpec>,
    confirm_shown: bool,
    viewport: Viewport,
    images_shown: HashSet<String>,
    /// Latest scroll offset reported by the host or produced by auto-scroll.
    position: f32,
    trailing_scroll: Option<TaskId>,
    settle: Option<TaskId>,
    echo: Option<f32>,
    audio_started: bool,
    /// Content height at the last `GrowColumn` request.
    grown_at: f32,
    started: bool,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        descriptors: Vec<TriggerDescriptor>,
        confirm: Option<ConfirmSpec>,
    ) -> Result<Self, PopupError> {
        let registry = TriggerRegistry::new(descriptors)?;
        let tuning = config.tuning();
        log::info!(
            "session created: {:?} profile, {} triggers",
            config.profile,
            registry.len()
        );
        Ok(Self {
            tuning,
            ctx: SessionContext::new(),
            input: InputQueue::new(),
            scheduler: PopupScheduler::new(registry, tuning, 0.0),
            lifecycle: PopupLifecycle::new(&config),
            driver: AutoScrollDriver::new(&config),
            milestone: MilestoneDetector::new(config.milestone_floor_cm, config.milestone_band_cm),
            confirm,
            confirm_shown: false,
            viewport: Viewport::default(),
            images_shown: HashSet::new(),
            position: 0.0,
            trailing_scroll: None,
            settle: None,
            echo: None,
            audio_started: false,
            grown_at: 0.0,
            started: false,
            config,
        })
    }

    /// Build a session from a page's config, trigger table and confirm dialog.
    pub fn from_page<P: Page>(page: &P, profile: ViewportProfile) -> Result<Self, PopupError> {
        let mut config = page.config(profile);
        config.profile = profile;
        Self::new(config, page.descriptors(profile), page.confirm())
    }

    /// Take the page's initial scroll offset, schedule the startup sweep and
    /// the first auto-scroll start. Call once, after the host has reported
    /// the viewport.
    pub fn start(&mut self, initial_y: f32) {
        if self.started {
            return;
        }
        self.started = true;
        self.position = initial_y;
        self.scheduler.resync(initial_y);
        self.ctx
            .schedule_in(self.tuning.startup_delay_ms, Task::StartupSweep);
        self.driver.schedule_resume(&mut self.ctx);
        self.ctx.emit(Command::SetHeightText {
            text: height_text(self.position, self.viewport.inner.y),
        });
    }

    // -- Accessors --

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.ctx.now()
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scheduler(&self) -> &PopupScheduler {
        &self.scheduler
    }

    pub fn driver(&self) -> &AutoScrollDriver {
        &self.driver
    }

    pub fn milestone(&self) -> &MilestoneDetector {
        &self.milestone
    }

    pub fn active_popup(&self) -> Option<&ActivePopup> {
        self.lifecycle.active()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.lifecycle.is_scroll_locked()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.scheduler.is_fullscreen()
    }

    pub fn confirm_shown(&self) -> bool {
        self.confirm_shown
    }

    pub fn commands(&self) -> &[Command] {
        self.ctx.commands()
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        self.ctx.drain_commands()
    }

    // -- Driving --

    /// Queue an event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Advance the virtual clock by `dt_ms`, then handle queued input, run
    /// due tasks and take auto-scroll steps, in that order.
    pub fn tick(&mut self, dt_ms: f64) {
        self.ctx.advance(dt_ms);
        for event in self.input.drain() {
            self.handle(event);
        }
        self.run_due_tasks();
        self.auto_scroll(dt_ms);
    }

    /// Handle one event immediately at the current virtual time.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Scroll { y } => self.on_scroll(y),
            InputEvent::TouchStart | InputEvent::TouchMove | InputEvent::TouchEnd => {
                self.user_interaction();
            }
            InputEvent::KeyDown { key_code } => self.on_key(key_code),
            InputEvent::FullscreenChanged { fullscreen } => self.fullscreen_changed(fullscreen),
            InputEvent::Resize {
                width,
                height,
                screen_width,
                screen_height,
            } => self.on_resize(width, height, screen_width, screen_height),
            InputEvent::ContentHeight { height } => {
                self.viewport.content_height = height;
            }
            InputEvent::ImageVisible {
                id,
                src,
                natural_width,
                natural_height,
            } => self.image_visible(id, src, Vec2::new(natural_width, natural_height)),
            InputEvent::RegisterContent { id, html } => {
                self.lifecycle.register_content(id, html);
            }
            InputEvent::CloseRequested => self.close_requested(),
            InputEvent::ConfirmAccepted => self.confirm_answered(true),
            InputEvent::ConfirmCancelled => self.confirm_answered(false),
            InputEvent::Reset => self.reset(),
        }
    }

    /// Clear shown, queued, milestone and image state and close the open
    /// popup. Passed triggers can fire again.
    pub fn reset(&mut self) {
        self.close_popup();
        self.scheduler.reset(self.position);
        self.milestone.reset();
        self.images_shown.clear();
    }

    // -- Input handlers --

    fn on_scroll(&mut self, y: f32) {
        if self.is_echo(y) {
            return;
        }
        self.user_interaction();
        if self.lifecycle.is_scroll_locked() {
            return;
        }
        self.position = y;

        let window = self.throttle_window();
        let tracker = self.scheduler.tracker();
        if tracker.is_due(self.ctx.now(), window) {
            if let Some(task) = self.trailing_scroll.take() {
                self.ctx.cancel(task);
            }
            self.evaluate(y);
        } else if self.trailing_scroll.is_none() {
            let due = tracker.next_due(window);
            self.trailing_scroll = Some(self.ctx.schedule_at(due, Task::TrailingScroll));
        }
    }

    fn is_echo(&mut self, y: f32) -> bool {
        match self.echo {
            Some(expected) if (y - expected).abs() <= ECHO_TOLERANCE => {
                // One report per synthetic scroll
                self.echo = None;
                true
            }
            Some(_) => {
                self.echo = None;
                false
            }
            None => false,
        }
    }

    fn user_interaction(&mut self) {
        self.echo = None;
        self.driver.note_interaction(&mut self.ctx);
        self.start_audio();
    }

    fn start_audio(&mut self) {
        if !self.audio_started {
            self.audio_started = true;
            self.ctx.emit(Command::PlayAudio);
        }
    }

    fn on_key(&mut self, key_code: u32) {
        self.start_audio();
        if !self.tuning.keyboard_shortcuts {
            return;
        }
        match key_code {
            KEY_ESCAPE => self.close_requested(),
            KEY_RESET => {
                log::info!("reset requested from keyboard");
                self.reset();
            }
            _ => {}
        }
    }

    fn on_resize(&mut self, width: f32, height: f32, screen_width: f32, screen_height: f32) {
        self.viewport.inner = Vec2::new(width, height);
        self.viewport.screen = Vec2::new(screen_width, screen_height);
        if screen_height <= 0.0 {
            return;
        }
        let fullscreen = if self.config.profile.is_touch() {
            height == screen_height
        } else {
            width == screen_width && height == screen_height
        };
        self.fullscreen_changed(fullscreen);
    }

    fn fullscreen_changed(&mut self, fullscreen: bool) {
        if !self.scheduler.fullscreen_toggled(fullscreen, self.position) {
            return;
        }
        self.milestone.reset();
        // The popup on screen stays shown so reconciliation does not queue it again
        if let Some(source) = self.lifecycle.active().and_then(|p| p.source.clone()) {
            self.scheduler.keep_shown(&source);
        }
        if let Some(task) = self.settle.take() {
            self.ctx.cancel(task);
        }
        self.settle = Some(
            self.ctx
                .schedule_in(self.config.settle_delay_ms, Task::FullscreenSettle),
        );
    }

    fn image_visible(&mut self, id: String, src: String, natural: Vec2) {
        if self.lifecycle.is_active() || self.images_shown.contains(&id) {
            return;
        }
        if natural.x < self.config.min_image_size || natural.y < self.config.min_image_size {
            return;
        }
        let size = fit_image(natural, self.config.profile, self.viewport.inner);
        let request = OpenRequest {
            body: PopupBody::Image {
                image_id: id.clone(),
                src,
            },
            layout: Layout::new(size, 1.0),
            hide: Some(id.clone()),
            height_text: self.height_text(),
        };
        self.images_shown.insert(id);
        self.lifecycle.open(request, self.position, &mut self.ctx);
        self.sync_driver();
    }

    fn close_requested(&mut self) {
        match self.lifecycle.active().map(|p| p.kind) {
            Some(PopupKind::Confirm) => self.confirm_answered(false),
            Some(_) => self.close_popup(),
            None => {}
        }
    }

    fn confirm_answered(&mut self, accepted: bool) {
        if self.lifecycle.active().map(|p| p.kind) != Some(PopupKind::Confirm) {
            return;
        }
        if accepted {
            if let Some(spec) = &self.confirm {
                log::info!("confirm accepted, navigating to {}", spec.redirect_url);
                self.ctx.emit(Command::PauseAudio);
                self.ctx.emit(Command::Navigate {
                    url: spec.redirect_url.clone(),
                });
            }
        }
        self.close_popup();
    }

    fn close_popup(&mut self) {
        let locked_at = self.lifecycle.locked_at();
        let was_locked = self.lifecycle.is_scroll_locked();
        if self.lifecycle.close(&mut self.ctx) && was_locked {
            // Unlocking scrolls the host back; that scroll is not the user's
            self.echo = Some(locked_at);
            self.position = locked_at;
        }
    }

    // -- Evaluation --

    fn throttle_window(&self) -> f64 {
        if self.scheduler.is_fullscreen() {
            self.tuning.fullscreen_throttle_ms
        } else {
            self.tuning.scroll_throttle_ms
        }
    }

    fn height_text(&self) -> String {
        height_text(self.position, self.viewport.inner.y)
    }

    /// Run the scheduler and every position-driven check for `pos`.
    fn evaluate(&mut self, pos: f32) {
        let now = self.ctx.now();
        let mut host = TriggerHost {
            lifecycle: &mut self.lifecycle,
            ctx: &mut self.ctx,
            config: &self.config,
            viewport: self.viewport,
            at: pos,
        };
        self.scheduler.position_changed(pos, now, &mut host);

        self.ctx.emit(Command::SetHeightText {
            text: height_text(pos, self.viewport.inner.y),
        });
        self.check_milestone(pos);
        self.check_confirm(pos);
        self.check_grow(pos);
        self.sync_driver();
    }

    fn check_milestone(&mut self, pos: f32) {
        let distance = distance_cm(pos, self.viewport.inner.y);
        let blocked = self.lifecycle.is_active() || self.lifecycle.is_scroll_locked();
        let Some(band) = self.milestone.check(distance, blocked) else {
            return;
        };
        let request = OpenRequest {
            body: PopupBody::Milestone { milestone_cm: band },
            layout: fixed_layout(PopupKind::Milestone, self.config.profile, self.viewport.inner),
            hide: None,
            height_text: height_text(pos, self.viewport.inner.y),
        };
        self.lifecycle.open(request, pos, &mut self.ctx);
    }

    fn check_confirm(&mut self, pos: f32) {
        if self.confirm_shown || pos < self.config.confirm_position || self.lifecycle.is_active() {
            return;
        }
        let Some(spec) = self.confirm.clone() else {
            return;
        };
        self.confirm_shown = true;
        self.driver.stop();
        log::info!("terminal position reached at {:.0}, asking to confirm", pos);
        let request = OpenRequest {
            body: PopupBody::Confirm(spec),
            layout: fixed_layout(PopupKind::Confirm, self.config.profile, self.viewport.inner),
            hide: None,
            height_text: height_text(pos, self.viewport.inner.y),
        };
        self.lifecycle.open(request, pos, &mut self.ctx);
    }

    fn check_grow(&mut self, pos: f32) {
        let content = self.viewport.content_height;
        if content <= 0.0 || content <= self.grown_at {
            return;
        }
        if pos + self.viewport.inner.y >= content - self.config.grow_margin {
            self.grown_at = content;
            self.ctx.emit(Command::GrowColumn);
        }
    }

    /// Opening a popup stops auto-scroll.
    fn sync_driver(&mut self) {
        if self.lifecycle.is_active() {
            self.driver.stop();
        }
    }

    fn gate(&self) -> DriverGate {
        let content = self.viewport.content_height;
        DriverGate {
            popup_active: self.lifecycle.is_active(),
            scroll_locked: self.lifecycle.is_scroll_locked(),
            at_bottom: content > 0.0
                && self.position + self.viewport.inner.y >= content - self.config.bottom_margin,
        }
    }

    // -- Timers --

    fn run_due_tasks(&mut self) {
        while let Some((id, task)) = self.ctx.pop_due() {
            match task {
                Task::FadeOut { generation } => {
                    if let Some(popup) = self.lifecycle.fade_complete(generation, &mut self.ctx) {
                        self.popup_closed(popup);
                    }
                }
                Task::RefreshHeight { generation } => {
                    let text = height_text(self.lifecycle.locked_at(), self.viewport.inner.y);
                    self.lifecycle.refresh(generation, text, &mut self.ctx);
                }
                Task::FullscreenSettle => {
                    self.settle = None;
                    let mut host = TriggerHost {
                        lifecycle: &mut self.lifecycle,
                        ctx: &mut self.ctx,
                        config: &self.config,
                        viewport: self.viewport,
                        at: self.position,
                    };
                    self.scheduler.reconcile(self.position, &mut host);
                    self.sync_driver();
                }
                Task::ResumeAutoScroll => {
                    let gate = self.gate();
                    self.driver.resume_check(id, self.ctx.now(), gate);
                }
                Task::StartupSweep => {
                    let mut host = TriggerHost {
                        lifecycle: &mut self.lifecycle,
                        ctx: &mut self.ctx,
                        config: &self.config,
                        viewport: self.viewport,
                        at: self.position,
                    };
                    self.scheduler.startup_sweep(
                        self.position,
                        self.config.startup_lead,
                        self.config.startup_trail,
                        &mut host,
                    );
                    self.sync_driver();
                }
                Task::TrailingScroll => {
                    self.trailing_scroll = None;
                    if !self.lifecycle.is_scroll_locked()
                        && self.position != self.scheduler.last_position()
                    {
                        self.evaluate(self.position);
                    }
                }
            }
        }
    }

    fn popup_closed(&mut self, popup: ActivePopup) {
        log::debug!("popup {:?} closed", popup.handle);
        let mut host = TriggerHost {
            lifecycle: &mut self.lifecycle,
            ctx: &mut self.ctx,
            config: &self.config,
            viewport: self.viewport,
            at: self.position,
        };
        self.scheduler.popup_closed(&mut host);
        if self.lifecycle.is_active() {
            self.driver.stop();
        } else {
            self.driver.schedule_resume(&mut self.ctx);
        }
    }

    // -- Auto-scroll --

    fn auto_scroll(&mut self, dt_ms: f64) {
        let ticks = self.driver.ticks(dt_ms);
        for _ in 0..ticks {
            let gate = self.gate();
            let Some(step) = self.driver.next_step(self.ctx.now(), gate) else {
                break;
            };
            let mut y = self.position + step;
            if self.viewport.content_height > 0.0 {
                y = y.min(self.viewport.max_scroll());
            }
            self.position = y;
            self.echo = Some(y);
            self.ctx.emit(Command::ScrollTo { y });
            self.evaluate(y);
        }
    }
}
