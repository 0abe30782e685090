//! Popup lifecycle: open, close, fade-out and the scroll lock.
//!
//! Holds the single active popup slot. Opening while a popup is active first
//! force-closes the old one, so two popups never coexist.

use std::collections::HashMap;

use glam::Vec2;

use crate::api::config::{SessionConfig, ViewportProfile};
use crate::api::types::{Command, Layout, PopupBody, PopupHandle, PopupKind};
use crate::core::clock::TaskId;
use crate::core::context::{SessionContext, Task};
use crate::error::PopupError;
use crate::systems::sizing::estimate_layout;
use crate::trigger::descriptor::TriggerDescriptor;

/// The popup currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePopup {
    pub kind: PopupKind,
    /// Descriptor id for trigger popups.
    pub source: Option<String>,
    pub handle: PopupHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    /// Close started; torn down when the fade task fires.
    Closing,
}

#[derive(Debug)]
struct Slot {
    popup: ActivePopup,
    phase: Phase,
    /// Tasks carry this to detect that they outlived their popup.
    generation: u64,
    hidden: Option<String>,
    refresh: Option<TaskId>,
    fade: Option<TaskId>,
}

/// Everything needed to put a popup on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub body: PopupBody,
    pub layout: Layout,
    /// Element to hide while the popup shows.
    pub hide: Option<String>,
    pub height_text: String,
}

pub struct PopupLifecycle {
    slot: Option<Slot>,
    scroll_locked: bool,
    locked_at: f32,
    /// Inner HTML of registered content elements, by element id.
    content: HashMap<String, String>,
    next_handle: u32,
    generation: u64,
    fade_out_ms: f64,
    refresh_ms: f64,
}

impl PopupLifecycle {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            slot: None,
            scroll_locked: false,
            locked_at: 0.0,
            content: HashMap::new(),
            next_handle: 1,
            generation: 0,
            fade_out_ms: config.fade_out_ms,
            refresh_ms: config.refresh_interval_ms,
        }
    }

    // -- Content --

    pub fn register_content(&mut self, id: impl Into<String>, html: impl Into<String>) {
        self.content.insert(id.into(), html.into());
    }

    pub fn has_content(&self, id: &str) -> bool {
        self.content.contains_key(id)
    }

    // -- State --

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    pub fn active(&self) -> Option<&ActivePopup> {
        self.slot.as_ref().map(|s| &s.popup)
    }

    pub fn phase(&self) -> Option<Phase> {
        self.slot.as_ref().map(|s| s.phase)
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Scroll offset the viewport is pinned at while locked.
    pub fn locked_at(&self) -> f32 {
        self.locked_at
    }

    // -- Open / close --

    /// Open a text popup for a trigger descriptor.
    pub fn open_text(
        &mut self,
        descriptor: &TriggerDescriptor,
        at: f32,
        viewport: Vec2,
        profile: ViewportProfile,
        height_text: String,
        ctx: &mut SessionContext,
    ) -> Result<PopupHandle, PopupError> {
        let html = self
            .content
            .get(&descriptor.id)
            .ok_or_else(|| PopupError::MissingTarget(descriptor.id.clone()))?
            .clone();
        let layout = estimate_layout(&html, descriptor.preferred_size, profile, viewport);
        let request = OpenRequest {
            body: PopupBody::Text {
                source_id: descriptor.id.clone(),
                html,
                button_label: descriptor.button_label.clone(),
            },
            layout,
            hide: Some(descriptor.id.clone()),
            height_text,
        };
        Ok(self.open(request, at, ctx))
    }

    /// Put a popup on screen, pinning the viewport at `at`.
    pub fn open(&mut self, request: OpenRequest, at: f32, ctx: &mut SessionContext) -> PopupHandle {
        if self.slot.is_some() {
            self.force_close(ctx);
        }

        let handle = PopupHandle(self.next_handle);
        self.next_handle += 1;
        self.generation += 1;

        let kind = request.body.kind();
        let source = match &request.body {
            PopupBody::Text { source_id, .. } => Some(source_id.clone()),
            _ => None,
        };

        if let Some(id) = &request.hide {
            ctx.emit(Command::HideElement { id: id.clone() });
        }
        if !self.scroll_locked {
            self.scroll_locked = true;
            self.locked_at = at;
            ctx.emit(Command::LockScroll { at });
        }
        ctx.emit(Command::RenderPopup {
            handle,
            body: request.body,
            layout: request.layout,
            height_text: request.height_text,
        });

        let refresh = (kind == PopupKind::Text).then(|| {
            ctx.schedule_in(
                self.refresh_ms,
                Task::RefreshHeight {
                    generation: self.generation,
                },
            )
        });

        log::debug!("popup {:?} opened as {:?}", kind, handle);
        self.slot = Some(Slot {
            popup: ActivePopup {
                kind,
                source,
                handle,
            },
            phase: Phase::Open,
            generation: self.generation,
            hidden: request.hide,
            refresh,
            fade: None,
        });
        handle
    }

    /// Start closing: release the scroll lock and restore the hidden element
    /// now, tear down after the fade. Returns false if nothing was open.
    pub fn close(&mut self, ctx: &mut SessionContext) -> bool {
        let Some(slot) = self.slot.as_mut() else {
            return false;
        };
        if slot.phase == Phase::Closing {
            return false;
        }
        slot.phase = Phase::Closing;
        if let Some(refresh) = slot.refresh.take() {
            ctx.cancel(refresh);
        }
        if let Some(id) = slot.hidden.take() {
            ctx.emit(Command::RestoreElement { id });
        }
        slot.fade = Some(ctx.schedule_in(
            self.fade_out_ms,
            Task::FadeOut {
                generation: slot.generation,
            },
        ));
        self.unlock(ctx);
        true
    }

    /// The fade task fired. Tears the popup down and returns it, so the
    /// caller can tell the scheduler. Stale fades return `None`.
    pub fn fade_complete(&mut self, generation: u64, ctx: &mut SessionContext) -> Option<ActivePopup> {
        match &self.slot {
            Some(slot) if slot.generation == generation && slot.phase == Phase::Closing => {}
            _ => {
                log::debug!("ignoring stale fade for generation {}", generation);
                return None;
            }
        }
        let slot = self.slot.take()?;
        ctx.emit(Command::TeardownPopup {
            handle: slot.popup.handle,
        });
        Some(slot.popup)
    }

    /// Periodic height refresh. Reschedules itself while the popup stays open.
    pub fn refresh(&mut self, generation: u64, text: String, ctx: &mut SessionContext) -> bool {
        let Some(slot) = self.slot.as_mut() else {
            return false;
        };
        if slot.generation != generation || slot.phase != Phase::Open {
            return false;
        }
        ctx.emit(Command::SetPopupHeightText {
            handle: slot.popup.handle,
            text,
        });
        slot.refresh = Some(ctx.schedule_in(self.refresh_ms, Task::RefreshHeight { generation }));
        true
    }

    /// Tear down the current popup immediately, keeping the scroll lock for
    /// the popup that replaces it. Emits no close notification.
    fn force_close(&mut self, ctx: &mut SessionContext) {
        let Some(mut slot) = self.slot.take() else {
            return;
        };
        log::debug!("force-closing {:?} to open another popup", slot.popup.handle);
        for task in [slot.refresh.take(), slot.fade.take()].into_iter().flatten() {
            ctx.cancel(task);
        }
        if let Some(id) = slot.hidden.take() {
            ctx.emit(Command::RestoreElement { id });
        }
        ctx.emit(Command::TeardownPopup {
            handle: slot.popup.handle,
        });
    }

    fn unlock(&mut self, ctx: &mut SessionContext) {
        if self.scroll_locked {
            self.scroll_locked = false;
            ctx.emit(Command::UnlockScroll {
                restore_to: self.locked_at,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> (PopupLifecycle, SessionContext) {
        let mut lc = PopupLifecycle::new(&SessionConfig::default());
        lc.register_content("a", "<p>Hello</p>");
        lc.register_content("b", "<p>Again</p>");
        (lc, SessionContext::new())
    }

    fn open(lc: &mut PopupLifecycle, ctx: &mut SessionContext, id: &str) -> Result<PopupHandle, PopupError> {
        let d = TriggerDescriptor::new(id, 100);
        lc.open_text(
            &d,
            100.0,
            Vec2::new(1280.0, 800.0),
            ViewportProfile::Desktop,
            "Column height: 1.00 cm".into(),
            ctx,
        )
    }

    fn run_due(lc: &mut PopupLifecycle, ctx: &mut SessionContext) -> Option<ActivePopup> {
        let mut closed = None;
        while let Some((_, task)) = ctx.pop_due() {
            match task {
                Task::FadeOut { generation } => closed = lc.fade_complete(generation, ctx),
                Task::RefreshHeight { generation } => {
                    lc.refresh(generation, "tick".into(), ctx);
                }
                _ => {}
            }
        }
        closed
    }

    #[test]
    fn open_hides_locks_and_renders() {
        let (mut lc, mut ctx) = lifecycle();
        let handle = open(&mut lc, &mut ctx, "a").unwrap();
        let cmds = ctx.drain_commands();
        assert_eq!(cmds[0], Command::HideElement { id: "a".into() });
        assert_eq!(cmds[1], Command::LockScroll { at: 100.0 });
        assert!(matches!(cmds[2], Command::RenderPopup { handle: h, .. } if h == handle));
        assert!(lc.is_scroll_locked());
        assert_eq!(lc.active().unwrap().source.as_deref(), Some("a"));
    }

    #[test]
    fn missing_target_is_an_error_and_noop() {
        let (mut lc, mut ctx) = lifecycle();
        let err = open(&mut lc, &mut ctx, "nope").unwrap_err();
        assert!(matches!(err, PopupError::MissingTarget(id) if id == "nope"));
        assert!(!lc.is_active());
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn close_fades_then_tears_down() {
        let (mut lc, mut ctx) = lifecycle();
        let handle = open(&mut lc, &mut ctx, "a").unwrap();
        ctx.drain_commands();

        assert!(lc.close(&mut ctx));
        assert!(!lc.close(&mut ctx));
        assert!(lc.is_active());
        assert!(!lc.is_scroll_locked());
        let cmds = ctx.drain_commands();
        assert!(cmds.contains(&Command::RestoreElement { id: "a".into() }));
        assert!(cmds.contains(&Command::UnlockScroll { restore_to: 100.0 }));

        ctx.advance(299.0);
        assert!(run_due(&mut lc, &mut ctx).is_none());
        ctx.advance(1.0);
        let closed = run_due(&mut lc, &mut ctx).unwrap();
        assert_eq!(closed.handle, handle);
        assert!(!lc.is_active());
        assert_eq!(ctx.drain_commands(), vec![Command::TeardownPopup { handle }]);
    }

    #[test]
    fn refresh_runs_while_open_and_stops_on_close() {
        let (mut lc, mut ctx) = lifecycle();
        let handle = open(&mut lc, &mut ctx, "a").unwrap();
        ctx.drain_commands();

        ctx.advance(100.0);
        run_due(&mut lc, &mut ctx);
        ctx.advance(100.0);
        run_due(&mut lc, &mut ctx);
        let refreshes = ctx
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, Command::SetPopupHeightText { handle: h, .. } if *h == handle))
            .count();
        assert_eq!(refreshes, 2);

        lc.close(&mut ctx);
        ctx.advance(1000.0);
        run_due(&mut lc, &mut ctx);
        assert!(!ctx
            .drain_commands()
            .iter()
            .any(|c| matches!(c, Command::SetPopupHeightText { .. })));
    }

    #[test]
    fn open_while_active_force_closes_first() {
        let (mut lc, mut ctx) = lifecycle();
        let first = open(&mut lc, &mut ctx, "a").unwrap();
        lc.close(&mut ctx);
        ctx.drain_commands();

        let second = open(&mut lc, &mut ctx, "b").unwrap();
        let cmds = ctx.drain_commands();
        assert!(cmds.contains(&Command::TeardownPopup { handle: first }));
        assert_eq!(lc.active().unwrap().handle, second);

        // The first popup's fade is cancelled and a stale one would be ignored
        ctx.advance(1000.0);
        assert!(run_due(&mut lc, &mut ctx).is_none());
        assert_eq!(lc.active().unwrap().handle, second);
        assert!(lc.fade_complete(1, &mut ctx).is_none());
    }
}
