/// Key code for `Escape` (closes the open popup).
pub const KEY_ESCAPE: u32 = 27;
/// Key code for `R` (resets every popup).
pub const KEY_RESET: u32 = 82;

/// Input events the session understands.
/// The host translates browser events into these and pushes them in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The document scrolled to offset `y`.
    Scroll { y: f32 },
    TouchStart,
    TouchMove,
    TouchEnd,
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// The fullscreen API reported a change.
    FullscreenChanged { fullscreen: bool },
    /// The window resized. Screen size lets the session infer fullscreen.
    Resize {
        width: f32,
        height: f32,
        screen_width: f32,
        screen_height: f32,
    },
    /// Total document height changed (an image loaded or was appended).
    ContentHeight { height: f32 },
    /// A column image scrolled into view.
    ImageVisible {
        id: String,
        src: String,
        natural_width: f32,
        natural_height: f32,
    },
    /// The content element for a text popup exists with this inner HTML.
    RegisterContent { id: String, html: String },
    /// The user dismissed the open popup (button, overlay click).
    CloseRequested,
    ConfirmAccepted,
    ConfirmCancelled,
    /// Manual "reset all popups".
    Reset,
}

impl InputEvent {
    /// Whether this event is direct user interaction that should pause auto-scroll.
    pub fn is_manual_interaction(&self) -> bool {
        matches!(
            self,
            InputEvent::Scroll { .. }
                | InputEvent::TouchStart
                | InputEvent::TouchMove
                | InputEvent::TouchEnd
        )
    }
}

/// A queue of input events.
/// JS writes events into the queue; the session drains them each tick.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    /// Push a new input event (called from JS via wasm-bindgen).
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_keeps_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::Scroll { y: 10.0 });
        q.push(InputEvent::KeyDown { key_code: KEY_ESCAPE });
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events[0], InputEvent::Scroll { y: 10.0 });
        assert_eq!(events[1], InputEvent::KeyDown { key_code: KEY_ESCAPE });
        assert!(q.is_empty());
    }

    #[test]
    fn manual_interaction_classification() {
        assert!(InputEvent::TouchMove.is_manual_interaction());
        assert!(InputEvent::Scroll { y: 0.0 }.is_manual_interaction());
        assert!(!InputEvent::CloseRequested.is_manual_interaction());
        assert!(!InputEvent::FullscreenChanged { fullscreen: true }.is_manual_interaction());
    }
}
