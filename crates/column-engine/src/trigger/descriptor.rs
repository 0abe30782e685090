use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One potential popup, keyed by the scroll offset where it becomes eligible.
/// Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    /// Id of the content element in the document.
    pub id: String,
    /// Scroll offset (pixels) at which the popup is eligible.
    pub trigger_position: u32,
    /// Label of the close button.
    #[serde(default = "default_label")]
    pub button_label: String,
    /// Size hint `[width, height]`; zero means "size from content".
    #[serde(default)]
    pub preferred_size: Vec2,
}

fn default_label() -> String {
    "OK".to_string()
}

impl TriggerDescriptor {
    pub fn new(id: impl Into<String>, trigger_position: u32) -> Self {
        Self {
            id: id.into(),
            trigger_position,
            button_label: default_label(),
            preferred_size: Vec2::ZERO,
        }
    }

    // -- Builder pattern --

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.button_label = label.into();
        self
    }

    pub fn with_preferred_size(mut self, size: Vec2) -> Self {
        self.preferred_size = size;
        self
    }

    /// Trigger position as a scroll offset.
    pub fn position(&self) -> f32 {
        self.trigger_position as f32
    }

    /// Absolute distance from `pos` to the trigger position.
    pub fn distance_to(&self, pos: f32) -> f32 {
        (pos - self.position()).abs()
    }

    pub fn has_size_hint(&self) -> bool {
        self.preferred_size.x > 0.0 && self.preferred_size.y > 0.0
    }
}
