use crate::api::config::{SessionConfig, ViewportProfile};
use crate::api::types::ConfirmSpec;
use crate::trigger::descriptor::TriggerDescriptor;

/// Static assets the presentation layer needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageAssets {
    /// The repeating column image.
    pub column_image: String,
    /// Looping background track. Empty disables audio.
    pub music: String,
    /// Number of column images appended at startup.
    pub initial_images: u32,
}

/// The contract every page must fulfill.
pub trait Page {
    /// Session configuration for the detected profile. Called once before the session starts.
    fn config(&self, profile: ViewportProfile) -> SessionConfig {
        SessionConfig::for_profile(profile)
    }

    /// The popup trigger table. Size hints may differ per profile.
    fn descriptors(&self, profile: ViewportProfile) -> Vec<TriggerDescriptor>;

    /// The terminal confirm dialog, if the page has one.
    fn confirm(&self) -> Option<ConfirmSpec> {
        None
    }

    fn assets(&self, _profile: ViewportProfile) -> PageAssets {
        PageAssets::default()
    }
}
