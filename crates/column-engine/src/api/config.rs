use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::PopupError;

/// Input/device profile. Every tolerance, threshold and size that differs
/// between phones and desktops is looked up through [`ViewportProfile::tuning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportProfile {
    #[default]
    Desktop,
    Touch,
}

/// Profile-dependent constants, in pixels and milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTuning {
    // -- Scheduler --
    /// A single position change larger than this is a fast scroll.
    pub fast_scroll_threshold: f32,
    /// How far past the landing point a fast scroll still catches a trigger.
    pub fast_scroll_range: f32,
    /// Zone half-width outside fullscreen.
    pub zone_buffer: f32,
    /// Zone half-width in fullscreen.
    pub fullscreen_zone_buffer: f32,
    /// Band used by closest-match reconciliation after a fullscreen change.
    pub reconcile_band: f32,
    /// Outer bound for the single-nearest fallback.
    pub reconcile_fallback: f32,
    /// Minimum spacing between evaluated scroll events.
    pub scroll_throttle_ms: f64,
    pub fullscreen_throttle_ms: f64,
    /// Delay before the startup sweep.
    pub startup_delay_ms: f64,

    // -- Input --
    pub auto_scroll_default: bool,
    pub keyboard_shortcuts: bool,

    // -- Sizing --
    pub chars_per_line: f32,
    pub words_per_line: f32,
    pub line_height: f32,
    pub text_min_size: Vec2,
    /// Extra height reserved for the popup footer.
    pub footer_height: f32,
    /// Max image lightbox size as a fraction of the viewport.
    pub image_max_fraction: Vec2,
}

impl ViewportProfile {
    pub fn is_touch(self) -> bool {
        self == ViewportProfile::Touch
    }

    pub fn tuning(self) -> ProfileTuning {
        match self {
            ViewportProfile::Desktop => ProfileTuning {
                fast_scroll_threshold: 400.0,
                fast_scroll_range: 100.0,
                zone_buffer: 100.0,
                fullscreen_zone_buffer: 300.0,
                reconcile_band: 1000.0,
                reconcile_fallback: 5000.0,
                scroll_throttle_ms: 100.0,
                fullscreen_throttle_ms: 50.0,
                startup_delay_ms: 1500.0,
                auto_scroll_default: false,
                keyboard_shortcuts: true,
                chars_per_line: 50.0,
                words_per_line: 8.0,
                line_height: 28.0,
                text_min_size: Vec2::new(500.0, 400.0),
                footer_height: 60.0,
                image_max_fraction: Vec2::new(0.3, 0.4),
            },
            ViewportProfile::Touch => ProfileTuning {
                fast_scroll_threshold: 300.0,
                fast_scroll_range: 150.0,
                zone_buffer: 200.0,
                fullscreen_zone_buffer: 400.0,
                reconcile_band: 1500.0,
                reconcile_fallback: 5000.0,
                scroll_throttle_ms: 150.0,
                fullscreen_throttle_ms: 150.0,
                startup_delay_ms: 2500.0,
                auto_scroll_default: true,
                keyboard_shortcuts: false,
                chars_per_line: 30.0,
                words_per_line: 5.0,
                line_height: 24.0,
                text_min_size: Vec2::new(300.0, 250.0),
                footer_height: 70.0,
                image_max_fraction: Vec2::new(0.8, 0.6),
            },
        }
    }
}

/// Session configuration, provided by the page.
/// Every field has a default, so a config JSON may list only overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub profile: ViewportProfile,
    /// Auto-scroll on/off. `None` follows the profile default (touch only).
    pub auto_scroll: Option<bool>,
    /// Quiet period after manual input before auto-scroll resumes.
    pub auto_scroll_cooldown_ms: f64,
    /// Auto-scroll tick interval (~60 per second).
    pub auto_scroll_tick_ms: f64,
    /// Random step range per tick, `[min, max)` pixels.
    pub auto_scroll_step: [f32; 2],
    /// Popup fade-out before teardown.
    pub fade_out_ms: f64,
    /// Delay after a fullscreen change before reconciliation.
    pub settle_delay_ms: f64,
    /// In-popup height display refresh interval.
    pub refresh_interval_ms: f64,
    /// Startup sweep window: `trigger - lead < pos < trigger + trail`.
    pub startup_lead: f32,
    pub startup_trail: f32,
    pub milestone_floor_cm: f32,
    pub milestone_band_cm: f32,
    /// Scroll offset that raises the confirm dialog.
    pub confirm_position: f32,
    /// Ask for another column image when this close to the bottom.
    pub grow_margin: f32,
    /// Auto-scroll stops when this close to the bottom.
    pub bottom_margin: f32,
    /// Smallest natural image size that gets a lightbox.
    pub min_image_size: f32,
    /// Seed for the auto-scroll jitter.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: ViewportProfile::Desktop,
            auto_scroll: None,
            auto_scroll_cooldown_ms: 3000.0,
            auto_scroll_tick_ms: 16.0,
            auto_scroll_step: [1.0, 3.0],
            fade_out_ms: 300.0,
            settle_delay_ms: 300.0,
            refresh_interval_ms: 100.0,
            startup_lead: 500.0,
            startup_trail: 1000.0,
            milestone_floor_cm: 5000.0,
            milestone_band_cm: 1000.0,
            confirm_position: 185_000.0,
            grow_margin: 50.0,
            bottom_margin: 10.0,
            min_image_size: 100.0,
            seed: 42,
        }
    }
}

impl SessionConfig {
    /// Defaults for a given profile.
    pub fn for_profile(profile: ViewportProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PopupError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn tuning(&self) -> ProfileTuning {
        self.profile.tuning()
    }

    pub fn auto_scroll_enabled(&self) -> bool {
        self.auto_scroll
            .unwrap_or_else(|| self.tuning().auto_scroll_default)
    }
}
