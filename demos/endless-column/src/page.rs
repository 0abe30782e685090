use column_engine::{ConfirmSpec, Page, PageAssets, SessionConfig, TriggerDescriptor, ViewportProfile};
use glam::Vec2;

/// Where "Yes" on the final question leads.
const REDIRECT: &str = "indexheart.html";

/// `(id, trigger position, button label, desktop size, touch size)`
const TRIGGERS: [(&str, u32, &str, [f32; 2], [f32; 2]); 15] = [
    ("higher", 4500, "Yes", [550.0, 300.0], [350.0, 250.0]),
    ("scroll1", 11800, "Yes", [400.0, 250.0], [300.0, 200.0]),
    ("scroll2", 20500, "🤤", [800.0, 400.0], [350.0, 300.0]),
    ("scroll3", 29800, "🤑", [650.0, 400.0], [350.0, 300.0]),
    ("scroll4", 59800, "Yes", [600.0, 350.0], [350.0, 280.0]),
    ("more1", 79800, "💪", [800.0, 500.0], [350.0, 400.0]),
    ("more2", 99800, "💪💪", [900.0, 600.0], [350.0, 450.0]),
    ("number", 139800, "🤭", [900.0, 500.0], [350.0, 400.0]),
    ("scroll5", 149800, "😿", [850.0, 500.0], [350.0, 400.0]),
    ("scroll6", 159800, "🫧", [850.0, 500.0], [350.0, 400.0]),
    ("scroll6plus", 164800, "😨", [800.0, 450.0], [350.0, 350.0]),
    ("scroll7", 171800, "📖", [650.0, 400.0], [350.0, 300.0]),
    ("scroll8", 172100, "🔨", [700.0, 400.0], [350.0, 300.0]),
    ("scroll9", 182100, "🌍", [650.0, 400.0], [350.0, 300.0]),
    ("scroll10", 193100, "❤️", [900.0, 500.0], [350.0, 400.0]),
];

/// The endless column: a tall stack of column images with popups along the way.
pub struct EndlessColumn;

impl EndlessColumn {
    pub fn new() -> Self {
        Self
    }
}

impl Page for EndlessColumn {
    fn config(&self, profile: ViewportProfile) -> SessionConfig {
        SessionConfig {
            confirm_position: 185_000.0,
            ..SessionConfig::for_profile(profile)
        }
    }

    fn descriptors(&self, profile: ViewportProfile) -> Vec<TriggerDescriptor> {
        TRIGGERS
            .iter()
            .map(|(id, pos, label, desktop, touch)| {
                let size = if profile.is_touch() { touch } else { desktop };
                TriggerDescriptor::new(*id, *pos)
                    .with_label(*label)
                    .with_preferred_size(Vec2::from_array(*size))
            })
            .collect()
    }

    fn confirm(&self) -> Option<ConfirmSpec> {
        Some(
            ConfirmSpec::new(
                "If we have to work and build, can we work on the build of love?",
                REDIRECT,
            )
            .with_title("🤔")
            .with_buttons("Yes", "No"),
        )
    }

    fn assets(&self, profile: ViewportProfile) -> PageAssets {
        PageAssets {
            column_image: "column3.png".to_string(),
            music: "music/Goldberg Variations_ BWV 988_ Aria-Johann Sebastian Bach.mp3".to_string(),
            initial_images: if profile.is_touch() { 8 } else { 10 },
        }
    }
}
