use glam::Vec2;

/// Handle to a rendered popup, allocated by the lifecycle controller.
/// The presentation layer keys its DOM nodes by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopupHandle(pub u32);

/// The four kinds of modal the page can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    Text,
    Image,
    Milestone,
    Confirm,
}

/// Computed popup box. `font_scale` multiplies the source element's font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub size: Vec2,
    pub font_scale: f32,
}

impl Layout {
    pub fn new(size: Vec2, font_scale: f32) -> Self {
        Self { size, font_scale }
    }
}

/// Content of a popup, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupBody {
    Text {
        source_id: String,
        html: String,
        button_label: String,
    },
    Image {
        image_id: String,
        src: String,
    },
    Milestone {
        milestone_cm: u32,
    },
    Confirm(ConfirmSpec),
}

impl PopupBody {
    pub fn kind(&self) -> PopupKind {
        match self {
            PopupBody::Text { .. } => PopupKind::Text,
            PopupBody::Image { .. } => PopupKind::Image,
            PopupBody::Milestone { .. } => PopupKind::Milestone,
            PopupBody::Confirm(_) => PopupKind::Confirm,
        }
    }
}

/// The yes/no dialog shown once at the terminal scroll position.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmSpec {
    pub title: String,
    pub message: String,
    pub ok_text: String,
    pub cancel_text: String,
    /// Where `onConfirm` navigates to.
    pub redirect_url: String,
}

impl ConfirmSpec {
    pub fn new(message: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            message: message.into(),
            ok_text: "OK".to_string(),
            cancel_text: "Cancel".to_string(),
            redirect_url: redirect_url.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_buttons(mut self, ok: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.ok_text = ok.into();
        self.cancel_text = cancel.into();
        self
    }
}

/// Instructions for the presentation layer, emitted by the session and
/// drained by the host once per tick. The engine never inspects results.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RenderPopup {
        handle: PopupHandle,
        body: PopupBody,
        layout: Layout,
        height_text: String,
    },
    TeardownPopup { handle: PopupHandle },
    HideElement { id: String },
    RestoreElement { id: String },
    /// Pin the viewport at `at` (body fixed with a negative top offset).
    LockScroll { at: f32 },
    /// Release the pin and scroll back to where it was engaged.
    UnlockScroll { restore_to: f32 },
    /// Synthetic scroll from the auto-scroll driver.
    ScrollTo { y: f32 },
    /// Update the floating "Column height" display.
    SetHeightText { text: String },
    /// Update the height line inside an open popup.
    SetPopupHeightText { handle: PopupHandle, text: String },
    /// Append another column image to the bottom of the page.
    GrowColumn,
    PlayAudio,
    PauseAudio,
    Navigate { url: String },
}

/// Viewport and document dimensions as last reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `innerWidth × innerHeight`.
    pub inner: Vec2,
    /// `screen.width × screen.height`. Zero until the host reports it.
    pub screen: Vec2,
    /// Total scrollable document height.
    pub content_height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            inner: Vec2::new(1280.0, 800.0),
            screen: Vec2::ZERO,
            content_height: 0.0,
        }
    }
}

impl Viewport {
    /// Largest scroll offset the document allows.
    pub fn max_scroll(&self) -> f32 {
        (self.content_height - self.inner.y).max(0.0)
    }
}
