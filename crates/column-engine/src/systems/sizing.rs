//! Popup sizing heuristics.
//!
//! Pure functions of content text and viewport: nothing here decides whether
//! a popup opens, only how big it is.

use glam::Vec2;

use crate::api::config::ViewportProfile;
use crate::api::types::{Layout, PopupKind};

/// Rough text statistics of a popup's HTML content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentStats {
    pub chars: usize,
    pub words: usize,
    pub line_breaks: usize,
    pub estimated_lines: usize,
}

impl ContentStats {
    pub fn is_complex(&self) -> bool {
        self.chars > 200 || self.estimated_lines > 8
    }

    pub fn is_very_complex(&self) -> bool {
        self.chars > 400 || self.estimated_lines > 15
    }
}

/// Drop everything between `<` and `>`.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

pub fn analyze(html: &str, profile: ViewportProfile) -> ContentStats {
    let tuning = profile.tuning();
    let text = strip_tags(html);
    let chars = text.chars().count();
    let words = text.split_whitespace().count().max(1);
    let line_breaks = html.matches("<br>").count();

    let by_chars = (chars as f32 / tuning.chars_per_line).ceil() as usize;
    let by_words = (words as f32 / tuning.words_per_line).ceil() as usize;
    let estimated_lines = by_chars.max(by_words).max(line_breaks + 1);

    ContentStats {
        chars,
        words,
        line_breaks,
        estimated_lines,
    }
}

/// Size suggested by the content alone, before size hints and clamping.
fn content_size(stats: &ContentStats, profile: ViewportProfile, viewport: Vec2) -> Vec2 {
    let tuning = profile.tuning();
    let touch = profile.is_touch();

    let base_width = if touch {
        350.0_f32.min(viewport.x * 0.9)
    } else if stats.chars < 80 {
        450.0
    } else if stats.chars < 200 {
        550.0
    } else if stats.chars < 400 {
        650.0
    } else {
        750.0
    };

    let padding = if stats.estimated_lines > 10 { 1.6 } else { 2.0 };
    let base_height = stats.estimated_lines as f32 * tuning.line_height + 60.0 * padding;

    let (grow, max_w, max_h) = if touch { (1.0, 0.95, 0.8) } else { (1.2, 0.9, 0.85) };
    Vec2::new(
        (base_width * grow).round().min(viewport.x * max_w),
        (base_height * grow).round().min(viewport.y * max_h),
    )
}

/// Layout for a text popup: content heuristics, the descriptor's size hint,
/// profile minimums and viewport caps, plus room for the footer.
pub fn estimate_layout(
    html: &str,
    preferred: Vec2,
    profile: ViewportProfile,
    viewport: Vec2,
) -> Layout {
    let tuning = profile.tuning();
    let stats = analyze(html, profile);
    let content = content_size(&stats, profile, viewport);

    let (mut size, font_scale) = if profile.is_touch() {
        let size = Vec2::new(
            content.x.max(350.0).min(viewport.x * 0.95),
            content.y.max(300.0).min(viewport.y * 0.8),
        );
        (size, if stats.is_very_complex() { 0.9 } else { 0.95 })
    } else {
        let wanted = if preferred.x > 0.0 && preferred.y > 0.0 {
            preferred.max(content) * 1.5
        } else {
            content * 1.5
        };
        let scale = if stats.is_very_complex() {
            0.85
        } else if stats.is_complex() {
            0.9
        } else {
            0.95
        };
        (wanted.min(viewport * 0.95), scale)
    };

    size = size.max(tuning.text_min_size.min(viewport * Vec2::new(0.7, 0.6)));
    let max_h = if profile.is_touch() { 0.85 } else { 0.98 };
    size = size.min(Vec2::new(viewport.x * 0.98, viewport.y * max_h));
    size.y += tuning.footer_height;

    Layout::new(size, font_scale)
}

/// Scale an image's natural size down to the profile's share of the viewport,
/// preserving aspect ratio.
pub fn fit_image(natural: Vec2, profile: ViewportProfile, viewport: Vec2) -> Vec2 {
    let max = viewport * profile.tuning().image_max_fraction;
    let mut size = natural;
    if size.x > max.x {
        size *= max.x / size.x;
    }
    if size.y > max.y {
        size *= max.y / size.y;
    }
    size.round()
}

/// Fixed layouts for the popups that have no content element.
pub fn fixed_layout(kind: PopupKind, profile: ViewportProfile, viewport: Vec2) -> Layout {
    let touch = profile.is_touch();
    match kind {
        PopupKind::Milestone if touch => Layout::new(
            Vec2::new((viewport.x * 0.9).min(400.0), (viewport.y * 0.5).min(300.0)),
            1.0,
        ),
        PopupKind::Milestone => Layout::new(Vec2::new(500.0, 300.0), 1.0),
        PopupKind::Confirm if touch => {
            Layout::new(Vec2::new((viewport.x * 0.9).min(400.0), 240.0), 1.0)
        }
        PopupKind::Confirm => Layout::new(Vec2::new(460.0, 220.0), 1.0),
        PopupKind::Text | PopupKind::Image => {
            Layout::new(profile.tuning().text_min_size.min(viewport), 1.0)
        }
    }
}
