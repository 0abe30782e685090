/// CSS reference pixels per inch.
const PX_PER_INCH: f32 = 96.0;
const CM_PER_INCH: f32 = 2.54;

/// Column height in centimetres for a scroll offset: the bottom edge of the
/// viewport converted at 96 px per inch.
pub fn distance_cm(scroll_y: f32, viewport_height: f32) -> f32 {
    (scroll_y + viewport_height) / PX_PER_INCH * CM_PER_INCH
}

/// The "Column height: 123.45 cm" line shown on the page and in popups.
pub fn height_text(scroll_y: f32, viewport_height: f32) -> String {
    format!("Column height: {:.2} cm", distance_cm(scroll_y, viewport_height))
}

/// Fires once per distance band above a floor.
#[derive(Debug, Clone)]
pub struct MilestoneDetector {
    floor_cm: f32,
    band_cm: f32,
    last_fired: u32,
}

impl MilestoneDetector {
    pub fn new(floor_cm: f32, band_cm: f32) -> Self {
        Self {
            floor_cm,
            band_cm,
            last_fired: 0,
        }
    }

    /// Check `distance` (cm). `blocked` is true while a popup is open or the
    /// scroll is locked; a blocked check never fires and never advances the band.
    /// Returns the band to celebrate.
    pub fn check(&mut self, distance: f32, blocked: bool) -> Option<u32> {
        if distance < self.floor_cm || blocked {
            return None;
        }
        let band = ((distance / self.band_cm).floor() * self.band_cm) as u32;
        if band > self.last_fired {
            self.last_fired = band;
            log::info!("milestone reached: {} cm", band);
            Some(band)
        } else {
            None
        }
    }

    pub fn last_fired(&self) -> u32 {
        self.last_fired
    }

    pub fn reset(&mut self) {
        self.last_fired = 0;
    }
}
