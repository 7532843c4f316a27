//! Display scale model
//!
//! Converts between document space (page points at reference scale 1.0)
//! and display space (on-screen pixels at the current zoom). Stored
//! geometry is document space only; the scale factor is applied at draw
//! time and inverted at capture time, never baked into geometry.

/// Minimum scale produced by fit-to-width.
pub const MIN_FIT_SCALE: f32 = 0.10;

/// Manual zoom step per zoom-in/zoom-out action.
pub const ZOOM_STEP: f32 = 0.25;

/// Manual zoom floor.
pub const MIN_ZOOM: f32 = 0.5;

/// Horizontal padding subtracted from the container (20 px per side).
pub const FIT_PADDING: f32 = 40.0;

/// Container width floor once padding is removed.
const MIN_AVAILABLE_WIDTH: f32 = 100.0;

#[inline]
pub fn document_to_display(value: f32, scale: f32) -> f32 {
    value * scale
}

#[inline]
pub fn display_to_document(value: f32, scale: f32) -> f32 {
    value / scale
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Result of a fit-to-width request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// Fit applied; carries the resulting scale.
    Applied(f32),
    /// The container has no measurable width yet; retry after a short
    /// delay instead of dividing by zero.
    NotMeasurable,
}

/// Process-wide display zoom. Always > 0 after [`ScaleModel::sanitized`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleModel {
    scale: f32,
    fit_width: bool,
}

impl Default for ScaleModel {
    fn default() -> Self {
        Self { scale: 1.0, fit_width: false }
    }
}

impl ScaleModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scale, corrected to 1.0 first if it is non-finite or
    /// non-positive. Every geometry computation goes through this.
    pub fn sanitized(&mut self) -> f32 {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            log::warn!("invalid scale {} corrected to 1.0", self.scale);
            self.scale = 1.0;
        }
        self.scale
    }

    /// Raw scale for display purposes (floored at 1% for readouts).
    pub fn zoom_percent(&self) -> u16 {
        (self.scale.max(0.01) * 100.0).round() as u16
    }

    pub fn is_fit_width(&self) -> bool {
        self.fit_width
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.fit_width = false;
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.scale = self.sanitized() + ZOOM_STEP;
        self.fit_width = false;
        self.scale
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.scale = (self.sanitized() - ZOOM_STEP).max(MIN_ZOOM);
        self.fit_width = false;
        self.scale
    }

    /// Fit the page's document-space width to the container.
    ///
    /// `container_width` is the raw container width; padding and the
    /// minimum usable width are applied here.
    pub fn fit_to_width(&mut self, container_width: f32, page_width: f32) -> FitOutcome {
        if container_width <= 0.0 {
            return FitOutcome::NotMeasurable;
        }

        let available = (container_width - FIT_PADDING).max(MIN_AVAILABLE_WIDTH);
        let fitted = (available / page_width).max(MIN_FIT_SCALE);

        self.scale = round2(fitted);
        self.fit_width = true;
        FitOutcome::Applied(self.scale)
    }
}
