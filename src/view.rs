//! Mapping between image pixels and the display surface.
//!
//! The image is scaled to fit the surface, multiplied by the user zoom and
//! centered on the surface center shifted by the pan offset.

use tracing::trace;

use crate::enums::ZoomDirection;

/// User-controlled part of the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Relative to the fit-to-window scale.
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom factor applied per zoom step.
    pub zoom_step: f64,
    /// Floor of the effective scale.
    pub min_scale: f64,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.1,
            min_scale: 1e-4,
        }
    }
}

/// Placement of the scaled image on the surface, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Surface pixels per image pixel.
    pub scale: f64,
}

#[derive(Debug, Clone, Copy)]
struct PanDrag {
    start_x: f64,
    start_y: f64,
    start_pan_x: f64,
    start_pan_y: f64,
}

#[derive(Debug, Clone)]
pub struct ViewTransform {
    state: ViewState,
    limits: ViewLimits,
    surface: (f64, f64),
    image: Option<(u32, u32)>,
    drag: Option<PanDrag>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(ViewLimits::default())
    }
}

impl ViewTransform {
    pub fn new(limits: ViewLimits) -> Self {
        Self {
            state: ViewState::default(),
            limits,
            surface: (1.0, 1.0),
            image: None,
            drag: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn limits(&self) -> ViewLimits {
        self.limits
    }

    /// Surface size as reported by the UI; clamped to at least 1x1.
    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.surface = (width.max(1.0), height.max(1.0));
    }

    pub fn surface_size(&self) -> (f64, f64) {
        self.surface
    }

    /// Image size (columns, rows). A zero dimension means no image.
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.image = (width > 0 && height > 0).then_some((width, height));
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image
    }

    pub fn fit_scale(&self) -> Option<f64> {
        let (image_w, image_h) = self.image?;
        let (surface_w, surface_h) = self.surface;
        Some((surface_w / image_w as f64).min(surface_h / image_h as f64))
    }

    pub fn effective_scale(&self) -> Option<f64> {
        let zoom = self.state.zoom.clamp(self.limits.min_zoom, self.limits.max_zoom);
        Some((self.fit_scale()? * zoom).max(self.limits.min_scale))
    }

    pub fn image_rect(&self) -> Option<ImageRect> {
        let (image_w, image_h) = self.image?;
        let scale = self.effective_scale()?;
        let (surface_w, surface_h) = self.surface;
        let center_x = surface_w / 2.0 + self.state.pan_x;
        let center_y = surface_h / 2.0 + self.state.pan_y;
        let scaled_w = image_w as f64 * scale;
        let scaled_h = image_h as f64 * scale;
        let x0 = center_x - scaled_w / 2.0;
        let y0 = center_y - scaled_h / 2.0;
        Some(ImageRect {
            x0,
            y0,
            x1: x0 + scaled_w,
            y1: y0 + scaled_h,
            scale,
        })
    }

    /// Size of the scaled raster in whole surface pixels; `None` when it
    /// would collapse below one pixel.
    pub fn display_size(&self) -> Option<(u32, u32)> {
        let (image_w, image_h) = self.image?;
        let scale = self.effective_scale()?;
        let width = (image_w as f64 * scale) as u32;
        let height = (image_h as f64 * scale) as u32;
        (width >= 1 && height >= 1).then_some((width, height))
    }

    /// Surface position of the center of pixel (i, j).
    pub fn image_to_display(&self, i: f64, j: f64) -> Option<(f64, f64)> {
        let rect = self.image_rect()?;
        Some((
            rect.x0 + (i + 0.5) * rect.scale,
            rect.y0 + (j + 0.5) * rect.scale,
        ))
    }

    /// Pixel under a surface position, `None` outside the image.
    pub fn display_to_image(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let (image_w, image_h) = self.image?;
        let rect = self.image_rect()?;
        let i = ((x - rect.x0) / rect.scale).floor();
        let j = ((y - rect.y0) / rect.scale).floor();
        if !(i.is_finite() && j.is_finite()) {
            return None;
        }
        if i < 0.0 || j < 0.0 || i >= image_w as f64 || j >= image_h as f64 {
            return None;
        }
        Some((i as u32, j as u32))
    }

    /// Zoom one step keeping the image point under (x, y) fixed.
    /// Returns whether the zoom changed.
    pub fn zoom_at(&mut self, x: f64, y: f64, direction: ZoomDirection) -> bool {
        let old_zoom = self.state.zoom;
        let stepped = match direction {
            ZoomDirection::In => old_zoom * self.limits.zoom_step,
            ZoomDirection::Out => old_zoom / self.limits.zoom_step,
        };
        let new_zoom = stepped.clamp(self.limits.min_zoom, self.limits.max_zoom);
        self.state.zoom = new_zoom;

        if old_zoom != 0.0 {
            let ratio = new_zoom / old_zoom;
            let anchor_x = x - self.surface.0 / 2.0;
            let anchor_y = y - self.surface.1 / 2.0;
            self.state.pan_x = anchor_x - (anchor_x - self.state.pan_x) * ratio;
            self.state.pan_y = anchor_y - (anchor_y - self.state.pan_y) * ratio;
        }
        trace!(zoom = new_zoom, pan_x = self.state.pan_x, pan_y = self.state.pan_y, "zoom step");
        new_zoom != old_zoom
    }

    /// Set zoom and pan directly; the zoom is clamped to the limits.
    pub fn set_state(&mut self, state: ViewState) {
        self.state = ViewState {
            zoom: state.zoom.clamp(self.limits.min_zoom, self.limits.max_zoom),
            ..state
        };
    }

    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.drag = Some(PanDrag {
            start_x: x,
            start_y: y,
            start_pan_x: self.state.pan_x,
            start_pan_y: self.state.pan_y,
        });
    }

    /// Move the pan by the cumulative delta since [`Self::begin_pan`].
    /// Returns `false` when no drag is in progress.
    pub fn pan_to(&mut self, x: f64, y: f64) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.state.pan_x = drag.start_pan_x + (x - drag.start_x);
        self.state.pan_y = drag.start_pan_y + (y - drag.start_y);
        true
    }

    pub fn end_pan(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }

    pub fn reset(&mut self) {
        self.state = ViewState::default();
        self.drag = None;
    }
}
