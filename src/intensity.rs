//! Grayscale intensity transform: modality LUT, windowing, photometric
//! inversion and 8-bit quantization, always in that order.

use image::GrayImage;
use ndarray::{Array2, ArrayView2, Zip};
use tracing::{debug, warn};

use crate::dataset::{Lookup, Unavailable};
use crate::enums::PhotometricInterpretation;
use crate::stats::{finite_min_max, percentile, sorted_finite};

/// Stored value to modality value transform.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalityLut {
    Rescale { slope: f64, intercept: f64 },
    /// Stored lookup table; inputs below `first_mapped` or past the end of
    /// `entries` clamp to the first or last entry. An empty table leaves
    /// values unchanged.
    Table { first_mapped: f64, entries: Vec<f64> },
}

impl ModalityLut {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModalityLut::Rescale { slope, intercept } => {
                if !slope.is_finite() || !intercept.is_finite() {
                    return Err(format!("non-finite rescale {slope} / {intercept}"));
                }
            }
            ModalityLut::Table {
                first_mapped,
                entries,
            } => {
                if entries.is_empty() {
                    return Err("empty LUT data".to_string());
                }
                if !first_mapped.is_finite() {
                    return Err("non-finite first mapped value".to_string());
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            ModalityLut::Rescale { slope, intercept } => {
                (value as f64).mul_add(*slope, *intercept) as f32
            }
            ModalityLut::Table {
                first_mapped,
                entries,
            } => {
                let Some(last) = entries.len().checked_sub(1) else {
                    return value;
                };
                let last = last as f64;
                let index = (value as f64 - first_mapped).trunc().clamp(0.0, last);
                entries[index as usize] as f32
            }
        }
    }
}

/// Intensity window: values in `center ± width / 2` span the display range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

impl WindowLevel {
    pub const MIN_WIDTH: f64 = 1.0;

    /// Non-positive or non-finite widths are replaced with [`Self::MIN_WIDTH`].
    pub fn new(center: f64, width: f64) -> Self {
        let width = if width.is_finite() && width > 0.0 {
            width
        } else {
            Self::MIN_WIDTH
        };
        Self { center, width }
    }

    pub fn lower(&self) -> f64 {
        self.center - self.width / 2.0
    }

    pub fn upper(&self) -> f64 {
        self.center + self.width / 2.0
    }

    /// Map a modality value onto [0, 255], clipping outside the window.
    #[inline]
    pub fn map(&self, value: f64) -> f64 {
        ((value - self.lower()) / self.width * 255.0).clamp(0.0, 255.0)
    }
}

/// Caller-supplied window; unset components fall back to declared values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowRequest {
    pub center: Option<f64>,
    pub width: Option<f64>,
}

impl From<WindowLevel> for WindowRequest {
    fn from(window: WindowLevel) -> Self {
        Self {
            center: Some(window.center),
            width: Some(window.width),
        }
    }
}

/// Result of the grayscale path.
#[derive(Debug, Clone)]
pub struct GrayRender {
    pub image: GrayImage,
    /// Modality-LUT values, or raw values when no LUT applied.
    pub scalar: Array2<f32>,
    /// Window used, `None` when min-max normalization was used instead.
    pub window: Option<WindowLevel>,
    pub lut_applied: bool,
}

/// Apply the modality LUT to a frame. A missing or malformed LUT leaves the
/// raw values in place.
pub fn modality_values(frame: ArrayView2<'_, f32>, lut: &Lookup<ModalityLut>) -> (Array2<f32>, bool) {
    match lut {
        Lookup::Value(lut) => match lut.validate() {
            Ok(()) => (frame.mapv(|v| lut.apply(v)), true),
            Err(reason) => {
                warn!(%reason, "ignoring invalid modality LUT");
                (frame.to_owned(), false)
            }
        },
        Lookup::Unavailable(Unavailable::Malformed(reason)) => {
            warn!(%reason, "ignoring malformed modality LUT");
            (frame.to_owned(), false)
        }
        Lookup::Unavailable(Unavailable::Absent) => (frame.to_owned(), false),
    }
}

/// Window covering the 1st to 99th percentile of the finite values.
pub fn derive_default_window(values: ArrayView2<'_, f32>) -> Option<WindowLevel> {
    let sorted = sorted_finite(values.iter().map(|v| *v as f64));
    let low = percentile(&sorted, 1.0)?;
    let mut high = percentile(&sorted, 99.0)?;
    if high <= low {
        high = low + 1.0;
    }
    let window = WindowLevel::new((low + high) / 2.0, (high - low).max(WindowLevel::MIN_WIDTH));
    debug!(center = window.center, width = window.width, "derived default window");
    Some(window)
}

/// Resolve the effective window. Requested components win over declared
/// ones; with nothing requested or declared the window is derived from
/// `values`. `None` means no usable window (min-max normalization).
pub fn resolve_window(
    request: WindowRequest,
    declared_center: &Lookup<f64>,
    declared_width: &Lookup<f64>,
    values: ArrayView2<'_, f32>,
) -> Option<WindowLevel> {
    let center = request.center.or_else(|| declared_center.value().copied());
    let width = request.width.or_else(|| declared_width.value().copied());
    match (center, width) {
        (None, None) => derive_default_window(values),
        (Some(center), Some(width)) if center.is_finite() && width.is_finite() && width > 0.0 => {
            Some(WindowLevel { center, width })
        }
        _ => None,
    }
}

/// Map values onto [0, 255], through `window` when given, otherwise by the
/// frame's own min-max range.
pub fn to_display_range(values: ArrayView2<'_, f32>, window: Option<WindowLevel>) -> Array2<f32> {
    match window {
        Some(window) => Zip::from(values).par_map_collect(|&v| window.map(v as f64) as f32),
        None => {
            let (min, max) = finite_min_max(values.iter().map(|v| *v as f64)).unwrap_or((0.0, 1.0));
            let max = if max <= min { min + 1.0 } else { max };
            let range = max - min;
            Zip::from(values).par_map_collect(|&v| ((v as f64 - min) / range * 255.0) as f32)
        }
    }
}

#[inline]
pub fn invert(value: f32) -> f32 {
    255.0 - value
}

#[inline]
fn quantize(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Quantize display-range values into an 8-bit raster.
pub fn quantize_gray(values: &Array2<f32>) -> GrayImage {
    let (height, width) = values.dim();
    let pixels: Vec<u8> = values.iter().map(|v| quantize(*v)).collect();
    GrayImage::from_raw(width as u32, height as u32, pixels)
        .unwrap_or_else(|| GrayImage::new(width as u32, height as u32))
}

/// Run the full grayscale path on one frame.
pub fn render_gray(
    frame: ArrayView2<'_, f32>,
    photometric: &PhotometricInterpretation,
    lut: &Lookup<ModalityLut>,
    request: WindowRequest,
    declared_center: &Lookup<f64>,
    declared_width: &Lookup<f64>,
) -> GrayRender {
    let (scalar, lut_applied) = modality_values(frame, lut);
    let window = resolve_window(request, declared_center, declared_width, scalar.view());

    let mut display = to_display_range(scalar.view(), window);
    if photometric.is_inverted() {
        display.mapv_inplace(invert);
    }

    GrayRender {
        image: quantize_gray(&display),
        scalar,
        window,
        lut_applied,
    }
}
