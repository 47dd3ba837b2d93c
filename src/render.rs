//! Frame selection and the render entry point shared by the session and the
//! command line.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

use crate::color::{luminance, normalize_color};
use crate::dataset::Dataset;
use crate::frame::{FrameView, PixelData, ScalarFrame};
use crate::intensity::{WindowLevel, WindowRequest, render_gray};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No pixel data to render")]
    NoPixelData,

    #[error("Failed to decode pixel data: {0}")]
    Decode(String),

    #[error("Frame has no pixels")]
    EmptyFrame,
}

/// 8-bit raster handed to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

/// Value of one display pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayValue {
    Gray(u8),
    Rgb([u8; 3]),
}

impl DisplayImage {
    pub fn width(&self) -> u32 {
        match self {
            DisplayImage::Gray(image) => image.width(),
            DisplayImage::Rgb(image) => image.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            DisplayImage::Gray(image) => image.height(),
            DisplayImage::Rgb(image) => image.height(),
        }
    }

    pub fn pixel(&self, i: u32, j: u32) -> Option<DisplayValue> {
        if i >= self.width() || j >= self.height() {
            return None;
        }
        Some(match self {
            DisplayImage::Gray(image) => DisplayValue::Gray(image.get_pixel(i, j).0[0]),
            DisplayImage::Rgb(image) => {
                let Rgb(rgb) = *image.get_pixel(i, j);
                DisplayValue::Rgb(rgb)
            }
        })
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            DisplayImage::Gray(image) => DynamicImage::ImageLuma8(image.clone()),
            DisplayImage::Rgb(image) => DynamicImage::ImageRgb8(image.clone()),
        }
    }
}

/// Everything produced by one render of one frame.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub display: DisplayImage,
    pub scalar: ScalarFrame,
    /// Window actually applied; `None` for min-max normalization and color.
    pub window: Option<WindowLevel>,
    /// Whether `scalar` holds modality values rather than stored samples.
    pub lut_applied: bool,
    /// Frame index actually rendered after out-of-range fallback.
    pub frame_index: usize,
}

impl RenderedFrame {
    pub fn is_color(&self) -> bool {
        matches!(self.display, DisplayImage::Rgb(_))
    }
}

/// Render `frame_index` of already decoded `pixels` with the attributes of
/// `dataset`. An out-of-range index renders the first frame.
pub fn render_frame<D>(
    dataset: &D,
    pixels: &PixelData,
    frame_index: usize,
    request: WindowRequest,
) -> Result<RenderedFrame, RenderError>
where
    D: Dataset + ?Sized,
{
    let frame = pixels.frame(frame_index).ok_or(RenderError::EmptyFrame)?;
    let frame_index = if frame_index < pixels.number_of_frames() {
        frame_index
    } else {
        0
    };
    let photometric = dataset
        .photometric_interpretation()
        .into_value()
        .unwrap_or_default();

    let rendered = match frame {
        FrameView::Gray(view) => {
            let gray = render_gray(
                view,
                &photometric,
                &dataset.modality_lut(),
                request,
                &dataset.window_center(),
                &dataset.window_width(),
            );
            RenderedFrame {
                display: DisplayImage::Gray(gray.image),
                scalar: gray.scalar,
                window: gray.window,
                lut_applied: gray.lut_applied,
                frame_index,
            }
        }
        FrameView::Color(view) => {
            let color = normalize_color(view, &photometric, pixels.bits_allocated());
            RenderedFrame {
                scalar: luminance(color.rgb.view()),
                display: DisplayImage::Rgb(color.image),
                window: None,
                lut_applied: false,
                frame_index,
            }
        }
    };
    debug!(
        frame = rendered.frame_index,
        color = rendered.is_color(),
        center = rendered.window.map(|w| w.center),
        width = rendered.window.map(|w| w.width),
        "rendered frame"
    );
    Ok(rendered)
}

/// Decode `dataset` and render one frame of it.
pub fn decode_and_render<D>(
    dataset: &D,
    frame_index: usize,
    request: WindowRequest,
) -> Result<RenderedFrame, RenderError>
where
    D: Dataset + ?Sized,
{
    let pixels = dataset
        .decode_pixels()
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    if pixels.number_of_frames() == 0 {
        return Err(RenderError::NoPixelData);
    }
    render_frame(dataset, &pixels, frame_index, request)
}
