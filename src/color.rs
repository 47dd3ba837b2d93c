//! Color normalizer for three-sample frames.

use image::RgbImage;
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};
use thiserror::Error;
use tracing::warn;

use crate::enums::PhotometricInterpretation;
use crate::stats::finite_min_max;

#[derive(Debug, Error, PartialEq)]
pub enum ColorError {
    #[error("Unsupported color space conversion from {0} to RGB")]
    Unsupported(String),
}

/// Result of the color path.
#[derive(Debug, Clone)]
pub struct ColorRender {
    pub image: RgbImage,
    /// RGB samples before 8-bit normalization.
    pub rgb: Array3<f32>,
}

/// Convert full-range luma/chroma samples to RGB (BT.601). Chroma is centered
/// on `2^(bits - 1)` and results are clamped to the sample range. `frame` is
/// (rows, columns, 3).
pub fn ybr_to_rgb(
    frame: ArrayView3<'_, f32>,
    photometric: &PhotometricInterpretation,
    bits_allocated: u16,
) -> Result<Array3<f32>, ColorError> {
    if !matches!(
        photometric,
        PhotometricInterpretation::YbrFull | PhotometricInterpretation::YbrFull422
    ) {
        return Err(ColorError::Unsupported(photometric.as_str().to_string()));
    }

    let bits = bits_allocated.clamp(1, 16) as i32;
    let offset = 2f32.powi(bits - 1);
    let max = 2f32.powi(bits) - 1.0;

    let mut rgb = Array3::<f32>::zeros(frame.dim());
    Zip::from(rgb.lanes_mut(Axis(2)))
        .and(frame.lanes(Axis(2)))
        .for_each(|mut out, ybr| {
            let y = ybr[0];
            let cb = ybr[1] - offset;
            let cr = ybr[2] - offset;
            out[0] = (y + 1.402 * cr).round().clamp(0.0, max);
            out[1] = (y - 0.344136 * cb - 0.714136 * cr).round().clamp(0.0, max);
            out[2] = (y + 1.772 * cb).round().clamp(0.0, max);
        });
    Ok(rgb)
}

/// Rec. 709 luminance of an RGB frame.
pub fn luminance(rgb: ArrayView3<'_, f32>) -> Array2<f32> {
    let (rows, columns, _) = rgb.dim();
    Array2::from_shape_fn((rows, columns), |(row, col)| {
        0.2126 * rgb[[row, col, 0]] + 0.7152 * rgb[[row, col, 1]] + 0.0722 * rgb[[row, col, 2]]
    })
}

/// Convert and quantize a color frame for display.
pub fn normalize_color(
    frame: ArrayView3<'_, f32>,
    photometric: &PhotometricInterpretation,
    bits_allocated: u16,
) -> ColorRender {
    let rgb = if photometric.is_ybr() {
        match ybr_to_rgb(frame, photometric, bits_allocated) {
            Ok(rgb) => rgb,
            Err(err) => {
                warn!(%err, "color conversion failed, using stored samples");
                frame.to_owned()
            }
        }
    } else {
        frame.to_owned()
    };

    let display = if bits_allocated <= 8 {
        rgb.clone()
    } else {
        let (min, max) = finite_min_max(rgb.iter().map(|v| *v as f64)).unwrap_or((0.0, 1.0));
        let max = if max <= min { min + 1.0 } else { max };
        let range = max - min;
        rgb.mapv(|v| ((v as f64 - min) / range * 255.0) as f32)
    };

    let (rows, columns, _) = display.dim();
    let pixels: Vec<u8> = display
        .iter()
        .map(|v| v.clamp(0.0, 255.0) as u8)
        .collect();
    let image = RgbImage::from_raw(columns as u32, rows as u32, pixels)
        .unwrap_or_else(|| RgbImage::new(columns as u32, rows as u32));

    ColorRender { image, rgb }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pixel(values: [f32; 3]) -> Array3<f32> {
        Array3::from_shape_vec((1, 1, 3), values.to_vec()).unwrap()
    }

    #[test]
    fn neutral_chroma_gives_gray() {
        let rgb = ybr_to_rgb(pixel([100.0, 128.0, 128.0]).view(), &PhotometricInterpretation::YbrFull, 8)
            .unwrap();
        assert_eq!(rgb.as_slice().unwrap(), &[100.0, 100.0, 100.0]);
    }

    #[test]
    fn partial_range_is_reported_unsupported() {
        let result = ybr_to_rgb(
            pixel([100.0, 128.0, 128.0]).view(),
            &PhotometricInterpretation::YbrPartial420,
            8,
        );
        assert!(matches!(result, Err(ColorError::Unsupported(_))));
    }

    #[test]
    fn failed_conversion_keeps_stored_samples() {
        let render = normalize_color(
            pixel([10.0, 20.0, 30.0]).view(),
            &PhotometricInterpretation::YbrIct,
            8,
        );
        assert_eq!(render.image.as_raw(), &vec![10u8, 20, 30]);
    }

    #[test]
    fn wide_samples_are_stretched_to_eight_bits() {
        let frame = Array3::from_shape_vec((1, 2, 3), vec![0.0, 500.0, 1000.0, 1000.0, 0.0, 250.0])
            .unwrap();
        let render = normalize_color(frame.view(), &PhotometricInterpretation::Rgb, 16);
        assert_eq!(render.image.as_raw(), &vec![0u8, 127, 255, 255, 0, 63]);
    }

    #[test]
    fn luminance_weights_sum_to_one() {
        let lum = luminance(pixel([200.0, 200.0, 200.0]).view());
        assert_relative_eq!(lum[[0, 0]], 200.0, epsilon = 1e-3);
    }
}
