//! Scaling of the display image onto the viewing surface.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};
use rayon::prelude::*;

use crate::enums::InteractionMode;
use crate::render::DisplayImage;

/// Scale `image` to `width` x `height`.
///
/// While the user zooms or pans a bilinear pass keeps redraws cheap; once the
/// view settles the image is resampled with a Lanczos filter.
pub fn scale_for_display(
    image: &DisplayImage,
    width: u32,
    height: u32,
    mode: InteractionMode,
) -> DisplayImage {
    let width = width.max(1);
    let height = height.max(1);
    match (image, mode) {
        (DisplayImage::Gray(gray), InteractionMode::Interactive) => {
            DisplayImage::Gray(bilinear(gray, width, height))
        }
        (DisplayImage::Rgb(rgb), InteractionMode::Interactive) => {
            DisplayImage::Rgb(bilinear(rgb, width, height))
        }
        (DisplayImage::Gray(gray), InteractionMode::Settled) => {
            DisplayImage::Gray(imageops::resize(gray, width, height, FilterType::Lanczos3))
        }
        (DisplayImage::Rgb(rgb), InteractionMode::Settled) => {
            DisplayImage::Rgb(imageops::resize(rgb, width, height, FilterType::Lanczos3))
        }
    }
}

#[inline]
fn bilinear_interpolate(v00: f32, v01: f32, v10: f32, v11: f32, dy: f32, dx: f32) -> f32 {
    let one_minus_dx = 1.0 - dx;
    let one_minus_dy = 1.0 - dy;
    let v0 = v00.mul_add(one_minus_dx, v01 * dx);
    let v1 = v10.mul_add(one_minus_dx, v11 * dx);
    v0.mul_add(one_minus_dy, v1 * dy)
}

fn bilinear<P>(
    source: &ImageBuffer<P, Vec<u8>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + Sync,
{
    let (source_width, source_height) = source.dimensions();
    if source_width == 0 || source_height == 0 {
        return ImageBuffer::new(width, height);
    }
    let channels = P::CHANNEL_COUNT as usize;
    let raw = source.as_raw();
    let sample = |x: u32, y: u32, c: usize| -> f32 {
        raw[(y as usize * source_width as usize + x as usize) * channels + c] as f32
    };

    let pixel_data: Vec<u8> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            // pixel centers map onto pixel centers
            let src_y = ((y as f32 + 0.5) / height as f32 * source_height as f32 - 0.5)
                .clamp(0.0, (source_height - 1) as f32);
            let y0 = src_y.floor() as u32;
            let y1 = (y0 + 1).min(source_height - 1);
            let dy = src_y - y0 as f32;

            (0..width).flat_map(move |x| {
                let src_x = ((x as f32 + 0.5) / width as f32 * source_width as f32 - 0.5)
                    .clamp(0.0, (source_width - 1) as f32);
                let x0 = src_x.floor() as u32;
                let x1 = (x0 + 1).min(source_width - 1);
                let dx = src_x - x0 as f32;

                (0..channels).map(move |c| {
                    let value = bilinear_interpolate(
                        sample(x0, y0, c),
                        sample(x1, y0, c),
                        sample(x0, y1, c),
                        sample(x1, y1, c),
                        dy,
                        dx,
                    );
                    value.round().clamp(0.0, 255.0) as u8
                })
            })
        })
        .collect();

    ImageBuffer::from_raw(width, height, pixel_data).unwrap_or_else(|| ImageBuffer::new(width, height))
}
