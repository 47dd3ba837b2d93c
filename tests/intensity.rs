mod common;

use approx::assert_relative_eq;
use dicom_viewport::enums::PhotometricInterpretation;
use dicom_viewport::intensity::{
    WindowLevel, WindowRequest, derive_default_window, invert, render_gray,
};
use dicom_viewport::render::{DisplayImage, render_frame};
use dicom_viewport::{Dataset, Lookup};
use ndarray::Array2;

fn render_ramp(photometric: PhotometricInterpretation, window: WindowLevel) -> Vec<u8> {
    let frame = Array2::from_shape_fn((1, 900), |(_, c)| c as f32 - 300.0);
    render_gray(
        frame.view(),
        &photometric,
        &Lookup::absent(),
        window.into(),
        &Lookup::absent(),
        &Lookup::absent(),
    )
    .image
    .into_raw()
}

// ----------------------------------------------------------------------------
// Windowing
// ----------------------------------------------------------------------------

#[test]
fn windowing_is_monotonic_for_monochrome2() {
    for window in [WindowLevel::new(40.0, 400.0), WindowLevel::new(250.0, 3.0)] {
        let pixels = render_ramp(PhotometricInterpretation::Monochrome2, window);
        assert!(pixels.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(pixels.first(), Some(&0));
        assert_eq!(pixels.last(), Some(&255));
    }
}

#[test]
fn windowing_is_reversed_for_monochrome1() {
    let pixels = render_ramp(PhotometricInterpretation::Monochrome1, WindowLevel::new(40.0, 400.0));
    assert!(pixels.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(pixels.first(), Some(&255));
}

/// Pixel spread over the ramp samples whose values lie inside `window`.
fn spread_inside(window: WindowLevel, pixels: &[u8]) -> u8 {
    let inside: Vec<u8> = pixels
        .iter()
        .enumerate()
        .filter(|(c, _)| {
            let value = *c as f64 - 300.0;
            value >= window.lower() && value <= window.upper()
        })
        .map(|(_, p)| *p)
        .collect();
    let min = inside.iter().min().copied().unwrap_or(0);
    let max = inside.iter().max().copied().unwrap_or(0);
    max - min
}

#[test]
fn wider_windows_never_increase_contrast() {
    let widths = [4.0, 10.0, 40.0, 400.0];
    for center in [-150.0, 0.0, 40.0, 250.0] {
        for (k, &narrow) in widths.iter().enumerate() {
            let narrow = WindowLevel::new(center, narrow);
            let narrow_pixels = render_ramp(PhotometricInterpretation::Monochrome2, narrow);
            let narrow_spread = spread_inside(narrow, &narrow_pixels);
            for &wide in &widths[k + 1..] {
                let wide_pixels =
                    render_ramp(PhotometricInterpretation::Monochrome2, WindowLevel::new(center, wide));
                let wide_spread = spread_inside(narrow, &wide_pixels);
                assert!(
                    wide_spread <= narrow_spread,
                    "center {center}: width {wide} spread {wide_spread} > width {} spread {narrow_spread}",
                    narrow.width
                );
            }
        }
    }
}

#[test]
fn lowering_the_center_never_darkens_a_pixel() {
    let centers = [300.0, 40.0, 0.0, -0.5, -200.0];
    for width in [-3.0, 1.0, 7.0, 100.0, 400.0, 2000.0] {
        for pair in centers.windows(2) {
            let higher = render_ramp(PhotometricInterpretation::Monochrome2, WindowLevel::new(pair[0], width));
            let lower = render_ramp(PhotometricInterpretation::Monochrome2, WindowLevel::new(pair[1], width));
            assert!(
                higher.iter().zip(&lower).all(|(h, l)| l >= h),
                "width {width}: center {} darker than center {}",
                pair[1],
                pair[0]
            );
        }
    }
}

#[test]
fn non_positive_widths_render_like_the_minimum_width() {
    let minimum = render_ramp(PhotometricInterpretation::Monochrome2, WindowLevel::new(40.0, 1.0));
    for width in [0.0, -5.0, f64::NAN] {
        assert_eq!(
            render_ramp(PhotometricInterpretation::Monochrome2, WindowLevel::new(40.0, width)),
            minimum
        );
    }
}

#[test]
fn inversion_is_an_involution() {
    for value in 0..=255u8 {
        let value = value as f32;
        assert_eq!(invert(invert(value)), value);
    }
}

// ----------------------------------------------------------------------------
// Default window derivation
// ----------------------------------------------------------------------------

#[test]
fn default_window_of_uniform_range_spans_inner_percentiles() {
    let values = Array2::from_shape_fn((1, 1001), |(_, c)| c as f32);
    let window = derive_default_window(values.view()).unwrap();
    assert_relative_eq!(window.center, 500.0, epsilon = 1e-9);
    assert_relative_eq!(window.width, 980.0, epsilon = 1e-9);
}

#[test]
fn default_window_of_constant_frame_has_minimum_width() {
    let values = Array2::from_elem((3, 3), 12.0f32);
    let window = derive_default_window(values.view()).unwrap();
    assert_relative_eq!(window.center, 12.5);
    assert_relative_eq!(window.width, 1.0);
}

#[test]
fn non_finite_frame_has_no_default_window() {
    let values = Array2::from_elem((2, 2), f32::NAN);
    assert!(derive_default_window(values.view()).is_none());
}

// ----------------------------------------------------------------------------
// Full render path
// ----------------------------------------------------------------------------

#[test]
fn ct_values_are_windowed_in_hounsfield_units() {
    let dataset = common::ct_dataset(4, 4);
    let pixels = dataset.decode_pixels().unwrap();
    let rendered = render_frame(&dataset, &pixels, 0, WindowRequest::default()).unwrap();

    assert!(rendered.lut_applied);
    assert_eq!(rendered.window, Some(WindowLevel::new(40.0, 400.0)));
    assert_eq!(rendered.scalar[[0, 0]], 0.0);
    assert_eq!(rendered.scalar[[3, 3]], 15.0);

    // 0 HU sits 160 HU above the lower window edge: 160 / 400 * 255
    let DisplayImage::Gray(image) = &rendered.display else {
        panic!("expected a grayscale image");
    };
    assert_eq!(image.get_pixel(0, 0).0[0], 102);
}

#[test]
fn rendering_twice_gives_identical_output() {
    let dataset = common::gray_dataset(common::ramp(8, 8));
    let pixels = dataset.decode_pixels().unwrap();
    let first = render_frame(&dataset, &pixels, 0, WindowRequest::default()).unwrap();
    let second = render_frame(&dataset, &pixels, 0, WindowRequest::default()).unwrap();
    assert_eq!(first.display, second.display);
    assert_eq!(first.scalar, second.scalar);
}
