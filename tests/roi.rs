use approx::assert_relative_eq;
use dicom_viewport::roi::{rasterize_polygon, roi_stats};
use dicom_viewport::{RoiEngine, RoiOutcome};
use ndarray::Array2;

fn draw(roi: &mut RoiEngine, points: &[(u32, u32)]) {
    let mut points = points.iter().copied();
    roi.begin(points.next());
    for point in points {
        roi.extend(Some(point));
    }
}

// ----------------------------------------------------------------------------
// Degenerate input
// ----------------------------------------------------------------------------

#[test]
fn two_points_never_produce_a_mask() {
    let scalar = Array2::from_elem((10, 10), 1.0f32);
    let mut roi = RoiEngine::new();
    draw(&mut roi, &[(1, 1), (8, 8)]);
    assert_eq!(roi.finish(scalar.view()), RoiOutcome::Discarded);
    assert!(roi.mask().is_none());
    assert!(roi.stats().is_none());
    assert!(roi.points().is_empty());
}

#[test]
fn repeated_points_do_not_count_towards_the_minimum() {
    let scalar = Array2::from_elem((10, 10), 1.0f32);
    let mut roi = RoiEngine::new();
    draw(&mut roi, &[(1, 1), (1, 1), (4, 4), (4, 4)]);
    assert_eq!(roi.points().len(), 2);
    assert_eq!(roi.finish(scalar.view()), RoiOutcome::Discarded);
}

// ----------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------

#[test]
fn constant_square_region_has_zero_spread() {
    let mut scalar = Array2::from_elem((20, 20), 0.0f32);
    scalar.slice_mut(ndarray::s![5..15, 5..15]).fill(50.0);

    let mut roi = RoiEngine::new();
    draw(&mut roi, &[(5, 5), (14, 5), (14, 14), (5, 14)]);
    let RoiOutcome::Measured(stats) = roi.finish(scalar.view()) else {
        panic!("expected a measurement");
    };

    assert_eq!(stats.n, 100);
    assert_relative_eq!(stats.mean, 50.0);
    assert_relative_eq!(stats.std, 0.0);
    assert_relative_eq!(stats.median, 50.0);
    assert_relative_eq!(stats.iqr, 0.0);
    assert_eq!(roi.mask().map(|m| m.iter().filter(|v| **v).count()), Some(100));
}

#[test]
fn statistics_use_population_deviation_and_interpolated_quartiles() {
    let scalar = Array2::from_shape_vec((1, 4), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    let mask = Array2::from_elem((1, 4), true);
    let stats = roi_stats(scalar.view(), &mask).unwrap();
    assert_relative_eq!(stats.mean, 2.5);
    assert_relative_eq!(stats.std, 1.25f64.sqrt());
    assert_relative_eq!(stats.median, 2.5);
    // p25 = 1.75, p75 = 3.25
    assert_relative_eq!(stats.iqr, 1.5);
}

#[test]
fn polygon_partly_outside_the_frame_is_clipped() {
    let mask = rasterize_polygon(&[(2, 2), (50, 2), (50, 50), (2, 50)], 6, 6);
    let inside = mask.iter().filter(|v| **v).count();
    assert_eq!(inside, 16);
    assert!(mask[[5, 5]]);
    assert!(!mask[[1, 5]]);
}

#[test]
fn concave_polygon_excludes_its_notch() {
    // U shape opening upwards
    let points = [(0, 0), (2, 0), (2, 4), (4, 4), (4, 0), (6, 0), (6, 6), (0, 6)];
    let mask = rasterize_polygon(&points, 8, 8);
    assert!(mask[[1, 1]]);
    assert!(mask[[1, 5]]);
    assert!(!mask[[1, 3]]);
    assert!(mask[[5, 3]]);
    assert!(!mask[[7, 3]]);
}
