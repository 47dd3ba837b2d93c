//! Freehand region of interest: capture, rasterization and statistics.
//!
//! Points are image pixel coordinates `(i, j)` = (column, row). The polygon
//! is implicitly closed. Rasterization uses the even-odd rule on pixel
//! centers and then marks every pixel on the outline, so boundary pixels
//! always count as inside.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2, Zip};
use tracing::debug;

use crate::stats::{mean_and_std, percentile, sorted_finite};

/// Minimum number of vertices for a region to be measured.
pub const MIN_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiStats {
    /// Count of finite values inside the region.
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
    pub iqr: f64,
}

/// Mask and statistics of a finalized region; they only exist together.
#[derive(Debug, Clone)]
pub struct RoiMeasurement {
    pub mask: Array2<bool>,
    pub stats: RoiStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Drawing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoiOutcome {
    Measured(RoiStats),
    /// Polygon kept but no finite value fell inside it.
    NoMeasurement,
    /// Fewer than [`MIN_POINTS`] vertices.
    Discarded,
    NotDrawing,
}

#[derive(Debug, Clone, Default)]
pub struct RoiEngine {
    phase: Phase,
    points: Vec<(u32, u32)>,
    measurement: Option<RoiMeasurement>,
}

impl RoiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == Phase::Drawing
    }

    pub fn points(&self) -> &[(u32, u32)] {
        &self.points
    }

    pub fn measurement(&self) -> Option<&RoiMeasurement> {
        self.measurement.as_ref()
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.measurement.as_ref().map(|m| &m.mask)
    }

    pub fn stats(&self) -> Option<RoiStats> {
        self.measurement.as_ref().map(|m| m.stats)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.measurement.is_none()
    }

    /// Start drawing at `point`. A point outside the image keeps the engine idle.
    pub fn begin(&mut self, point: Option<(u32, u32)>) -> bool {
        let Some(point) = point else {
            return false;
        };
        self.phase = Phase::Drawing;
        self.points.clear();
        self.points.push(point);
        self.measurement = None;
        true
    }

    /// Append `point` while drawing, skipping misses and repeats of the last
    /// vertex. Returns whether a vertex was added.
    pub fn extend(&mut self, point: Option<(u32, u32)>) -> bool {
        if self.phase != Phase::Drawing {
            return false;
        }
        let Some(point) = point else {
            return false;
        };
        if self.points.last() == Some(&point) {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Finish drawing and measure against `scalar` (rows, columns).
    pub fn finish(&mut self, scalar: ArrayView2<'_, f32>) -> RoiOutcome {
        if self.phase != Phase::Drawing {
            return RoiOutcome::NotDrawing;
        }
        self.phase = Phase::Idle;

        if self.points.len() < MIN_POINTS {
            debug!(points = self.points.len(), "discarding ROI with too few points");
            self.points.clear();
            self.measurement = None;
            return RoiOutcome::Discarded;
        }

        let (rows, columns) = scalar.dim();
        let mask = rasterize_polygon(&self.points, rows, columns);
        match roi_stats(scalar, &mask) {
            Some(stats) => {
                debug!(n = stats.n, mean = stats.mean, "ROI measured");
                self.measurement = Some(RoiMeasurement { mask, stats });
                RoiOutcome::Measured(stats)
            }
            None => {
                self.measurement = None;
                RoiOutcome::NoMeasurement
            }
        }
    }

    /// Abort an in-progress drawing. Returns whether anything was discarded.
    pub fn cancel(&mut self) -> bool {
        if self.phase != Phase::Drawing {
            return false;
        }
        self.phase = Phase::Idle;
        self.points.clear();
        self.measurement = None;
        true
    }

    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.points.clear();
        self.measurement = None;
    }
}

/// Fill the closed polygon through `points` into a (rows, columns) mask.
pub fn rasterize_polygon(points: &[(u32, u32)], rows: usize, columns: usize) -> Array2<bool> {
    let mut mask = Array2::from_elem((rows, columns), false);
    if points.len() < MIN_POINTS || rows == 0 || columns == 0 {
        return mask;
    }

    let vertices: Vec<(f64, f64)> = points.iter().map(|&(i, j)| (i as f64, j as f64)).collect();
    let min_y = points.iter().map(|p| p.1).min().unwrap_or(0) as usize;
    let max_y = (points.iter().map(|p| p.1).max().unwrap_or(0) as usize).min(rows - 1);
    let last_column = (columns - 1) as f64;

    let mut crossings: Vec<f64> = Vec::with_capacity(vertices.len());
    for row in min_y..=max_y {
        let y = row as f64;
        crossings.clear();
        for (k, &(x0, y0)) in vertices.iter().enumerate() {
            let (x1, y1) = vertices[(k + 1) % vertices.len()];
            if y0 == y1 {
                continue;
            }
            if y >= y0.min(y1) && y < y0.max(y1) {
                crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        for pair in crossings.chunks_exact(2) {
            let start = pair[0].ceil().max(0.0);
            let end = pair[1].floor().min(last_column);
            if start > end {
                continue;
            }
            for col in start as usize..=end as usize {
                mask[[row, col]] = true;
            }
        }
    }

    for (k, &from) in points.iter().enumerate() {
        let to = points[(k + 1) % points.len()];
        draw_segment(&mut mask, from, to);
    }
    mask
}

/// Bresenham line between two pixels, endpoints included.
fn draw_segment(mask: &mut Array2<bool>, from: (u32, u32), to: (u32, u32)) {
    let (rows, columns) = mask.dim();
    let (mut x, mut y) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = if x < x1 { 1 } else { -1 };
    let step_y = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x >= 0 && y >= 0 && (x as usize) < columns && (y as usize) < rows {
            mask[[y as usize, x as usize]] = true;
        }
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

/// Statistics of the finite `scalar` values selected by `mask`.
pub fn roi_stats(scalar: ArrayView2<'_, f32>, mask: &Array2<bool>) -> Option<RoiStats> {
    if scalar.dim() != mask.dim() {
        return None;
    }
    let mut selected = Vec::new();
    Zip::from(&scalar).and(mask).for_each(|value, inside| {
        if *inside {
            selected.push(*value as f64);
        }
    });
    let values = sorted_finite(selected);
    let (mean, std) = mean_and_std(&values)?;
    let q1 = percentile(&values, 25.0)?;
    let median = percentile(&values, 50.0)?;
    let q3 = percentile(&values, 75.0)?;
    Some(RoiStats {
        n: values.len(),
        mean,
        std,
        median,
        iqr: q3 - q1,
    })
}
