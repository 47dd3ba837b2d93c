#![allow(dead_code)]

use dicom_viewport::dataset::{DiffusionGroup, RawValue};
use dicom_viewport::enums::TextAttribute;
use dicom_viewport::{MemoryDataset, PixelData, ViewSession};
use ndarray::{Array2, Array3};

/// Single frame whose value at (row, col) is `row * columns + col`.
pub fn ramp(rows: usize, columns: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, columns), |(r, c)| (r * columns + c) as f32)
}

pub fn gray_dataset(frame: Array2<f32>) -> MemoryDataset {
    MemoryDataset::new(PixelData::from_gray(frame, 16))
}

/// `frames` frames of `rows` x `columns`, frame f filled with `f * 100`.
pub fn multi_frame_dataset(frames: usize, rows: usize, columns: usize) -> MemoryDataset {
    let data = Array3::from_shape_fn((frames, rows, columns), |(f, _, _)| f as f32 * 100.0);
    MemoryDataset::new(PixelData::from_gray_frames(data, 16))
}

/// CT-like instance: stored values offset by 1024 with a rescale back to HU.
pub fn ct_dataset(rows: usize, columns: usize) -> MemoryDataset {
    let frame = Array2::from_shape_fn((rows, columns), |(r, c)| 1024.0 + (r * columns + c) as f32);
    gray_dataset(frame)
        .with_rescale(1.0, -1024.0)
        .with_window(40.0, 400.0)
        .with_text(TextAttribute::Modality, "CT")
}

pub fn diffusion_group(b_value: f64, directionality: &str, gradient: [f64; 3]) -> DiffusionGroup {
    DiffusionGroup {
        b_value: Some(RawValue::Numbers(vec![b_value])),
        directionality: Some(RawValue::Text(directionality.to_string())),
        gradient: Some(RawValue::Numbers(gradient.to_vec())),
    }
}

/// Session on a square surface with `dataset` loaded under `key`.
pub fn session_with(key: &str, dataset: MemoryDataset, surface: f64) -> ViewSession {
    let mut session = ViewSession::default();
    session.resize(surface, surface);
    session
        .load(key, Box::new(dataset))
        .expect("should have loaded the dataset");
    session.drain_events();
    session
}
