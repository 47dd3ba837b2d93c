//! The dataset collaborator consumed by the rendering pipeline.
//!
//! A [`Dataset`] exposes typed attribute lookup and a decoded pixel buffer.
//! Optional attributes come back as [`Lookup`] values so callers can tell a
//! legitimately absent attribute from a malformed one.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::enums::{GroupScope, PhotometricInterpretation, TextAttribute};
use crate::frame::PixelData;
use crate::intensity::ModalityLut;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Failed to decode pixel data: {0}")]
    Decode(String),

    #[error("No pixel data")]
    MissingPixelData,

    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
}

/// Why an optional attribute could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    Absent,
    Malformed(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::Absent => f.write_str("absent"),
            Unavailable::Malformed(reason) => write!(f, "malformed: {reason}"),
        }
    }
}

/// Result of an optional metadata lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Value(T),
    Unavailable(Unavailable),
}

impl<T> Lookup<T> {
    pub fn absent() -> Self {
        Lookup::Unavailable(Unavailable::Absent)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Lookup::Unavailable(Unavailable::Malformed(reason.into()))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Lookup::Value(value) => Some(value),
            Lookup::Unavailable(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Lookup::Value(value) => Some(value),
            Lookup::Unavailable(_) => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Lookup::Value(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Lookup::Unavailable(Unavailable::Malformed(_)))
    }

    pub fn reason(&self) -> Option<&Unavailable> {
        match self {
            Lookup::Value(_) => None,
            Lookup::Unavailable(reason) => Some(reason),
        }
    }

    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Value(value) => Lookup::Value(value),
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Value(value) => Lookup::Value(f(value)),
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Lookup::Value(value) => f(value),
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }

    /// Use `fallback` when this lookup has no value. A malformed reason is
    /// kept if the fallback turns out to be merely absent.
    pub fn or_else(self, fallback: impl FnOnce() -> Lookup<T>) -> Lookup<T> {
        match self {
            Lookup::Value(value) => Lookup::Value(value),
            Lookup::Unavailable(Unavailable::Absent) => fallback(),
            Lookup::Unavailable(Unavailable::Malformed(reason)) => match fallback() {
                Lookup::Value(value) => Lookup::Value(value),
                Lookup::Unavailable(Unavailable::Absent) => {
                    Lookup::Unavailable(Unavailable::Malformed(reason))
                }
                other => other,
            },
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Value(value),
            None => Lookup::absent(),
        }
    }
}

/// An attribute value as the collaborator found it, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Numbers(Vec<f64>),
    Text(String),
    /// Present but not readable as numbers or text.
    Invalid(String),
}

/// Diffusion attributes of one MR diffusion item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffusionGroup {
    pub b_value: Option<RawValue>,
    pub directionality: Option<RawValue>,
    pub gradient: Option<RawValue>,
}

pub trait Dataset {
    /// Decode all frames of the instance.
    fn decode_pixels(&self) -> Result<PixelData, DatasetError>;

    fn rows(&self) -> Lookup<u32>;

    fn columns(&self) -> Lookup<u32>;

    fn samples_per_pixel(&self) -> Lookup<u16>;

    fn number_of_frames(&self) -> Lookup<u32>;

    fn photometric_interpretation(&self) -> Lookup<PhotometricInterpretation>;

    fn modality_lut(&self) -> Lookup<ModalityLut>;

    /// First declared window center.
    fn window_center(&self) -> Lookup<f64>;

    /// First declared window width.
    fn window_width(&self) -> Lookup<f64>;

    fn text(&self, attribute: TextAttribute) -> Lookup<String>;

    /// The MR diffusion item of a functional group, if there is one.
    fn diffusion_group(&self, scope: GroupScope) -> Option<DiffusionGroup>;

    /// Declared frame count, at least 1.
    fn frame_count(&self) -> usize {
        self.number_of_frames()
            .into_value()
            .map_or(1, |frames| frames.max(1) as usize)
    }

    fn is_color(&self) -> bool {
        self.samples_per_pixel().into_value() == Some(3)
    }
}

/// A dataset held entirely in memory.
///
/// Useful for synthetic data and for sources that decode pixels by other
/// means than the DICOM reader.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    pixels: Result<PixelData, String>,
    number_of_frames: Option<u32>,
    photometric: Lookup<PhotometricInterpretation>,
    modality_lut: Lookup<ModalityLut>,
    window_center: Lookup<f64>,
    window_width: Lookup<f64>,
    text: HashMap<TextAttribute, String>,
    per_frame_diffusion: HashMap<usize, DiffusionGroup>,
    shared_diffusion: Option<DiffusionGroup>,
}

impl MemoryDataset {
    pub fn new(pixels: PixelData) -> Self {
        let photometric = if pixels.is_color() {
            PhotometricInterpretation::Rgb
        } else {
            PhotometricInterpretation::Monochrome2
        };
        Self {
            number_of_frames: Some(pixels.number_of_frames() as u32),
            pixels: Ok(pixels),
            photometric: Lookup::Value(photometric),
            modality_lut: Lookup::absent(),
            window_center: Lookup::absent(),
            window_width: Lookup::absent(),
            text: HashMap::new(),
            per_frame_diffusion: HashMap::new(),
            shared_diffusion: None,
        }
    }

    /// A dataset whose pixel data cannot be decoded.
    pub fn undecodable(reason: impl Into<String>) -> Self {
        Self {
            pixels: Err(reason.into()),
            number_of_frames: None,
            photometric: Lookup::absent(),
            modality_lut: Lookup::absent(),
            window_center: Lookup::absent(),
            window_width: Lookup::absent(),
            text: HashMap::new(),
            per_frame_diffusion: HashMap::new(),
            shared_diffusion: None,
        }
    }

    pub fn with_photometric(mut self, photometric: PhotometricInterpretation) -> Self {
        self.photometric = Lookup::Value(photometric);
        self
    }

    pub fn with_rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.modality_lut = Lookup::Value(ModalityLut::Rescale { slope, intercept });
        self
    }

    pub fn with_modality_lut(mut self, lut: Lookup<ModalityLut>) -> Self {
        self.modality_lut = lut;
        self
    }

    pub fn with_window(mut self, center: f64, width: f64) -> Self {
        self.window_center = Lookup::Value(center);
        self.window_width = Lookup::Value(width);
        self
    }

    pub fn with_window_lookup(mut self, center: Lookup<f64>, width: Lookup<f64>) -> Self {
        self.window_center = center;
        self.window_width = width;
        self
    }

    pub fn with_number_of_frames(mut self, frames: u32) -> Self {
        self.number_of_frames = Some(frames);
        self
    }

    pub fn with_text(mut self, attribute: TextAttribute, value: impl Into<String>) -> Self {
        self.text.insert(attribute, value.into());
        self
    }

    pub fn with_per_frame_diffusion(mut self, frame: usize, group: DiffusionGroup) -> Self {
        self.per_frame_diffusion.insert(frame, group);
        self
    }

    pub fn with_shared_diffusion(mut self, group: DiffusionGroup) -> Self {
        self.shared_diffusion = Some(group);
        self
    }
}

impl Dataset for MemoryDataset {
    fn decode_pixels(&self) -> Result<PixelData, DatasetError> {
        self.pixels.clone().map_err(DatasetError::Decode)
    }

    fn rows(&self) -> Lookup<u32> {
        self.pixels
            .as_ref()
            .ok()
            .map(|pixels| pixels.rows() as u32)
            .into()
    }

    fn columns(&self) -> Lookup<u32> {
        self.pixels
            .as_ref()
            .ok()
            .map(|pixels| pixels.columns() as u32)
            .into()
    }

    fn samples_per_pixel(&self) -> Lookup<u16> {
        self.pixels
            .as_ref()
            .ok()
            .map(|pixels| pixels.samples_per_pixel() as u16)
            .into()
    }

    fn number_of_frames(&self) -> Lookup<u32> {
        self.number_of_frames.into()
    }

    fn photometric_interpretation(&self) -> Lookup<PhotometricInterpretation> {
        self.photometric.clone()
    }

    fn modality_lut(&self) -> Lookup<ModalityLut> {
        self.modality_lut.clone()
    }

    fn window_center(&self) -> Lookup<f64> {
        self.window_center.clone()
    }

    fn window_width(&self) -> Lookup<f64> {
        self.window_width.clone()
    }

    fn text(&self, attribute: TextAttribute) -> Lookup<String> {
        self.text.get(&attribute).cloned().into()
    }

    fn diffusion_group(&self, scope: GroupScope) -> Option<DiffusionGroup> {
        match scope {
            GroupScope::PerFrame(frame) => self.per_frame_diffusion.get(&frame).cloned(),
            GroupScope::Shared => self.shared_diffusion.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn or_else_prefers_value_then_keeps_malformed_reason() {
        let absent: Lookup<f64> = Lookup::absent();
        assert_eq!(absent.or_else(|| Lookup::Value(2.0)), Lookup::Value(2.0));

        let malformed: Lookup<f64> = Lookup::malformed("bad DS");
        let kept = malformed.or_else(Lookup::absent);
        assert!(kept.is_malformed());

        let recovered = Lookup::<f64>::malformed("bad DS").or_else(|| Lookup::Value(1.0));
        assert_eq!(recovered, Lookup::Value(1.0));
    }

    #[test]
    fn memory_dataset_reports_geometry_from_pixels() {
        let dataset = MemoryDataset::new(PixelData::from_gray(Array2::zeros((3, 5)), 16));
        assert_eq!(dataset.rows(), Lookup::Value(3));
        assert_eq!(dataset.columns(), Lookup::Value(5));
        assert_eq!(dataset.frame_count(), 1);
        assert!(!dataset.is_color());
        assert!(dataset.text(TextAttribute::Modality).reason() == Some(&Unavailable::Absent));
    }

    #[test]
    fn undecodable_dataset_fails_to_decode() {
        let dataset = MemoryDataset::undecodable("truncated");
        assert!(matches!(dataset.decode_pixels(), Err(DatasetError::Decode(_))));
        assert_eq!(dataset.frame_count(), 1);
    }
}
