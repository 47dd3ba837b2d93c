use std::path::Path;

use dicom::core::{Tag, VR};
use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption};
use dicom_dictionary_std::tags;
use tracing::debug;

use crate::dataset::{Dataset, DatasetError, DiffusionGroup, Lookup, RawValue, Unavailable};
use crate::enums::{GroupScope, PhotometricInterpretation, TextAttribute};
use crate::frame::PixelData;
use crate::intensity::ModalityLut;

/// A [`Dataset`] backed by a DICOM file read with `dicom-rs`.
pub struct DicomDataset {
    object: FileDicomObject<InMemDicomObject>,
}

impl DicomDataset {
    /// Read a DICOM file, including its pixel data.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let object = open_file(path.as_ref())?;
        Ok(Self { object })
    }

    pub fn from_object(object: FileDicomObject<InMemDicomObject>) -> Self {
        Self { object }
    }

    pub fn object(&self) -> &FileDicomObject<InMemDicomObject> {
        &self.object
    }

    fn diffusion_item(container: &InMemDicomObject) -> Option<&InMemDicomObject> {
        container
            .element(tags::MR_DIFFUSION_SEQUENCE)
            .ok()?
            .items()?
            .first()
    }
}

impl Dataset for DicomDataset {
    fn decode_pixels(&self) -> Result<PixelData, DatasetError> {
        if self.object.element(tags::PIXEL_DATA).is_err() {
            return Err(DatasetError::MissingPixelData);
        }
        let pixel_data = self
            .object
            .decode_pixel_data()
            .map_err(|e| DatasetError::Decode(e.to_string()))?;

        // LUTs are applied by the pipeline, keep stored values here
        let options = ConvertOptions::new()
            .with_modality_lut(ModalityLutOption::None)
            .with_voi_lut(VoiLutOption::Identity);
        let samples = pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map_err(|e| DatasetError::Decode(e.to_string()))?;

        let (frames, rows, columns, samples_per_pixel) = samples.dim();
        if samples_per_pixel != 1 && samples_per_pixel != 3 {
            return Err(DatasetError::UnsupportedLayout(format!(
                "{samples_per_pixel} samples per pixel"
            )));
        }
        debug!(frames, rows, columns, samples_per_pixel, "decoded pixel data");

        Ok(PixelData::new(samples, pixel_data.bits_allocated()))
    }

    fn rows(&self) -> Lookup<u32> {
        uint(&self.object, tags::ROWS)
    }

    fn columns(&self) -> Lookup<u32> {
        uint(&self.object, tags::COLUMNS)
    }

    fn samples_per_pixel(&self) -> Lookup<u16> {
        uint(&self.object, tags::SAMPLES_PER_PIXEL).and_then(|spp| match u16::try_from(spp) {
            Ok(spp) => Lookup::Value(spp),
            Err(_) => Lookup::malformed(format!("samples per pixel {spp}")),
        })
    }

    fn number_of_frames(&self) -> Lookup<u32> {
        uint(&self.object, tags::NUMBER_OF_FRAMES)
    }

    fn photometric_interpretation(&self) -> Lookup<PhotometricInterpretation> {
        text(&self.object, tags::PHOTOMETRIC_INTERPRETATION)
            .map(|value| PhotometricInterpretation::parse(&value))
    }

    fn modality_lut(&self) -> Lookup<ModalityLut> {
        if let Ok(sequence) = self.object.element(tags::MODALITY_LUT_SEQUENCE) {
            return match sequence.items().and_then(|items| items.first()) {
                Some(item) => lut_table(item),
                None => Lookup::malformed("empty Modality LUT Sequence"),
            };
        }

        let slope = first_float(&self.object, tags::RESCALE_SLOPE);
        let intercept = first_float(&self.object, tags::RESCALE_INTERCEPT);
        match (slope, intercept) {
            (Lookup::Value(slope), Lookup::Value(intercept)) => {
                Lookup::Value(ModalityLut::Rescale { slope, intercept })
            }
            (Lookup::Unavailable(reason), Lookup::Value(_))
            | (Lookup::Value(_), Lookup::Unavailable(reason)) => {
                Lookup::malformed(format!("incomplete rescale: {reason}"))
            }
            (slope, intercept) => {
                if let Some(reason) = [slope.reason(), intercept.reason()]
                    .into_iter()
                    .flatten()
                    .find(|reason| matches!(reason, Unavailable::Malformed(_)))
                {
                    Lookup::malformed(reason.to_string())
                } else {
                    Lookup::absent()
                }
            }
        }
    }

    fn window_center(&self) -> Lookup<f64> {
        first_float(&self.object, tags::WINDOW_CENTER)
    }

    fn window_width(&self) -> Lookup<f64> {
        first_float(&self.object, tags::WINDOW_WIDTH)
    }

    fn text(&self, attribute: TextAttribute) -> Lookup<String> {
        let tag = match attribute {
            TextAttribute::Modality => tags::MODALITY,
            TextAttribute::ImageType => tags::IMAGE_TYPE,
            TextAttribute::StudyDate => tags::STUDY_DATE,
            TextAttribute::StudyDescription => tags::STUDY_DESCRIPTION,
            TextAttribute::SeriesDescription => tags::SERIES_DESCRIPTION,
            TextAttribute::SeriesNumber => tags::SERIES_NUMBER,
            TextAttribute::InstanceNumber => tags::INSTANCE_NUMBER,
            TextAttribute::PatientName => tags::PATIENT_NAME,
        };
        text(&self.object, tag)
    }

    fn diffusion_group(&self, scope: GroupScope) -> Option<DiffusionGroup> {
        let item = match scope {
            GroupScope::PerFrame(frame) => {
                let container = self
                    .object
                    .element(tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE)
                    .ok()?
                    .items()?
                    .get(frame)?;
                Self::diffusion_item(container)?
            }
            GroupScope::Shared => self
                .object
                .element(tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE)
                .ok()?
                .items()?
                .iter()
                .find_map(Self::diffusion_item)?,
        };
        Some(diffusion_from_item(item))
    }
}

fn first_float(object: &InMemDicomObject, tag: Tag) -> Lookup<f64> {
    let Ok(element) = object.element(tag) else {
        return Lookup::absent();
    };
    match element.to_multi_float64() {
        Ok(values) => match values.first() {
            None => Lookup::absent(),
            Some(value) if value.is_finite() => Lookup::Value(*value),
            Some(value) => Lookup::malformed(format!("non-finite value {value}")),
        },
        Err(e) => Lookup::malformed(e.to_string()),
    }
}

fn uint(object: &InMemDicomObject, tag: Tag) -> Lookup<u32> {
    let Ok(element) = object.element(tag) else {
        return Lookup::absent();
    };
    match element.to_int::<u32>() {
        Ok(value) => Lookup::Value(value),
        Err(e) => Lookup::malformed(e.to_string()),
    }
}

fn text(object: &InMemDicomObject, tag: Tag) -> Lookup<String> {
    let Ok(element) = object.element(tag) else {
        return Lookup::absent();
    };
    match element.to_str() {
        Ok(value) => {
            let value = value.trim().trim_end_matches('\0').trim();
            if value.is_empty() {
                Lookup::absent()
            } else {
                Lookup::Value(value.to_string())
            }
        }
        Err(e) => Lookup::malformed(e.to_string()),
    }
}

fn lut_table(item: &InMemDicomObject) -> Lookup<ModalityLut> {
    let descriptor = match item.element(tags::LUT_DESCRIPTOR) {
        Ok(element) => match element.to_multi_float64() {
            Ok(descriptor) if descriptor.len() == 3 => descriptor,
            Ok(descriptor) => {
                return Lookup::malformed(format!("LUT descriptor has {} values", descriptor.len()));
            }
            Err(e) => return Lookup::malformed(e.to_string()),
        },
        Err(_) => return Lookup::malformed("missing LUT descriptor"),
    };
    let entries = match item.element(tags::LUT_DATA) {
        Ok(element) => match element.to_multi_float64() {
            Ok(entries) => entries,
            Err(e) => return Lookup::malformed(e.to_string()),
        },
        Err(_) => return Lookup::malformed("missing LUT data"),
    };

    // a declared entry count of 0 means 65536 entries
    let declared = if descriptor[0] == 0.0 { 65536.0 } else { descriptor[0] };
    if entries.len() as f64 != declared {
        debug!(declared, actual = entries.len(), "LUT data length differs from descriptor");
    }
    Lookup::Value(ModalityLut::Table {
        first_mapped: descriptor[1],
        entries,
    })
}

fn raw_value(object: &InMemDicomObject, tag: Tag) -> Option<RawValue> {
    let element = object.element(tag).ok()?;
    let textual = matches!(
        element.vr(),
        VR::CS | VR::LO | VR::SH | VR::ST | VR::LT | VR::UT | VR::UC | VR::PN
    );
    if textual {
        return Some(match element.to_str() {
            Ok(value) => RawValue::Text(value.trim().to_string()),
            Err(e) => RawValue::Invalid(e.to_string()),
        });
    }
    Some(match element.to_multi_float64() {
        Ok(values) => RawValue::Numbers(values),
        Err(e) => match element.to_str() {
            Ok(value) => RawValue::Text(value.trim().to_string()),
            Err(_) => RawValue::Invalid(e.to_string()),
        },
    })
}

/// Loose numeric values of an item, used when the gradient orientation is
/// not stored under its own tag.
fn scan_numbers(item: &InMemDicomObject) -> Vec<f64> {
    item.iter()
        .filter(|element| element.items().is_none())
        .filter_map(|element| element.to_multi_float64().ok())
        .flatten()
        .collect()
}

fn diffusion_from_item(item: &InMemDicomObject) -> DiffusionGroup {
    let gradient = match item.element(tags::DIFFUSION_GRADIENT_DIRECTION_SEQUENCE) {
        Ok(sequence) => sequence
            .items()
            .and_then(|items| items.first())
            .and_then(|gradient_item| {
                raw_value(gradient_item, tags::DIFFUSION_GRADIENT_ORIENTATION).or_else(|| {
                    let numbers = scan_numbers(gradient_item);
                    (numbers.len() >= 3).then_some(RawValue::Numbers(numbers))
                })
            }),
        Err(_) => raw_value(item, tags::DIFFUSION_GRADIENT_ORIENTATION),
    };

    DiffusionGroup {
        b_value: raw_value(item, tags::DIFFUSION_B_VALUE),
        directionality: raw_value(item, tags::DIFFUSION_DIRECTIONALITY),
        gradient,
    }
}
