//! Text shown on top of the image: cursor readout, ROI label and metadata.

use std::fmt;

use crate::dataset::{Dataset, Lookup};
use crate::diffusion::DiffusionInfo;
use crate::enums::TextAttribute;
use crate::render::DisplayValue;
use crate::roi::RoiStats;

const NOT_AVAILABLE: &str = "N/A";

/// Stored sample under the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoredValue {
    Gray(f32),
    Rgb([f32; 3]),
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Gray(value) => write!(f, "{}", value.round() as i64),
            StoredValue::Rgb([r, g, b]) => write!(
                f,
                "RGB({}, {}, {})",
                r.round() as i64,
                g.round() as i64,
                b.round() as i64
            ),
        }
    }
}

/// Values of the image pixel under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorReadout {
    pub i: u32,
    pub j: u32,
    pub stored: StoredValue,
    /// Modality value, only when a modality LUT was applied.
    pub modality: Option<f64>,
    pub display: Option<DisplayValue>,
    /// Modality values are Hounsfield units.
    pub hounsfield: bool,
}

impl CursorReadout {
    pub fn modality_text(&self) -> Option<String> {
        let value = self.modality?;
        Some(if self.hounsfield {
            format!("{} HU", value.round() as i64)
        } else {
            format!("{value:.2}")
        })
    }

    pub fn label(&self) -> String {
        let mut label = format!("Cursor: x {} y {} | SV={}", self.i, self.j, self.stored);
        if let Some(modality) = self.modality_text() {
            label.push_str(&format!(" | MV={modality}"));
        }
        label
    }
}

/// Cursor label, with placeholders when the pointer is off the image.
pub fn cursor_label(readout: Option<&CursorReadout>) -> String {
    readout.map_or_else(|| "Cursor: x=- y=- | SV=-".to_string(), CursorReadout::label)
}

pub fn roi_label(stats: Option<&RoiStats>) -> String {
    match stats {
        Some(s) => format!(
            "ROI: N={} μ={:.2} σ={:.2} med={:.2} IQR={:.2}",
            s.n, s.mean, s.std, s.median, s.iqr
        ),
        None => "ROI: N=0 μ=- σ=- med=- IQR=-".to_string(),
    }
}

pub fn diffusion_line(info: &DiffusionInfo) -> String {
    format!(
        "Diffusion: b={} | Dir={}",
        info.b_value_text(),
        info.directionality_text()
    )
}

pub fn frame_label(current: usize, total: usize) -> String {
    format!("Frame {current}/{total}")
}

fn text_or_na<D: Dataset + ?Sized>(dataset: &D, attribute: TextAttribute) -> String {
    dataset
        .text(attribute)
        .into_value()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn number_or_na(value: Lookup<u32>) -> String {
    value
        .into_value()
        .map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Basic metadata stacked at the top-right of the image.
pub fn metadata_lines<D>(dataset: &D, frame_index: usize, total_frames: usize) -> Vec<String>
where
    D: Dataset + ?Sized,
{
    vec![
        format!("Image type: {}", text_or_na(dataset, TextAttribute::ImageType)),
        format!("Study Date: {}", text_or_na(dataset, TextAttribute::StudyDate)),
        format!("Series: {}", text_or_na(dataset, TextAttribute::SeriesDescription)),
        format!("Series No: {}", text_or_na(dataset, TextAttribute::SeriesNumber)),
        format!("Instance: {}", text_or_na(dataset, TextAttribute::InstanceNumber)),
        format!(
            "matrix: {} x {}",
            number_or_na(dataset.rows()),
            number_or_na(dataset.columns())
        ),
        format!("Frame: {}/{}", frame_index + 1, total_frames),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MemoryDataset;
    use crate::frame::PixelData;
    use ndarray::Array2;

    fn readout(hounsfield: bool) -> CursorReadout {
        CursorReadout {
            i: 3,
            j: 4,
            stored: StoredValue::Gray(1064.0),
            modality: Some(40.4),
            display: Some(DisplayValue::Gray(128)),
            hounsfield,
        }
    }

    #[test]
    fn ct_modality_values_are_whole_hounsfield_units() {
        assert_eq!(readout(true).modality_text().as_deref(), Some("40 HU"));
        assert_eq!(readout(false).modality_text().as_deref(), Some("40.40"));
        assert_eq!(readout(true).label(), "Cursor: x 3 y 4 | SV=1064 | MV=40 HU");
        assert_eq!(cursor_label(None), "Cursor: x=- y=- | SV=-");
    }

    #[test]
    fn roi_label_uses_two_decimals() {
        let stats = RoiStats {
            n: 100,
            mean: 50.0,
            std: 0.0,
            median: 50.0,
            iqr: 1.5,
        };
        assert_eq!(
            roi_label(Some(&stats)),
            "ROI: N=100 μ=50.00 σ=0.00 med=50.00 IQR=1.50"
        );
        assert_eq!(roi_label(None), "ROI: N=0 μ=- σ=- med=- IQR=-");
    }

    #[test]
    fn missing_metadata_reads_not_available() {
        let dataset = MemoryDataset::new(PixelData::from_gray(Array2::zeros((2, 3)), 8))
            .with_text(TextAttribute::StudyDate, "20240131");
        let lines = metadata_lines(&dataset, 0, 1);
        assert_eq!(lines[0], "Image type: N/A");
        assert_eq!(lines[1], "Study Date: 20240131");
        assert_eq!(lines[5], "matrix: 2 x 3");
        assert_eq!(lines[6], "Frame: 1/1");
    }
}
