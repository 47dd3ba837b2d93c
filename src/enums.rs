use serde::{Deserialize, Serialize};

/// How stored samples map to displayable intensity or color
/// (the _Photometric Interpretation_ attribute).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhotometricInterpretation {
    Monochrome1,
    #[default]
    Monochrome2,
    Rgb,
    YbrFull,
    YbrFull422,
    YbrPartial420,
    YbrPartial422,
    YbrIct,
    YbrRct,
    PaletteColor,
    Other(String),
}

impl PhotometricInterpretation {
    pub fn parse(value: &str) -> Self {
        let value = value.trim().trim_end_matches('\0').to_ascii_uppercase();
        match value.as_str() {
            "MONOCHROME1" => Self::Monochrome1,
            "MONOCHROME2" => Self::Monochrome2,
            "RGB" => Self::Rgb,
            "YBR_FULL" => Self::YbrFull,
            "YBR_FULL_422" => Self::YbrFull422,
            "YBR_PARTIAL_420" => Self::YbrPartial420,
            "YBR_PARTIAL_422" => Self::YbrPartial422,
            "YBR_ICT" => Self::YbrIct,
            "YBR_RCT" => Self::YbrRct,
            "PALETTE COLOR" => Self::PaletteColor,
            _ => Self::Other(value),
        }
    }

    /// Luma/chroma encodings that need a conversion before display.
    pub fn is_ybr(&self) -> bool {
        matches!(
            self,
            Self::YbrFull
                | Self::YbrFull422
                | Self::YbrPartial420
                | Self::YbrPartial422
                | Self::YbrIct
                | Self::YbrRct
        )
    }

    pub fn is_inverted(&self) -> bool {
        matches!(self, Self::Monochrome1)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Monochrome1 => "MONOCHROME1",
            Self::Monochrome2 => "MONOCHROME2",
            Self::Rgb => "RGB",
            Self::YbrFull => "YBR_FULL",
            Self::YbrFull422 => "YBR_FULL_422",
            Self::YbrPartial420 => "YBR_PARTIAL_420",
            Self::YbrPartial422 => "YBR_PARTIAL_422",
            Self::YbrIct => "YBR_ICT",
            Self::YbrRct => "YBR_RCT",
            Self::PaletteColor => "PALETTE COLOR",
            Self::Other(value) => value,
        }
    }
}

/// _Diffusion Directionality_ as declared by the MR diffusion macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directionality {
    Directional,
    Bmatrix,
    Isotropic,
    None,
    Other(String),
}

impl Directionality {
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_ascii_uppercase();
        match value.as_str() {
            "DIRECTIONAL" => Self::Directional,
            "BMATRIX" => Self::Bmatrix,
            "ISOTROPIC" => Self::Isotropic,
            "NONE" => Self::None,
            _ => Self::Other(value),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Directional => "DIRECTIONAL",
            Self::Bmatrix => "BMATRIX",
            Self::Isotropic => "ISOTROPIC",
            Self::None => "NONE",
            Self::Other(value) => value,
        }
    }
}

/// Free-text attributes surfaced in overlays and status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextAttribute {
    Modality,
    ImageType,
    StudyDate,
    StudyDescription,
    SeriesDescription,
    SeriesNumber,
    InstanceNumber,
    PatientName,
}

/// Which functional group a metadata lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupScope {
    PerFrame(usize),
    Shared,
}

/// Resampling quality used to scale the display image onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Cheap bilinear scaling while the user zooms or pans.
    Interactive,
    #[default]
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Whether the header panel shows the whole dataset or the active frame only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderScope {
    #[default]
    Dataset,
    Frame,
}
