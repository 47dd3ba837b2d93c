//! Best-effort extraction of MR diffusion metadata for the active frame.
//!
//! Each field is looked up in the per-frame functional group first and in the
//! shared group second. Fields are parsed independently so one malformed
//! value never hides the others.

use crate::dataset::{Dataset, Lookup, RawValue};
use crate::enums::{Directionality, GroupScope};

#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionInfo {
    pub b_value: Lookup<f64>,
    pub directionality: Lookup<Directionality>,
    pub gradient: Lookup<[f64; 3]>,
}

impl DiffusionInfo {
    pub fn b_value_text(&self) -> String {
        match &self.b_value {
            Lookup::Value(b) => format!("{b:.1}"),
            Lookup::Unavailable(_) => "n/a".to_string(),
        }
    }

    pub fn directionality_text(&self) -> String {
        match &self.directionality {
            Lookup::Value(d) => d.as_str().to_string(),
            Lookup::Unavailable(_) => "n/a".to_string(),
        }
    }

    pub fn gradient_text(&self) -> String {
        match &self.gradient {
            Lookup::Value([x, y, z]) => format!("[{x:.3}, {y:.3}, {z:.3}]"),
            Lookup::Unavailable(_) => "n/a".to_string(),
        }
    }
}

/// Diffusion metadata for `frame`, or `None` when the dataset carries no
/// diffusion item in either functional group.
pub fn extract_diffusion<D>(dataset: &D, frame: usize) -> Option<DiffusionInfo>
where
    D: Dataset + ?Sized,
{
    let per_frame = dataset.diffusion_group(GroupScope::PerFrame(frame));
    let shared = dataset.diffusion_group(GroupScope::Shared);
    if per_frame.is_none() && shared.is_none() {
        return None;
    }

    let per_frame = per_frame.as_ref();
    let shared = shared.as_ref();

    Some(DiffusionInfo {
        b_value: parse_b_value(per_frame.and_then(|g| g.b_value.as_ref()))
            .or_else(|| parse_b_value(shared.and_then(|g| g.b_value.as_ref()))),
        directionality: parse_directionality(per_frame.and_then(|g| g.directionality.as_ref()))
            .or_else(|| parse_directionality(shared.and_then(|g| g.directionality.as_ref()))),
        gradient: parse_gradient(per_frame.and_then(|g| g.gradient.as_ref()))
            .or_else(|| parse_gradient(shared.and_then(|g| g.gradient.as_ref()))),
    })
}

fn numbers_from_text(text: &str) -> Result<Vec<f64>, String> {
    text.split('\\')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| format!("not a number: {part:?}"))
        })
        .collect()
}

fn parse_b_value(raw: Option<&RawValue>) -> Lookup<f64> {
    let numbers = match raw {
        None => return Lookup::absent(),
        Some(RawValue::Numbers(numbers)) => numbers.clone(),
        Some(RawValue::Text(text)) => match numbers_from_text(text) {
            Ok(numbers) => numbers,
            Err(reason) => return Lookup::malformed(reason),
        },
        Some(RawValue::Invalid(reason)) => return Lookup::malformed(reason.clone()),
    };
    match numbers.first() {
        None => Lookup::absent(),
        Some(b) if b.is_finite() => Lookup::Value(*b),
        Some(b) => Lookup::malformed(format!("non-finite b-value {b}")),
    }
}

fn parse_directionality(raw: Option<&RawValue>) -> Lookup<Directionality> {
    match raw {
        None => Lookup::absent(),
        Some(RawValue::Text(text)) if text.trim().is_empty() => Lookup::absent(),
        Some(RawValue::Text(text)) => Lookup::Value(Directionality::parse(text)),
        Some(RawValue::Numbers(_)) => Lookup::malformed("directionality is not text"),
        Some(RawValue::Invalid(reason)) => Lookup::malformed(reason.clone()),
    }
}

fn parse_gradient(raw: Option<&RawValue>) -> Lookup<[f64; 3]> {
    let numbers = match raw {
        None => return Lookup::absent(),
        Some(RawValue::Numbers(numbers)) => numbers.clone(),
        Some(RawValue::Text(text)) => match numbers_from_text(text) {
            Ok(numbers) => numbers,
            Err(reason) => return Lookup::malformed(reason),
        },
        Some(RawValue::Invalid(reason)) => return Lookup::malformed(reason.clone()),
    };
    match numbers.as_slice() {
        [] => Lookup::absent(),
        [x, y, z, ..] if x.is_finite() && y.is_finite() && z.is_finite() => {
            Lookup::Value([*x, *y, *z])
        }
        other => Lookup::malformed(format!("expected 3 finite components, got {other:?}")),
    }
}
