use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dicom_viewport::enums::TextAttribute;
use dicom_viewport::overlay::{diffusion_line, metadata_lines};
use dicom_viewport::{Dataset, DicomDataset, Lookup, extract_diffusion};

#[derive(Args)]
pub struct InfoArgs {
    /// Input DICOM file
    pub file: PathBuf,

    /// Frame used for per-frame metadata (0-based)
    #[arg(long, default_value = "0")]
    pub frame: usize,
}

fn show<T: std::fmt::Display>(value: Lookup<T>) -> String {
    match value {
        Lookup::Value(value) => value.to_string(),
        Lookup::Unavailable(reason) => format!("({reason})"),
    }
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let dataset = DicomDataset::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    println!("File:         {}", args.file.display());
    println!("Modality:     {}", show(dataset.text(TextAttribute::Modality)));
    println!("Patient:      {}", show(dataset.text(TextAttribute::PatientName)));
    println!("Study:        {}", show(dataset.text(TextAttribute::StudyDescription)));
    println!("Dimensions:   {}x{}", show(dataset.columns()), show(dataset.rows()));
    println!("Frames:       {}", dataset.frame_count());
    println!("Samples:      {}", show(dataset.samples_per_pixel()));
    println!(
        "Photometric:  {}",
        show(dataset.photometric_interpretation().map(|p| p.as_str().to_string()))
    );
    println!(
        "Window:       C={} W={}",
        show(dataset.window_center()),
        show(dataset.window_width())
    );
    println!(
        "Modality LUT: {}",
        show(dataset.modality_lut().map(|lut| format!("{lut:?}")))
    );

    for line in metadata_lines(&dataset, args.frame, dataset.frame_count()) {
        println!("  {line}");
    }
    if let Some(info) = extract_diffusion(&dataset, args.frame) {
        println!("  {}", diffusion_line(&info));
        println!("  Gradient: {}", info.gradient_text());
    }

    Ok(())
}
