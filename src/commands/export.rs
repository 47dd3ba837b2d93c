use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dicom_viewport::{Dataset, DicomDataset, WindowRequest, render_frame};
use rayon::prelude::*;
use tracing::info;

#[derive(Args)]
pub struct ExportArgs {
    /// Input DICOM file
    pub file: PathBuf,

    /// Output directory
    pub output: PathBuf,

    /// Window center
    #[arg(long)]
    pub center: Option<f64>,

    /// Window width
    #[arg(long)]
    pub width: Option<f64>,
}

pub fn run(args: &ExportArgs) -> Result<()> {
    let dataset = DicomDataset::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let pixels = dataset.decode_pixels()?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let frames = dataset.frame_count().min(pixels.number_of_frames());
    let request = WindowRequest {
        center: args.center,
        width: args.width,
    };

    (0..frames).into_par_iter().try_for_each(|index| -> Result<()> {
        let rendered = render_frame(&dataset, &pixels, index, request)?;
        let path = args.output.join(format!("frame_{:04}.png", index + 1));
        rendered
            .display
            .to_dynamic()
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(frame = index, path = %path.display(), "exported frame");
        Ok(())
    })?;

    println!("Exported {} frames to {}", frames, args.output.display());
    Ok(())
}
