use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use dicom_viewport::overlay::roi_label;
use dicom_viewport::{DicomDataset, RoiEngine, RoiOutcome, WindowRequest, decode_and_render};

use super::parse_pair;

#[derive(Args)]
pub struct RoiArgs {
    /// Input DICOM file
    pub file: PathBuf,

    /// Polygon vertices in pixel coordinates, e.g. "10,10;40,10;25,30"
    #[arg(long)]
    pub points: String,

    /// Frame index (0-based)
    #[arg(long, default_value = "0")]
    pub frame: usize,
}

fn parse_points(text: &str) -> Result<Vec<(u32, u32)>> {
    text.split(';')
        .map(str::trim)
        .filter(|point| !point.is_empty())
        .map(parse_pair::<u32>)
        .collect()
}

pub fn run(args: &RoiArgs) -> Result<()> {
    let points = parse_points(&args.points)?;
    let dataset = DicomDataset::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let rendered = decode_and_render(&dataset, args.frame, WindowRequest::default())?;

    let (rows, columns) = rendered.scalar.dim();
    let mut roi = RoiEngine::new();
    let mut inside = points
        .iter()
        .map(|&(i, j)| ((i as usize) < columns && (j as usize) < rows).then_some((i, j)));
    roi.begin(inside.next().flatten());
    for point in inside {
        roi.extend(point);
    }

    match roi.finish(rendered.scalar.view()) {
        RoiOutcome::Measured(stats) => println!("{}", roi_label(Some(&stats))),
        RoiOutcome::NoMeasurement => println!("{}", roi_label(None)),
        RoiOutcome::Discarded | RoiOutcome::NotDrawing => {
            bail!("Need at least 3 distinct points inside the image")
        }
    }
    Ok(())
}
