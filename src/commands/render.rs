use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use dicom_viewport::{RenderState, ViewSession, ViewState};
use image::{DynamicImage, RgbImage, imageops};
use tracing::info;

use super::{load_config, parse_pair, parse_size};

#[derive(Args)]
pub struct RenderArgs {
    /// Input DICOM file
    pub file: PathBuf,

    /// Frame index (0-based)
    #[arg(long, default_value = "0")]
    pub frame: usize,

    /// Window center
    #[arg(long)]
    pub center: Option<f64>,

    /// Window width
    #[arg(long)]
    pub width: Option<f64>,

    /// Place the image on a surface of this size (e.g. 800x600)
    #[arg(long)]
    pub surface: Option<String>,

    /// Zoom relative to fit-to-window
    #[arg(long, default_value = "1.0")]
    pub zoom: f64,

    /// Pan offset in surface pixels (e.g. 20,-10)
    #[arg(long, allow_hyphen_values = true)]
    pub pan: Option<String>,

    /// Viewer config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "frame.png")]
    pub output: PathBuf,
}

pub fn run(args: &RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = ViewSession::new(config);

    let surface = args.surface.as_deref().map(parse_size).transpose()?;
    if let Some((width, height)) = surface {
        session.resize(width as f64, height as f64);
    }

    session
        .open(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    session.set_frame(args.frame);

    if args.center.is_some() || args.width.is_some() {
        let base = session
            .window()
            .unwrap_or_else(|| session.config().window.fallback());
        session.set_window_level(
            args.center.unwrap_or(base.center),
            args.width.unwrap_or(base.width),
        );
    }

    let (pan_x, pan_y) = match args.pan.as_deref() {
        Some(pan) => parse_pair::<f64>(pan)?,
        None => (0.0, 0.0),
    };
    session.set_view_state(ViewState {
        zoom: args.zoom,
        pan_x,
        pan_y,
    });

    let output = match (session.render_state(), surface) {
        (RenderState::Failed(message), _) => bail!("Rendering failed: {message}"),
        (RenderState::Empty, _) => bail!("Nothing to render"),
        (RenderState::Ready(frame), None) => frame.display.to_dynamic(),
        (RenderState::Ready(_), Some((width, height))) => {
            let mut canvas = RgbImage::new(width, height);
            if let (Some(scaled), Some(rect)) = (session.scaled_display(), session.view().image_rect()) {
                let scaled = scaled.to_dynamic().to_rgb8();
                imageops::overlay(&mut canvas, &scaled, rect.x0.round() as i64, rect.y0.round() as i64);
            }
            DynamicImage::ImageRgb8(canvas)
        }
    };

    output
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(window) = session.window() {
        info!(center = window.center, width = window.width, "applied window");
    }
    for line in session.metadata_lines() {
        println!("{line}");
    }
    println!("Saved {}", args.output.display());
    Ok(())
}
