//! # DICOM-viewport library
//!
//! This crate implements the pixel pipeline behind a DICOM image viewer:
//! turning decoded frames into displayable 8-bit images, mapping them onto a
//! zoomable and pannable surface and measuring pixel statistics inside a
//! freehand region of interest.
//!
//! This library is part of the dicom-rs ecosystem and uses its components to
//! read files and decode pixel data. Everything above the decoder is plain
//! data in, plain data out:
//!  - Intensity transform (modality LUT, window/level, MONOCHROME1 inversion)
//!  - Color normalization (YBR_FULL to RGB, 8-bit stretching)
//!  - View transform (fit-to-window, zoom at cursor, pan)
//!  - Freehand ROI with inclusive rasterization and robust statistics
//!  - Best-effort MR diffusion metadata
//!  - A bounded cache of decoded instances
//!
//! [`ViewSession`] ties the pieces together into the state of a single
//! viewer: load an instance, navigate frames, adjust the window, zoom, draw
//! an ROI and read back the display image, overlays and events.
//!
//! Datasets are consumed through the [`Dataset`] trait. [`DicomDataset`]
//! reads DICOM files and [`MemoryDataset`] holds synthetic or externally
//! decoded data.
//!
//! # Examples
//!
//! ## Rendering a frame with an explicit window
//!
//! ```no_run
//! # use dicom_viewport::{DicomDataset, WindowRequest, decode_and_render};
//! let dataset = DicomDataset::open("ct.dcm").expect("should have opened the file");
//! let rendered = decode_and_render(
//!     &dataset,
//!     0,
//!     WindowRequest {
//!         center: Some(40.0),
//!         width: Some(400.0),
//!     },
//! )
//! .expect("should have rendered the first frame");
//! rendered.display.to_dynamic().save("frame.png").unwrap();
//! ```
//!
//! ## Measuring a region
//!
//! ```no_run
//! # use dicom_viewport::ViewSession;
//! let mut session = ViewSession::default();
//! session.resize(512.0, 512.0);
//! session.open("mr.dcm").expect("should have loaded the file");
//! session.roi_begin(100.0, 100.0);
//! session.roi_move(200.0, 100.0);
//! session.roi_move(150.0, 200.0);
//! session.roi_end();
//! println!("{}", session.roi_label());
//! ```

pub mod color;
pub mod config;
pub mod dataset;
pub mod dicom_dataset;
pub mod diffusion;
pub mod enums;
pub mod frame;
pub mod frame_cache;
pub mod intensity;
pub mod overlay;
pub mod render;
pub mod resample;
pub mod roi;
pub mod session;
mod stats;
pub mod timing;
pub mod view;

pub use config::{ConfigError, ViewerConfig};
pub use dataset::{Dataset, DatasetError, Lookup, MemoryDataset, Unavailable};
pub use dicom_dataset::DicomDataset;
pub use diffusion::{DiffusionInfo, extract_diffusion};
pub use frame::PixelData;
pub use frame_cache::FrameCache;
pub use intensity::{WindowLevel, WindowRequest};
pub use render::{DisplayImage, RenderError, RenderedFrame, decode_and_render, render_frame};
pub use roi::{RoiEngine, RoiOutcome, RoiStats};
pub use session::{RenderState, SessionEvent, ViewSession};
pub use view::{ViewState, ViewTransform};
