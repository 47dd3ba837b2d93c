pub mod config;
pub mod export;
pub mod info;
pub mod render;
pub mod roi;

use std::path::Path;

use anyhow::{Context, Result, bail};
use dicom_viewport::ViewerConfig;

/// Load the config given on the command line, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

/// Parse "a,b" into two numbers.
pub fn parse_pair<T: std::str::FromStr>(text: &str) -> Result<(T, T)> {
    let mut parts = text.split(',').map(str::trim);
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("Expected two comma-separated values, got {text:?}");
    };
    match (a.parse(), b.parse()) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        _ => bail!("Invalid number in {text:?}"),
    }
}

/// Parse "WxH".
pub fn parse_size(text: &str) -> Result<(u32, u32)> {
    parse_pair(&text.to_ascii_lowercase().replace('x', ","))
        .with_context(|| format!("Invalid surface size {text:?}, expected WxH"))
}
