use ndarray::{Array2, Array3, Array4, ArrayView2, ArrayView3, Axis, s};
use tracing::debug;

/// Decoded samples of one instance, laid out as
/// (frames, rows, columns, samples per pixel).
#[derive(Debug, Clone)]
pub struct PixelData {
    samples: Array4<f32>,
    bits_allocated: u16,
}

/// One frame borrowed out of [`PixelData`].
#[derive(Debug, Clone, Copy)]
pub enum FrameView<'a> {
    /// (rows, columns)
    Gray(ArrayView2<'a, f32>),
    /// (rows, columns, 3)
    Color(ArrayView3<'a, f32>),
}

/// Grayscale measurement values for one frame: modality units when a LUT
/// applies, raw samples otherwise, luminance for color frames.
pub type ScalarFrame = Array2<f32>;

impl PixelData {
    pub fn new(samples: Array4<f32>, bits_allocated: u16) -> Self {
        Self {
            samples,
            bits_allocated,
        }
    }

    /// Build from grayscale frames shaped (frames, rows, columns).
    pub fn from_gray_frames(frames: Array3<f32>, bits_allocated: u16) -> Self {
        Self::new(frames.insert_axis(Axis(3)), bits_allocated)
    }

    /// Build from a single grayscale frame shaped (rows, columns).
    pub fn from_gray(frame: Array2<f32>, bits_allocated: u16) -> Self {
        Self::from_gray_frames(frame.insert_axis(Axis(0)), bits_allocated)
    }

    /// Build from a single color frame shaped (rows, columns, 3).
    pub fn from_color(frame: Array3<f32>, bits_allocated: u16) -> Self {
        Self::new(frame.insert_axis(Axis(0)), bits_allocated)
    }

    pub fn samples(&self) -> &Array4<f32> {
        &self.samples
    }

    pub fn number_of_frames(&self) -> usize {
        self.samples.dim().0
    }

    pub fn rows(&self) -> usize {
        self.samples.dim().1
    }

    pub fn columns(&self) -> usize {
        self.samples.dim().2
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.samples.dim().3
    }

    pub fn bits_allocated(&self) -> u16 {
        self.bits_allocated
    }

    pub fn is_8bit(&self) -> bool {
        self.bits_allocated <= 8
    }

    pub fn is_color(&self) -> bool {
        self.samples_per_pixel() >= 3
    }

    /// Select a frame. An out-of-range index falls back to the first frame;
    /// `None` only when there is no frame at all.
    pub fn frame(&self, index: usize) -> Option<FrameView<'_>> {
        let total = self.number_of_frames();
        if total == 0 || self.rows() == 0 || self.columns() == 0 {
            return None;
        }
        let index = if index < total {
            index
        } else {
            debug!(index, total, "frame index out of range, using first frame");
            0
        };

        if self.is_color() {
            Some(FrameView::Color(self.samples.slice(s![index, .., .., 0..3])))
        } else {
            Some(FrameView::Gray(self.samples.slice(s![index, .., .., 0])))
        }
    }
}

impl FrameView<'_> {
    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            FrameView::Gray(view) => view.dim(),
            FrameView::Color(view) => {
                let (rows, columns, _) = view.dim();
                (rows, columns)
            }
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, FrameView::Color(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_frame_falls_back_to_first() {
        let frames = Array3::from_shape_fn((3, 2, 2), |(f, _, _)| f as f32);
        let data = PixelData::from_gray_frames(frames, 16);
        let Some(FrameView::Gray(view)) = data.frame(7) else {
            panic!("expected a grayscale frame");
        };
        assert!(view.iter().all(|v| *v == 0.0));
        let Some(FrameView::Gray(view)) = data.frame(2) else {
            panic!("expected a grayscale frame");
        };
        assert!(view.iter().all(|v| *v == 2.0));
    }

    #[test]
    fn color_frames_expose_three_channels() {
        let data = PixelData::from_color(Array3::zeros((4, 5, 3)), 8);
        assert!(data.is_color());
        assert!(data.is_8bit());
        let frame = data.frame(0).unwrap();
        assert!(frame.is_color());
        assert_eq!(frame.dim(), (4, 5));
    }

    #[test]
    fn empty_data_has_no_frame() {
        let data = PixelData::new(Array4::zeros((0, 4, 4, 1)), 16);
        assert!(data.frame(0).is_none());
    }
}
