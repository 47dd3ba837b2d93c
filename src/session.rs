//! The "current view": one loaded instance plus everything the user has
//! done to it since.
//!
//! A [`ViewSession`] owns the frame cache, the active dataset, the frame
//! index, the window, the view transform and the ROI. All changes go through
//! `&mut self` methods; the UI reads state back and drains [`SessionEvent`]s
//! to learn what to refresh.

use std::path::Path;

use tracing::{debug, info, warn};
use web_time::Instant;

use crate::config::ViewerConfig;
use crate::dataset::Dataset;
use crate::diffusion::{DiffusionInfo, extract_diffusion};
use crate::dicom_dataset::DicomDataset;
use crate::enums::{HeaderScope, InteractionMode, TextAttribute, ZoomDirection};
use crate::frame::{FrameView, PixelData};
use crate::frame_cache::FrameCache;
use crate::intensity::{WindowLevel, WindowRequest};
use crate::overlay::{self, CursorReadout, StoredValue};
use crate::render::{DisplayImage, RenderError, RenderedFrame, render_frame};
use crate::resample::scale_for_display;
use crate::roi::{RoiEngine, RoiOutcome, RoiStats};
use crate::timing::{Debouncer, RedrawThrottle};
use crate::view::{ViewState, ViewTransform};

/// Notifications for the UI, drained with [`ViewSession::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    FileLoaded { key: String, frames: usize },
    FrameChanged { index: usize, total: usize },
    RoiChanged,
    HeaderRefreshRequested,
    WindowLevelChanged(WindowLevel),
}

#[derive(Debug, Clone, Default)]
pub enum RenderState {
    #[default]
    Empty,
    Ready(RenderedFrame),
    Failed(String),
}

/// State of the frame navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControls {
    /// 1-based
    pub current: usize,
    pub total: usize,
    pub can_prev: bool,
    pub can_next: bool,
}

impl FrameControls {
    pub fn label(&self) -> String {
        overlay::frame_label(self.current, self.total)
    }
}

/// Outcome of a pointer move over the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerUpdate {
    /// Dropped by the redraw throttle.
    Throttled,
    Outside,
    Inside(CursorReadout),
}

struct Current {
    key: String,
    dataset: Box<dyn Dataset>,
}

#[derive(Debug, Clone, Copy)]
struct WindowDrag {
    start_x: f64,
    start_y: f64,
    start: WindowLevel,
}

pub struct ViewSession {
    config: ViewerConfig,
    cache: FrameCache<String, PixelData>,
    current: Option<Current>,
    frame_index: usize,
    total_frames: usize,
    window: Option<WindowLevel>,
    default_window: Option<WindowLevel>,
    view: ViewTransform,
    roi: RoiEngine,
    render: RenderState,
    events: Vec<SessionEvent>,
    pointer: RedrawThrottle,
    settle: Debouncer,
    mode: InteractionMode,
    header_scope: HeaderScope,
    header_linked: bool,
    header_filter: String,
    filter_debounce: Debouncer,
    window_drag: Option<WindowDrag>,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl ViewSession {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            cache: FrameCache::new(config.cache_capacity.max(1)),
            view: ViewTransform::new(config.view_limits()),
            pointer: RedrawThrottle::new(config.timing.pointer_redraw()),
            settle: Debouncer::new(config.timing.settle()),
            filter_debounce: Debouncer::new(config.timing.filter_debounce()),
            header_scope: config.header.scope,
            header_linked: config.header.link_to_frame,
            config,
            current: None,
            frame_index: 0,
            total_frames: 0,
            window: None,
            default_window: None,
            roi: RoiEngine::new(),
            render: RenderState::Empty,
            events: Vec::new(),
            mode: InteractionMode::Settled,
            header_filter: String::new(),
            window_drag: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn cache(&self) -> &FrameCache<String, PixelData> {
        &self.cache
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Open a DICOM file and make it the current instance.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        match DicomDataset::open(path) {
            Ok(dataset) => self.load(path.display().to_string(), Box::new(dataset)),
            Err(e) => {
                let err = RenderError::Decode(e.to_string());
                self.reset_for_new_file();
                self.fail_load(&err);
                Err(err)
            }
        }
    }

    /// Make `dataset` the current instance. Pixels are decoded unless `key`
    /// is already cached.
    pub fn load(&mut self, key: impl Into<String>, dataset: Box<dyn Dataset>) -> Result<(), RenderError> {
        let key = key.into();
        self.reset_for_new_file();
        self.current = Some(Current {
            key: key.clone(),
            dataset,
        });

        if let Err(err) = self.ensure_resident() {
            self.fail_load(&err);
            return Err(err);
        }

        let Some((total, columns, rows, is_color)) = self.current_geometry() else {
            let err = RenderError::NoPixelData;
            self.fail_load(&err);
            return Err(err);
        };
        self.total_frames = total;
        self.view.set_image_size(columns, rows);

        let probe = self.render_current(WindowRequest::default());
        self.default_window = match &probe {
            _ if is_color => None,
            Ok(frame) => frame.window.or_else(|| self.fallback_window()),
            Err(_) => self.fallback_window(),
        };
        self.window = self.default_window;

        self.render = match probe {
            Ok(frame) if frame.window == self.window => RenderState::Ready(frame),
            _ => self.fresh_render(),
        };
        if let RenderState::Failed(message) = &self.render {
            warn!(%key, %message, "rendering failed");
        }

        info!(%key, frames = total, rows, columns, color = is_color, "loaded instance");
        self.events.push(SessionEvent::FileLoaded { key, frames: total });
        self.events.push(SessionEvent::RoiChanged);
        if let Some(window) = self.window {
            self.events.push(SessionEvent::WindowLevelChanged(window));
        }
        Ok(())
    }

    fn reset_for_new_file(&mut self) {
        self.current = None;
        self.frame_index = 0;
        self.total_frames = 0;
        self.window = None;
        self.default_window = None;
        self.window_drag = None;
        self.view.reset();
        self.view.clear_image();
        self.roi.clear();
        self.render = RenderState::Empty;
        self.mode = InteractionMode::Settled;
        self.settle.cancel();
        self.pointer.reset();
    }

    fn fail_load(&mut self, err: &RenderError) {
        warn!(%err, "failed to load instance");
        self.current = None;
        self.view.clear_image();
        self.render = RenderState::Failed(err.to_string());
        self.events.push(SessionEvent::RoiChanged);
    }

    /// Window used when the data yields none and nothing usable is declared.
    fn fallback_window(&self) -> Option<WindowLevel> {
        let dataset = &self.current.as_ref()?.dataset;
        let declared = dataset.window_center().is_value() || dataset.window_width().is_value();
        (!declared).then(|| self.config.window.fallback())
    }

    fn ensure_resident(&mut self) -> Result<(), RenderError> {
        let Some(current) = &self.current else {
            return Err(RenderError::NoPixelData);
        };
        if !self.cache.contains_key(&current.key) {
            let pixels = current
                .dataset
                .decode_pixels()
                .map_err(|e| RenderError::Decode(e.to_string()))?;
            debug!(key = %current.key, frames = pixels.number_of_frames(), "decoded instance");
            self.cache.put(current.key.clone(), pixels);
        }
        Ok(())
    }

    fn pixels(&self) -> Option<&PixelData> {
        self.cache.get(&self.current.as_ref()?.key)
    }

    /// (frames, columns, rows, color) of the current instance.
    fn current_geometry(&self) -> Option<(usize, u32, u32, bool)> {
        let current = self.current.as_ref()?;
        let pixels = self.pixels()?;
        if pixels.number_of_frames() == 0 || pixels.rows() == 0 || pixels.columns() == 0 {
            return None;
        }
        let total = current
            .dataset
            .frame_count()
            .min(pixels.number_of_frames())
            .max(1);
        Some((
            total,
            pixels.columns() as u32,
            pixels.rows() as u32,
            pixels.is_color(),
        ))
    }

    fn window_request(&self) -> WindowRequest {
        self.window.map(WindowRequest::from).unwrap_or_default()
    }

    fn render_current(&self, request: WindowRequest) -> Result<RenderedFrame, RenderError> {
        let current = self.current.as_ref().ok_or(RenderError::NoPixelData)?;
        let pixels = self.pixels().ok_or(RenderError::NoPixelData)?;
        render_frame(current.dataset.as_ref(), pixels, self.frame_index, request)
    }

    fn fresh_render(&self) -> RenderState {
        match self.render_current(self.window_request()) {
            Ok(frame) => RenderState::Ready(frame),
            Err(err) => RenderState::Failed(err.to_string()),
        }
    }

    fn rerender(&mut self) {
        if self.current.is_none() {
            self.render = RenderState::Empty;
            return;
        }
        if let Err(err) = self.ensure_resident() {
            warn!(%err, "failed to decode instance");
            self.render = RenderState::Failed(err.to_string());
            return;
        }
        self.render = self.fresh_render();
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Reports 0 of 0 frames while no instance is loaded.
    pub fn frame_controls(&self) -> FrameControls {
        if self.current.is_none() || self.total_frames == 0 {
            return FrameControls {
                current: 0,
                total: 0,
                can_prev: false,
                can_next: false,
            };
        }
        FrameControls {
            current: self.frame_index + 1,
            total: self.total_frames,
            can_prev: self.frame_index > 0,
            can_next: self.frame_index + 1 < self.total_frames,
        }
    }

    /// Go to `index`, clamped to the available frames. Returns whether the
    /// frame changed.
    pub fn set_frame(&mut self, index: usize) -> bool {
        if self.current.is_none() || self.total_frames == 0 {
            return false;
        }
        let index = index.min(self.total_frames - 1);
        if index == self.frame_index {
            return false;
        }
        self.frame_index = index;
        self.roi.clear();
        self.rerender();

        debug!(frame = index, total = self.total_frames, "frame changed");
        self.events.push(SessionEvent::FrameChanged {
            index,
            total: self.total_frames,
        });
        self.events.push(SessionEvent::RoiChanged);
        if self.header_scope == HeaderScope::Frame && self.header_linked {
            self.events.push(SessionEvent::HeaderRefreshRequested);
        }
        true
    }

    pub fn next_frame(&mut self) -> bool {
        self.set_frame(self.frame_index + 1)
    }

    pub fn prev_frame(&mut self) -> bool {
        match self.frame_index.checked_sub(1) {
            Some(index) => self.set_frame(index),
            None => false,
        }
    }

    /// Step by `delta` frames, wrapping around at either end.
    pub fn step_frame_wrapping(&mut self, delta: i64) -> bool {
        if self.total_frames <= 1 {
            return false;
        }
        let total = self.total_frames as i64;
        let index = (self.frame_index as i64 + delta).rem_euclid(total);
        self.set_frame(index as usize)
    }

    // ------------------------------------------------------------------
    // Window / level
    // ------------------------------------------------------------------

    /// Window currently applied, `None` when min-max normalization is used.
    pub fn window(&self) -> Option<WindowLevel> {
        self.window
    }

    /// Window chosen at load time; the target of [`Self::reset_window_level`].
    pub fn default_window(&self) -> Option<WindowLevel> {
        self.default_window
    }

    fn apply_window(&mut self, window: Option<WindowLevel>) -> bool {
        if self.current.is_none() || window == self.window {
            return false;
        }
        // color frames are never windowed
        if self.rendered().is_some_and(RenderedFrame::is_color) {
            return false;
        }
        self.window = window;
        self.rerender();
        if let Some(window) = window {
            debug!(center = window.center, width = window.width, "window changed");
            self.events.push(SessionEvent::WindowLevelChanged(window));
        }
        true
    }

    /// Widths of zero or less are raised to the minimum width.
    pub fn set_window_level(&mut self, center: f64, width: f64) -> bool {
        if !center.is_finite() {
            return false;
        }
        self.apply_window(Some(WindowLevel::new(center, width)))
    }

    pub fn set_window_width(&mut self, width: f64) -> bool {
        let center = self.base_window().center;
        self.set_window_level(center, width)
    }

    pub fn set_level(&mut self, center: f64) -> bool {
        let width = self.base_window().width;
        self.set_window_level(center, width)
    }

    pub fn reset_window_level(&mut self) -> bool {
        self.apply_window(self.default_window)
    }

    fn base_window(&self) -> WindowLevel {
        self.window
            .or(self.default_window)
            .unwrap_or_else(|| self.config.window.fallback())
    }

    pub fn begin_window_drag(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            return;
        }
        self.window_drag = Some(WindowDrag {
            start_x: x,
            start_y: y,
            start: self.base_window(),
        });
    }

    /// Horizontal motion changes the width, vertical motion the center.
    pub fn drag_window(&mut self, x: f64, y: f64) -> bool {
        let Some(drag) = self.window_drag else {
            return false;
        };
        let sensitivity = self.config.window.drag_sensitivity;
        let width = (drag.start.width + sensitivity * (x - drag.start_x)).max(WindowLevel::MIN_WIDTH);
        let center = drag.start.center - sensitivity * (y - drag.start_y);
        self.set_window_level(center, width)
    }

    pub fn end_window_drag(&mut self) -> bool {
        self.window_drag.take().is_some()
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.mode
    }

    fn interact(&mut self, now: Instant) {
        self.mode = InteractionMode::Interactive;
        self.settle.trigger(now);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.view.set_surface_size(width, height);
    }

    pub fn zoom_at(&mut self, x: f64, y: f64, direction: ZoomDirection, now: Instant) -> bool {
        if self.view.image_size().is_none() {
            return false;
        }
        let changed = self.view.zoom_at(x, y, direction);
        self.interact(now);
        changed
    }

    pub fn begin_pan(&mut self, x: f64, y: f64, now: Instant) {
        if self.view.image_size().is_none() {
            return;
        }
        self.view.begin_pan(x, y);
        self.interact(now);
    }

    pub fn pan_to(&mut self, x: f64, y: f64, now: Instant) -> bool {
        if !self.view.pan_to(x, y) {
            return false;
        }
        self.interact(now);
        true
    }

    /// Ending a pan settles the display immediately.
    pub fn end_pan(&mut self) -> bool {
        if !self.view.end_pan() {
            return false;
        }
        self.settle.cancel();
        self.mode = InteractionMode::Settled;
        true
    }

    pub fn set_view_state(&mut self, state: ViewState) {
        self.view.set_state(state);
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
        self.settle.cancel();
        self.mode = InteractionMode::Settled;
    }

    /// Fire expired deadlines. Returns whether anything needs a redraw.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut redraw = false;
        if self.settle.poll(now) && self.mode == InteractionMode::Interactive {
            self.mode = InteractionMode::Settled;
            redraw = true;
        }
        if self.filter_debounce.poll(now) {
            self.events.push(SessionEvent::HeaderRefreshRequested);
        }
        redraw
    }

    // ------------------------------------------------------------------
    // Header panel
    // ------------------------------------------------------------------

    pub fn header_scope(&self) -> HeaderScope {
        self.header_scope
    }

    pub fn set_header_scope(&mut self, scope: HeaderScope) {
        if scope != self.header_scope {
            self.header_scope = scope;
            self.events.push(SessionEvent::HeaderRefreshRequested);
        }
    }

    pub fn set_header_linked(&mut self, linked: bool) {
        self.header_linked = linked;
    }

    pub fn header_filter(&self) -> &str {
        &self.header_filter
    }

    /// Store the header filter text; the refresh fires once typing pauses.
    pub fn set_header_filter(&mut self, filter: impl Into<String>, now: Instant) {
        self.header_filter = filter.into();
        self.filter_debounce.trigger(now);
    }

    // ------------------------------------------------------------------
    // ROI
    // ------------------------------------------------------------------

    pub fn roi(&self) -> &RoiEngine {
        &self.roi
    }

    pub fn roi_stats(&self) -> Option<RoiStats> {
        self.roi.stats()
    }

    pub fn roi_label(&self) -> String {
        overlay::roi_label(self.roi.stats().as_ref())
    }

    /// ROI vertices in surface coordinates, for drawing the outline.
    pub fn roi_outline(&self) -> Vec<(f64, f64)> {
        self.roi
            .points()
            .iter()
            .filter_map(|&(i, j)| self.view.image_to_display(i as f64, j as f64))
            .collect()
    }

    pub fn roi_begin(&mut self, x: f64, y: f64) -> bool {
        if !matches!(self.render, RenderState::Ready(_)) {
            return false;
        }
        let started = self.roi.begin(self.view.display_to_image(x, y));
        if started {
            self.events.push(SessionEvent::RoiChanged);
        }
        started
    }

    pub fn roi_move(&mut self, x: f64, y: f64) -> bool {
        self.roi.extend(self.view.display_to_image(x, y))
    }

    pub fn roi_end(&mut self) -> RoiOutcome {
        let outcome = match &self.render {
            RenderState::Ready(frame) => self.roi.finish(frame.scalar.view()),
            _ => {
                self.roi.cancel();
                RoiOutcome::NotDrawing
            }
        };
        if outcome != RoiOutcome::NotDrawing {
            self.events.push(SessionEvent::RoiChanged);
        }
        outcome
    }

    pub fn roi_cancel(&mut self) -> bool {
        let cancelled = self.roi.cancel();
        if cancelled {
            self.events.push(SessionEvent::RoiChanged);
        }
        cancelled
    }

    pub fn clear_roi(&mut self) {
        if !self.roi.is_empty() || self.roi.is_drawing() {
            self.roi.clear();
            self.events.push(SessionEvent::RoiChanged);
        }
    }

    // ------------------------------------------------------------------
    // Readout and overlays
    // ------------------------------------------------------------------

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn rendered(&self) -> Option<&RenderedFrame> {
        match &self.render {
            RenderState::Ready(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn display_image(&self) -> Option<&DisplayImage> {
        self.rendered().map(|frame| &frame.display)
    }

    /// Display image resampled to its on-surface size in the current mode.
    pub fn scaled_display(&self) -> Option<DisplayImage> {
        let image = self.display_image()?;
        let (width, height) = self.view.display_size()?;
        Some(scale_for_display(image, width, height, self.mode))
    }

    pub fn cursor_readout(&self, x: f64, y: f64) -> Option<CursorReadout> {
        let frame = self.rendered()?;
        let (i, j) = self.view.display_to_image(x, y)?;
        let (column, row) = (i as usize, j as usize);

        let stored = match self.pixels()?.frame(frame.frame_index)? {
            FrameView::Gray(view) => StoredValue::Gray(*view.get((row, column))?),
            FrameView::Color(view) => StoredValue::Rgb([
                *view.get((row, column, 0))?,
                *view.get((row, column, 1))?,
                *view.get((row, column, 2))?,
            ]),
        };
        let modality = if frame.lut_applied {
            frame.scalar.get((row, column)).map(|v| *v as f64)
        } else {
            None
        };
        let hounsfield = self
            .current
            .as_ref()
            .and_then(|current| current.dataset.text(TextAttribute::Modality).into_value())
            .is_some_and(|modality| modality.eq_ignore_ascii_case("CT"));

        Some(CursorReadout {
            i,
            j,
            stored,
            modality,
            display: frame.display.pixel(i, j),
            hounsfield,
        })
    }

    /// Throttled cursor readout for pointer motion.
    pub fn pointer_moved(&mut self, x: f64, y: f64, now: Instant) -> PointerUpdate {
        if !self.pointer.admit(now) {
            return PointerUpdate::Throttled;
        }
        match self.cursor_readout(x, y) {
            Some(readout) => PointerUpdate::Inside(readout),
            None => PointerUpdate::Outside,
        }
    }

    pub fn diffusion(&self) -> Option<DiffusionInfo> {
        self.rendered()?;
        let current = self.current.as_ref()?;
        extract_diffusion(current.dataset.as_ref(), self.frame_index)
    }

    pub fn diffusion_line(&self) -> Option<String> {
        self.diffusion().map(|info| overlay::diffusion_line(&info))
    }

    pub fn metadata_lines(&self) -> Vec<String> {
        match (&self.current, &self.render) {
            (Some(current), RenderState::Ready(_)) => {
                overlay::metadata_lines(current.dataset.as_ref(), self.frame_index, self.total_frames)
            }
            _ => Vec::new(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}
