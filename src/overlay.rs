//! Overlay lifecycle: render-model elements plus the bounded recent log.
//!
//! The manager owns data only; presentation is a separate consumer behind
//! the `OverlaySurface` seam. Elements are replaced wholesale each cycle,
//! so the displayed set always mirrors the latest completed render. A box
//! present in consecutive frames is a new element each time, never an
//! update.

/// Display dimensions of the rendering surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned box in display coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// A transient visual marker for one accepted detection.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayElement {
    pub bbox: DisplayBox,
    pub label: String,
}

/// Most entries the recent-detections panel will hold.
pub const RECENT_LOG_CAPACITY: usize = 5;

/// Presentation consumer of overlay data.
pub trait OverlaySurface: Send {
    /// Display dimensions the overlay is projected into.
    fn viewport(&self) -> Viewport;

    /// Receive the committed overlay state after a cycle.
    fn present(&mut self, elements: &[OverlayElement], log: &[String], sound_active: bool);
}

/// Surface that displays nothing. Used by tests and headless runs.
pub struct NullSurface {
    pub viewport: Viewport,
}

impl OverlaySurface for NullSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self, _elements: &[OverlayElement], _log: &[String], _sound_active: bool) {}
}

/// Owns the currently-rendered elements and the recent-detections log.
#[derive(Default)]
pub struct OverlayManager {
    elements: Vec<OverlayElement>,
    log: Vec<String>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every displayed element atomically.
    ///
    /// The recent log is NOT touched by this call; log entries outlive the
    /// frames that produced them.
    pub fn render(&mut self, elements: Vec<OverlayElement>) {
        self.elements = elements;
    }

    /// Prepend a formatted entry and evict from the tail beyond capacity.
    pub fn log_detection(&mut self, label: &str, confidence: f32) {
        self.log.insert(0, format_label(label, confidence));
        self.log.truncate(RECENT_LOG_CAPACITY);
    }

    /// Remove all elements and the entire log. Session stop only.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.log.clear();
    }

    pub fn elements(&self) -> &[OverlayElement] {
        &self.elements
    }

    /// Recent log, newest first.
    pub fn log_entries(&self) -> &[String] {
        &self.log
    }

    /// Push the committed state to a presentation surface.
    pub fn present_to(&self, surface: &mut dyn OverlaySurface, sound_active: bool) {
        surface.present(&self.elements, &self.log, sound_active);
    }
}

/// `"label - NN%"`, the shared element/log text format.
pub(crate) fn format_label(label: &str, confidence: f32) -> String {
    format!("{} - {}%", label, (confidence * 100.0).round() as u32)
}
