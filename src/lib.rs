//! Live-camera object watch.
//!
//! This crate drives a camera feed through a pretrained object detector and
//! keeps a bounding-box overlay current in near-real time, with a throttled
//! audible alert whenever something qualifying is seen.
//!
//! # Loop discipline
//!
//! The detection loop enforces three invariants by construction:
//!
//! 1. **Single active cycle**: at most one classifier invocation is ever in
//!    flight; re-entrant ticks are skipped, never queued.
//! 2. **Overlay mirrors the latest cycle**: every render replaces the
//!    displayed element set wholesale; no stale boxes survive a cycle.
//! 3. **Throttled alerts**: two tones are never emitted closer together
//!    than the configured minimum interval.
//!
//! # Module Structure
//!
//! - `camera`: session lifecycle over the media-acquisition seam
//! - `detect`: the classifier seam and its result types
//! - `pipeline`: the detection loop (scheduling, scaling, alert throttle)
//! - `overlay`: render-model elements and the bounded recent log
//! - `alert`: tone emitter, pulse-device seam, shared volume control
//! - `panel`: terminal presentation surface
//! - `config`: file + environment configuration

use std::fmt;

pub mod alert;
pub mod camera;
pub mod config;
pub mod detect;
pub mod frame;
pub mod overlay;
pub mod panel;
pub mod pipeline;

#[cfg(feature = "alert-rodio")]
pub use alert::RodioPulse;
pub use alert::{AlertThrottle, PulseDevice, PulseRecord, StubPulse, ToneEmitter, ToneSettings, VolumeControl};
pub use camera::{
    facing_from_name, CameraSession, FacingMode, FrameStream, MediaDevice, SessionStats,
    SyntheticConfig, SyntheticDevice,
};
pub use config::{AlertSettings, CameraSettings, LookoutConfig, ViewportSettings};
pub use detect::{BoundingBox, Classifier, Detection, StubClassifier};
pub use frame::Frame;
pub use overlay::{
    DisplayBox, NullSurface, OverlayElement, OverlayManager, OverlaySurface, Viewport,
    RECENT_LOG_CAPACITY,
};
pub use panel::{PanelMode, TerminalPanel};
pub use pipeline::{CycleOutcome, DetectionLoop, DetectionTuning, LoopSettings, LoopStats};

/// Error taxonomy for the watch pipeline.
///
/// Variants carry behavioral weight, not just labels:
/// - `ClassifierLoad` is fatal to detection-enablement; `enable` keeps
///   refusing until a load succeeds.
/// - `MediaAcquisition` is recoverable; the session stays idle and the
///   caller may retry.
/// - `DetectionCycle` abandons a single cycle; the loop continues on the
///   next tick with the overlay untouched.
#[derive(Clone, Debug)]
pub enum WatchError {
    ClassifierLoad(String),
    MediaAcquisition(String),
    DetectionCycle(String),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchError::ClassifierLoad(msg) => write!(f, "classifier load failed: {}", msg),
            WatchError::MediaAcquisition(msg) => write!(f, "media acquisition failed: {}", msg),
            WatchError::DetectionCycle(msg) => write!(f, "detection cycle abandoned: {}", msg),
        }
    }
}

impl std::error::Error for WatchError {}
