//! The detection-and-render scheduling core.
//!
//! One `tick` is one detection cycle: pull a frame, classify it, rebuild
//! the overlay, maybe fire the alert, and decide whether to keep going.
//! At most one cycle is ever in flight; the in-flight flag is the sole
//! concurrency guard, and the live-stream check at the end of a cycle is
//! the cooperative cancellation point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alert::{AlertThrottle, ToneEmitter, VolumeControl};
use crate::camera::{CameraSession, FacingMode, FrameStream};
use crate::detect::{BoundingBox, Classifier};
use crate::overlay::{self, DisplayBox, OverlayElement, OverlayManager, OverlaySurface};
use crate::WatchError;

/// Tunables for detection acceptance and box projection.
///
/// The threshold and the compensation factors are configuration with the
/// upstream model's values as defaults.
#[derive(Clone, Copy, Debug)]
pub struct DetectionTuning {
    /// Strict lower bound on accepted confidence.
    pub confidence_threshold: f32,
    /// Displayed box height multiplier. The classifier crops subjects
    /// tightly; the displayed box is stretched to compensate.
    pub height_scale: f32,
    /// Fraction of the stretched height the box is shifted upward.
    pub top_offset_ratio: f32,
}

impl Default for DetectionTuning {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.66,
            height_scale: 2.0,
            top_offset_ratio: 0.1,
        }
    }
}

impl DetectionTuning {
    /// Accept strictly above the threshold; at or below is discarded.
    pub fn accepts(&self, confidence: f32) -> bool {
        confidence > self.confidence_threshold
    }

    /// Project a source-frame box into display space.
    pub fn project(&self, bbox: BoundingBox, scale_x: f32, scale_y: f32) -> DisplayBox {
        let height = bbox.height * scale_y * self.height_scale;
        DisplayBox {
            left: bbox.x * scale_x,
            top: bbox.y * scale_y - height * self.top_offset_ratio,
            width: bbox.width * scale_x,
            height,
        }
    }
}

/// Loop pacing and tuning, separate from the collaborators.
#[derive(Clone, Copy, Debug)]
pub struct LoopSettings {
    pub tuning: DetectionTuning,
    /// Throttle window between consecutive alert tones.
    pub min_alert_interval: Duration,
    pub target_fps: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            tuning: DetectionTuning::default(),
            min_alert_interval: Duration::from_millis(1000),
            target_fps: 10,
        }
    }
}

/// What one `tick` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A cycle was already in flight; this invocation did nothing.
    Busy,
    /// No live frame source; the cycle was a no-op.
    Inactive,
    /// The cycle was abandoned (frame capture or classifier failure);
    /// the overlay is untouched.
    Failed,
    /// The cycle completed.
    Completed { accepted: usize, alerted: bool },
}

/// Counters surfaced for health logging and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopStats {
    pub cycles: u64,
    pub skipped: u64,
    pub failed_cycles: u64,
    pub detections_accepted: u64,
    pub alerts_fired: u64,
}

/// Drives detection cycles against a camera session.
pub struct DetectionLoop {
    classifier: Box<dyn Classifier>,
    classifier_ready: bool,
    load_error_reported: bool,
    overlay: OverlayManager,
    surface: Box<dyn OverlaySurface>,
    emitter: ToneEmitter,
    throttle: AlertThrottle,
    volume: VolumeControl,
    settings: LoopSettings,
    in_flight: bool,
    stats: LoopStats,
}

impl DetectionLoop {
    pub fn new(
        classifier: Box<dyn Classifier>,
        surface: Box<dyn OverlaySurface>,
        emitter: ToneEmitter,
        volume: VolumeControl,
        settings: LoopSettings,
    ) -> Self {
        Self {
            classifier,
            classifier_ready: false,
            load_error_reported: false,
            overlay: OverlayManager::new(),
            surface,
            emitter,
            throttle: AlertThrottle::new(settings.min_alert_interval),
            volume,
            settings,
            in_flight: false,
            stats: LoopStats::default(),
        }
    }

    /// Load the classifier. `enable` refuses until this has succeeded.
    ///
    /// A load failure is reported once; repeated attempts stay quiet on the
    /// diagnostic channel but still return the error.
    pub fn load_classifier(&mut self) -> Result<()> {
        match self.classifier.load() {
            Ok(()) => {
                self.classifier_ready = true;
                log::info!("classifier {} ready", self.classifier.name());
                Ok(())
            }
            Err(e) => {
                let err = WatchError::ClassifierLoad(format!("{:#}", e));
                if !self.load_error_reported {
                    log::error!("{}", err);
                    self.load_error_reported = true;
                }
                Err(err.into())
            }
        }
    }

    pub fn classifier_ready(&self) -> bool {
        self.classifier_ready
    }

    /// Start a session. Refused until the classifier is loaded.
    pub fn enable(&mut self, session: &mut CameraSession, facing: FacingMode) -> Result<()> {
        if !self.classifier_ready {
            return Err(WatchError::ClassifierLoad("classifier not loaded".into()).into());
        }
        session.start(facing)
    }

    /// Run one detection cycle.
    ///
    /// Re-entry while a cycle is in flight is skipped, never queued. A
    /// session torn down between scheduling and execution makes the cycle
    /// a no-op.
    pub fn tick(&mut self, session: &mut CameraSession) -> CycleOutcome {
        if self.in_flight {
            self.stats.skipped += 1;
            return CycleOutcome::Busy;
        }
        let Some(stream) = session.stream_mut() else {
            return CycleOutcome::Inactive;
        };
        if !stream.is_live() {
            return CycleOutcome::Inactive;
        }
        self.in_flight = true;
        let outcome = self.run_cycle(stream);
        self.in_flight = false;
        outcome
    }

    fn run_cycle(&mut self, stream: &mut dyn FrameStream) -> CycleOutcome {
        self.stats.cycles += 1;

        // Scale factors are recomputed every cycle: the surface may be
        // resized between frames.
        let (native_w, native_h) = stream.native_size();
        let viewport = self.surface.viewport();
        let scale_x = viewport.width / native_w as f32;
        let scale_y = viewport.height / native_h as f32;

        let frame = match stream.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.failed_cycles += 1;
                log::warn!("{}", WatchError::DetectionCycle(format!("frame capture: {:#}", e)));
                return CycleOutcome::Failed;
            }
        };

        let detections = match self.classifier.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.stats.failed_cycles += 1;
                log::warn!("{}", WatchError::DetectionCycle(format!("classifier: {:#}", e)));
                return CycleOutcome::Failed;
            }
        };

        let mut elements = Vec::new();
        for detection in &detections {
            if !self.settings.tuning.accepts(detection.confidence) {
                continue;
            }
            elements.push(OverlayElement {
                bbox: self.settings.tuning.project(detection.bbox, scale_x, scale_y),
                label: overlay::format_label(&detection.label, detection.confidence),
            });
        }
        let accepted = elements.len();

        self.overlay.render(elements);
        for detection in &detections {
            if self.settings.tuning.accepts(detection.confidence) {
                self.overlay.log_detection(&detection.label, detection.confidence);
            }
        }
        self.stats.detections_accepted += accepted as u64;

        let now = Instant::now();
        let mut alerted = false;
        if accepted > 0 && self.throttle.try_fire(now) {
            // Volume comes from the shared control at play time.
            match self.emitter.play(self.volume.get(), now) {
                Ok(()) => {
                    alerted = true;
                    self.stats.alerts_fired += 1;
                }
                Err(e) => log::warn!("alert pulse failed: {:#}", e),
            }
        }

        self.overlay
            .present_to(self.surface.as_mut(), self.emitter.indicating(Instant::now()));

        CycleOutcome::Completed { accepted, alerted }
    }

    /// Drive cycles until the session is torn down, paced to the target
    /// frame rate. A raised `stop` flag tears the session down; the loop
    /// then self-terminates. Returns the final counters.
    pub fn run(&mut self, session: &mut CameraSession, stop: &AtomicBool) -> LoopStats {
        let frame_interval = Duration::from_millis(1000 / u64::from(self.settings.target_fps.max(1)));
        let mut last_health_log = Instant::now();

        loop {
            if stop.load(Ordering::SeqCst) {
                session.stop();
            }
            if !session.is_active() {
                break;
            }
            self.tick(session);

            if last_health_log.elapsed() >= Duration::from_secs(5) {
                let stats = session.stats();
                log::info!(
                    "session facing={} streams_opened={} cycles={} accepted={} alerts={}",
                    stats.facing.as_str(),
                    stats.streams_opened,
                    self.stats.cycles,
                    self.stats.detections_accepted,
                    self.stats.alerts_fired,
                );
                last_health_log = Instant::now();
            }

            std::thread::sleep(frame_interval);
        }

        self.shutdown();
        self.stats
    }

    /// Clear the overlay and the whole log, and push the empty state to
    /// the surface. Called when the session stops.
    pub fn shutdown(&mut self) {
        self.overlay.clear();
        self.overlay.present_to(self.surface.as_mut(), false);
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Read access to the committed overlay state.
    pub fn overlay(&self) -> &OverlayManager {
        &self.overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_doubles_height_and_recenters_upward() {
        let tuning = DetectionTuning::default();
        let bbox = BoundingBox {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 60.0,
        };

        let display = tuning.project(bbox, 1.0, 1.0);
        assert!((display.height - 120.0).abs() < f32::EPSILON);
        assert!((display.top - (-2.0)).abs() < f32::EPSILON);
        assert!((display.left - 10.0).abs() < f32::EPSILON);
        assert!((display.width - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn projection_applies_scale_factors() {
        let tuning = DetectionTuning::default();
        let bbox = BoundingBox {
            x: 100.0,
            y: 40.0,
            width: 80.0,
            height: 30.0,
        };

        // Display at half the native width, double the native height.
        let display = tuning.project(bbox, 0.5, 2.0);
        assert!((display.left - 50.0).abs() < f32::EPSILON);
        assert!((display.width - 40.0).abs() < f32::EPSILON);
        // height = 30 * 2.0 * 2.0 = 120; top = 40*2 - 12 = 68
        assert!((display.height - 120.0).abs() < f32::EPSILON);
        assert!((display.top - 68.0).abs() < f32::EPSILON);
    }

    #[test]
    fn acceptance_is_strictly_greater_than_threshold() {
        let tuning = DetectionTuning::default();
        assert!(!tuning.accepts(0.66));
        assert!(tuning.accepts(0.661));
        assert!(!tuning.accepts(0.5));
        assert!(tuning.accepts(1.0));
    }
}
