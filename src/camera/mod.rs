//! Camera acquisition and session lifecycle.
//!
//! The media subsystem is an external collaborator behind the `MediaDevice`
//! seam. A session owns at most one live stream:
//! - `start` tears down any active stream before acquiring a new one
//! - `stop` halts every underlying track and is idempotent
//! - switching facing modes recreates the stream from scratch
//!
//! Acquisition failure leaves the session idle; retrying is the caller's
//! decision.

mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticDevice};

use anyhow::Result;

use crate::frame::Frame;
use crate::WatchError;

/// Which physical camera supplies frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    Front,
    Rear,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Rear,
            FacingMode::Rear => FacingMode::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Front => "front",
            FacingMode::Rear => "rear",
        }
    }
}

/// Parse a facing mode from its configuration name.
pub fn facing_from_name(name: &str) -> Result<FacingMode> {
    match name.trim().to_lowercase().as_str() {
        "front" => Ok(FacingMode::Front),
        "rear" => Ok(FacingMode::Rear),
        other => Err(anyhow::anyhow!(
            "facing mode must be \"front\" or \"rear\", got {:?}",
            other
        )),
    }
}

/// A live media stream: a frame source plus its underlying tracks.
pub trait FrameStream: Send {
    /// Pull the next frame, in classifier-native resolution.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Native frame dimensions (width, height).
    fn native_size(&self) -> (u32, u32);

    /// Stop every underlying track. Further `next_frame` calls fail.
    fn halt(&mut self);

    /// True while the underlying tracks are running.
    fn is_live(&self) -> bool;
}

/// Media acquisition seam: `acquire(facing) -> stream | failure`.
pub trait MediaDevice: Send {
    /// True when the host can supply camera streams at all.
    fn is_available(&self) -> bool {
        true
    }

    fn acquire(&mut self, facing: FacingMode) -> Result<Box<dyn FrameStream>>;
}

/// Session counters surfaced for health logging.
#[derive(Clone, Copy, Debug)]
pub struct SessionStats {
    pub facing: FacingMode,
    pub active: bool,
    pub streams_opened: u64,
}

/// Owns the lifecycle of the single live camera stream.
pub struct CameraSession {
    device: Box<dyn MediaDevice>,
    stream: Option<Box<dyn FrameStream>>,
    facing: FacingMode,
    streams_opened: u64,
}

impl CameraSession {
    pub fn new(device: Box<dyn MediaDevice>, facing: FacingMode) -> Self {
        Self {
            device,
            stream: None,
            facing,
            streams_opened: 0,
        }
    }

    /// Acquire a stream with the requested facing mode.
    ///
    /// Teardown-before-create: any active stream is stopped first, so two
    /// streams never coexist. On acquisition failure the session is idle.
    pub fn start(&mut self, facing: FacingMode) -> Result<()> {
        if !self.device.is_available() {
            return Err(WatchError::MediaAcquisition("no media device available".into()).into());
        }
        self.stop();
        self.facing = facing;
        match self.device.acquire(facing) {
            Ok(stream) => {
                self.streams_opened += 1;
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => Err(WatchError::MediaAcquisition(format!("{:#}", e)).into()),
        }
    }

    /// Halt all underlying tracks and clear the frame source. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.halt();
        }
    }

    /// Toggle front/rear and restart the stream.
    pub fn switch_facing(&mut self) -> Result<()> {
        self.start(self.facing.toggled())
    }

    pub fn is_active(&self) -> bool {
        self.stream.as_ref().map(|s| s.is_live()).unwrap_or(false)
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn stream_mut(&mut self) -> Option<&mut (dyn FrameStream + 'static)> {
        self.stream.as_deref_mut()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            facing: self.facing,
            active: self.is_active(),
            streams_opened: self.streams_opened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_session() -> (CameraSession, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let device = SyntheticDevice::new(SyntheticConfig::default());
        let probe = device.live_track_probe();
        (CameraSession::new(Box::new(device), FacingMode::Front), probe)
    }

    #[test]
    fn start_tears_down_before_creating() -> Result<()> {
        let (mut session, probe) = synthetic_session();

        session.start(FacingMode::Front)?;
        session.start(FacingMode::Front)?;
        session.start(FacingMode::Rear)?;

        assert_eq!(probe.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(session.is_active());
        assert_eq!(session.stats().streams_opened, 3);
        Ok(())
    }

    #[test]
    fn stop_is_idempotent_and_leaks_nothing() -> Result<()> {
        let (mut session, probe) = synthetic_session();

        session.start(FacingMode::Front)?;
        session.stop();
        session.stop();

        assert_eq!(probe.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert!(!session.is_active());
        Ok(())
    }

    #[test]
    fn switch_facing_toggles_and_restarts() -> Result<()> {
        let (mut session, probe) = synthetic_session();

        session.start(FacingMode::Front)?;
        session.switch_facing()?;

        assert_eq!(session.facing(), FacingMode::Rear);
        assert_eq!(probe.load(std::sync::atomic::Ordering::SeqCst), 1);

        session.switch_facing()?;
        assert_eq!(session.facing(), FacingMode::Front);
        Ok(())
    }

    #[test]
    fn acquisition_failure_leaves_session_idle() {
        let mut device = SyntheticDevice::new(SyntheticConfig::default());
        device.fail_next_acquire();
        let mut session = CameraSession::new(Box::new(device), FacingMode::Front);

        let err = session.start(FacingMode::Front).unwrap_err();
        assert!(err.to_string().contains("media acquisition failed"));
        assert!(!session.is_active());

        // The failure is recoverable: the next attempt succeeds.
        session.start(FacingMode::Front).expect("retry");
        assert!(session.is_active());
    }

    #[test]
    fn unavailable_device_refuses_start() {
        let device = SyntheticDevice::unavailable();
        let mut session = CameraSession::new(Box::new(device), FacingMode::Front);

        assert!(session.start(FacingMode::Front).is_err());
        assert!(!session.is_active());
    }

    #[test]
    fn facing_names_round_trip() {
        assert_eq!(facing_from_name("front").unwrap(), FacingMode::Front);
        assert_eq!(facing_from_name(" Rear ").unwrap(), FacingMode::Rear);
        assert!(facing_from_name("sideways").is_err());
    }
}
