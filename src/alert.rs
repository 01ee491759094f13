//! Audible alert path: pulse-device seam, tone emitter, throttle, volume.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

/// Oscillator-primitive seam: emits one short pulse at a given gain.
pub trait PulseDevice: Send {
    /// Bring the device out of a suspended state. Called once before the
    /// first pulse of a session.
    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drive `frequency` Hz at `volume` gain for `duration`, then silence.
    fn pulse(&mut self, frequency: f32, volume: f32, duration: Duration) -> Result<()>;
}

/// One recorded stub pulse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseRecord {
    pub frequency: f32,
    pub volume: f32,
    pub duration: Duration,
}

/// Recording pulse device for tests and stub builds.
pub struct StubPulse {
    log: Arc<Mutex<Vec<PulseRecord>>>,
}

impl StubPulse {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded pulses. Clone before boxing the
    /// device into an emitter.
    pub fn log_handle(&self) -> Arc<Mutex<Vec<PulseRecord>>> {
        Arc::clone(&self.log)
    }
}

impl Default for StubPulse {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseDevice for StubPulse {
    fn pulse(&mut self, frequency: f32, volume: f32, duration: Duration) -> Result<()> {
        self.log
            .lock()
            .map_err(|_| anyhow!("stub pulse log lock poisoned"))?
            .push(PulseRecord {
                frequency,
                volume,
                duration,
            });
        Ok(())
    }
}

/// Pulse device backed by an audio output stream.
#[cfg(feature = "alert-rodio")]
pub struct RodioPulse {
    // The stream must stay alive for as long as pulses play.
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
}

#[cfg(feature = "alert-rodio")]
impl RodioPulse {
    pub fn new() -> Result<Self> {
        let (stream, handle) = rodio::OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

#[cfg(feature = "alert-rodio")]
impl PulseDevice for RodioPulse {
    fn pulse(&mut self, frequency: f32, volume: f32, duration: Duration) -> Result<()> {
        use rodio::source::{SineWave, Source};

        let sink = rodio::Sink::try_new(&self.handle)?;
        sink.append(SineWave::new(frequency).take_duration(duration).amplify(volume));
        sink.detach();
        Ok(())
    }
}

/// Shared alert volume in `0..=1`.
///
/// Read at play time, never cached: a change takes effect on the very next
/// pulse.
#[derive(Clone)]
pub struct VolumeControl(Arc<AtomicU32>);

impl VolumeControl {
    pub fn new(initial: f32) -> Self {
        let control = Self(Arc::new(AtomicU32::new(0)));
        control.set(initial);
        control
    }

    pub fn set(&self, volume: f32) {
        self.0
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::SeqCst);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::SeqCst))
    }

    /// Percentage rendering for the volume control display.
    pub fn percent(&self) -> u8 {
        (self.get() * 100.0).round() as u8
    }
}

/// Settings for the audible alert pulse.
#[derive(Clone, Copy, Debug)]
pub struct ToneSettings {
    pub frequency_hz: f32,
    pub pulse: Duration,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            pulse: Duration::from_millis(100),
        }
    }
}

/// Wraps the pulse device: a fixed short pulse plus a transient
/// "sound active" indicator covering the same window.
pub struct ToneEmitter {
    device: Box<dyn PulseDevice>,
    settings: ToneSettings,
    resumed: bool,
    indicator_until: Option<Instant>,
}

impl ToneEmitter {
    pub fn new(device: Box<dyn PulseDevice>, settings: ToneSettings) -> Self {
        Self {
            device,
            settings,
            resumed: false,
            indicator_until: None,
        }
    }

    /// Emit one pulse at `volume`, clamped to `0..=1`.
    pub fn play(&mut self, volume: f32, now: Instant) -> Result<()> {
        if !self.resumed {
            self.device.resume()?;
            self.resumed = true;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.device
            .pulse(self.settings.frequency_hz, volume, self.settings.pulse)?;
        self.indicator_until = Some(now + self.settings.pulse);
        Ok(())
    }

    /// True while the sound indicator should be shown.
    pub fn indicating(&self, now: Instant) -> bool {
        self.indicator_until.map(|until| now < until).unwrap_or(false)
    }
}

/// Minimum spacing between consecutive alert tones.
pub struct AlertThrottle {
    min_interval: Duration,
    last_alert: Option<Instant>,
}

impl AlertThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_alert: None,
        }
    }

    /// True when the window has elapsed (strictly); records `now` as the
    /// last alert instant on success.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        match self.last_alert {
            Some(last) if now.duration_since(last) <= self.min_interval => false,
            _ => {
                self.last_alert = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_enforces_strict_spacing() {
        let mut throttle = AlertThrottle::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(throttle.try_fire(t0));
        assert!(!throttle.try_fire(t0 + Duration::from_millis(500)));
        // Exactly the window is still too soon; strictly greater fires.
        assert!(!throttle.try_fire(t0 + Duration::from_millis(1000)));
        assert!(throttle.try_fire(t0 + Duration::from_millis(1001)));
        assert!(!throttle.try_fire(t0 + Duration::from_millis(1900)));
        assert!(throttle.try_fire(t0 + Duration::from_millis(2002)));
    }

    #[test]
    fn first_alert_is_never_throttled() {
        let mut throttle = AlertThrottle::new(Duration::from_secs(60));
        assert!(throttle.try_fire(Instant::now()));
    }

    #[test]
    fn volume_is_clamped_and_rendered_as_percent() {
        let volume = VolumeControl::new(0.1);
        assert_eq!(volume.percent(), 10);

        volume.set(1.5);
        assert_eq!(volume.get(), 1.0);

        volume.set(-0.3);
        assert_eq!(volume.get(), 0.0);

        volume.set(0.666);
        assert_eq!(volume.percent(), 67);
    }

    #[test]
    fn emitter_pulses_and_indicates_for_the_pulse_window() -> Result<()> {
        let device = StubPulse::new();
        let log = device.log_handle();
        let mut emitter = ToneEmitter::new(Box::new(device), ToneSettings::default());

        let t0 = Instant::now();
        emitter.play(0.4, t0)?;

        let pulses = log.lock().unwrap();
        assert_eq!(pulses.len(), 1);
        assert_eq!(pulses[0].frequency, 440.0);
        assert_eq!(pulses[0].volume, 0.4);
        assert_eq!(pulses[0].duration, Duration::from_millis(100));

        assert!(emitter.indicating(t0 + Duration::from_millis(50)));
        assert!(!emitter.indicating(t0 + Duration::from_millis(100)));
        Ok(())
    }

    #[test]
    fn emitter_clamps_volume_at_play_time() -> Result<()> {
        let device = StubPulse::new();
        let log = device.log_handle();
        let mut emitter = ToneEmitter::new(Box::new(device), ToneSettings::default());

        emitter.play(2.0, Instant::now())?;
        assert_eq!(log.lock().unwrap()[0].volume, 1.0);
        Ok(())
    }
}
