//! Synthetic camera device for default builds and tests.
//!
//! Streams deterministic pixels whose content shifts every `scene_period`
//! frames, so change-sensitive classifiers see something to report. Streams
//! share a live-track counter with the device that created them, which lets
//! tests assert the single-active-stream invariant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::{FacingMode, FrameStream, MediaDevice};
use crate::frame::Frame;

/// Configuration for the synthetic device.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Frames between scene-content shifts.
    pub scene_period: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            scene_period: 50,
        }
    }
}

pub struct SyntheticDevice {
    config: SyntheticConfig,
    live_tracks: Arc<AtomicUsize>,
    available: bool,
    fail_next: bool,
}

impl SyntheticDevice {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            live_tracks: Arc::new(AtomicUsize::new(0)),
            available: true,
            fail_next: false,
        }
    }

    /// A device that reports no camera hardware at all.
    pub fn unavailable() -> Self {
        let mut device = Self::new(SyntheticConfig::default());
        device.available = false;
        device
    }

    /// Make the next `acquire` fail (permission denied, device busy).
    pub fn fail_next_acquire(&mut self) {
        self.fail_next = true;
    }

    /// Shared count of live tracks across every stream this device handed
    /// out. Clone before boxing the device into a session.
    pub fn live_track_probe(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live_tracks)
    }
}

impl MediaDevice for SyntheticDevice {
    fn is_available(&self) -> bool {
        self.available
    }

    fn acquire(&mut self, facing: FacingMode) -> Result<Box<dyn FrameStream>> {
        if self.fail_next {
            self.fail_next = false;
            return Err(anyhow!("synthetic device: acquisition refused"));
        }
        self.live_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticStream {
            config: self.config.clone(),
            facing,
            frame_count: 0,
            scene_state: 0,
            live: true,
            tracks: Arc::clone(&self.live_tracks),
        }))
    }
}

struct SyntheticStream {
    config: SyntheticConfig,
    facing: FacingMode,
    frame_count: u64,
    scene_state: u8,
    live: bool,
    tracks: Arc<AtomicUsize>,
}

impl SyntheticStream {
    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        if self.config.scene_period > 0 && self.frame_count % self.config.scene_period == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        // Front and rear cameras see different scenes.
        let seed = match self.facing {
            FacingMode::Front => 0u64,
            FacingMode::Rear => 128,
        };
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + seed + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl FrameStream for SyntheticStream {
    fn next_frame(&mut self) -> Result<Frame> {
        if !self.live {
            return Err(anyhow!("synthetic stream: tracks halted"));
        }
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Ok(Frame::new(pixels, self.config.width, self.config.height))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn halt(&mut self) {
        if self.live {
            self.live = false;
            self.tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.halt();
    }
}
