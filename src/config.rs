use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::camera::{facing_from_name, FacingMode};
use crate::pipeline::DetectionTuning;

const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_VIEWPORT_WIDTH: f32 = 640.0;
const DEFAULT_VIEWPORT_HEIGHT: f32 = 480.0;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.66;
const DEFAULT_HEIGHT_SCALE: f32 = 2.0;
const DEFAULT_TOP_OFFSET_RATIO: f32 = 0.1;
const DEFAULT_ALERT_INTERVAL_MS: u64 = 1000;
const DEFAULT_PULSE_MS: u64 = 100;
const DEFAULT_FREQUENCY_HZ: f32 = 440.0;
const DEFAULT_VOLUME: f32 = 0.1;

#[derive(Debug, Deserialize, Default)]
struct LookoutConfigFile {
    camera: Option<CameraConfigFile>,
    viewport: Option<ViewportConfigFile>,
    detection: Option<DetectionConfigFile>,
    alert: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    facing: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ViewportConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    confidence_threshold: Option<f32>,
    height_scale: Option<f32>,
    top_offset_ratio: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    min_interval_ms: Option<u64>,
    pulse_ms: Option<u64>,
    frequency_hz: Option<f32>,
    volume: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct LookoutConfig {
    pub camera: CameraSettings,
    pub viewport: ViewportSettings,
    pub detection: DetectionTuning,
    pub alert: AlertSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub facing: FacingMode,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewportSettings {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub min_interval: Duration,
    pub pulse: Duration,
    pub frequency_hz: f32,
    pub volume: f32,
}

impl LookoutConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LOOKOUT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LookoutConfigFile) -> Result<Self> {
        let facing = match file.camera.as_ref().and_then(|camera| camera.facing.clone()) {
            Some(name) => facing_from_name(&name)?,
            None => FacingMode::Front,
        };
        let camera = CameraSettings {
            facing,
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_FRAME_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let viewport = ViewportSettings {
            width: file
                .viewport
                .as_ref()
                .and_then(|viewport| viewport.width)
                .unwrap_or(DEFAULT_VIEWPORT_WIDTH),
            height: file
                .viewport
                .as_ref()
                .and_then(|viewport| viewport.height)
                .unwrap_or(DEFAULT_VIEWPORT_HEIGHT),
        };
        let detection = DetectionTuning {
            confidence_threshold: file
                .detection
                .as_ref()
                .and_then(|detection| detection.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            height_scale: file
                .detection
                .as_ref()
                .and_then(|detection| detection.height_scale)
                .unwrap_or(DEFAULT_HEIGHT_SCALE),
            top_offset_ratio: file
                .detection
                .as_ref()
                .and_then(|detection| detection.top_offset_ratio)
                .unwrap_or(DEFAULT_TOP_OFFSET_RATIO),
        };
        let alert = AlertSettings {
            min_interval: Duration::from_millis(
                file.alert
                    .as_ref()
                    .and_then(|alert| alert.min_interval_ms)
                    .unwrap_or(DEFAULT_ALERT_INTERVAL_MS),
            ),
            pulse: Duration::from_millis(
                file.alert
                    .as_ref()
                    .and_then(|alert| alert.pulse_ms)
                    .unwrap_or(DEFAULT_PULSE_MS),
            ),
            frequency_hz: file
                .alert
                .as_ref()
                .and_then(|alert| alert.frequency_hz)
                .unwrap_or(DEFAULT_FREQUENCY_HZ),
            volume: file
                .alert
                .and_then(|alert| alert.volume)
                .unwrap_or(DEFAULT_VOLUME),
        };
        Ok(Self {
            camera,
            viewport,
            detection,
            alert,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = std::env::var("LOOKOUT_FACING") {
            if !name.trim().is_empty() {
                self.camera.facing = facing_from_name(&name)?;
            }
        }
        if let Ok(fps) = std::env::var("LOOKOUT_TARGET_FPS") {
            let fps: u32 = fps
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_TARGET_FPS must be an integer"))?;
            self.camera.target_fps = fps;
        }
        if let Ok(volume) = std::env::var("LOOKOUT_VOLUME") {
            let volume: f32 = volume
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_VOLUME must be a number in [0, 1]"))?;
            self.alert.volume = volume;
        }
        if let Ok(interval) = std::env::var("LOOKOUT_ALERT_INTERVAL_MS") {
            let ms: u64 = interval
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_ALERT_INTERVAL_MS must be an integer number of milliseconds"))?;
            self.alert.min_interval = Duration::from_millis(ms);
        }
        if let Ok(threshold) = std::env::var("LOOKOUT_CONFIDENCE_THRESHOLD") {
            let threshold: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("LOOKOUT_CONFIDENCE_THRESHOLD must be a number"))?;
            self.detection.confidence_threshold = threshold;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be at least 1"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be non-zero"));
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(anyhow!("viewport dimensions must be positive"));
        }
        if !(0.0..1.0).contains(&self.detection.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be in [0, 1)"));
        }
        if self.detection.height_scale <= 0.0 {
            return Err(anyhow!("height_scale must be positive"));
        }
        if !(0.0..=1.0).contains(&self.detection.top_offset_ratio) {
            return Err(anyhow!("top_offset_ratio must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.alert.volume) {
            return Err(anyhow!("alert volume must be in [0, 1]"));
        }
        if self.alert.min_interval.is_zero() {
            return Err(anyhow!("alert min_interval must be greater than zero"));
        }
        if self.alert.pulse.is_zero() {
            return Err(anyhow!("alert pulse must be greater than zero"));
        }
        if self.alert.frequency_hz <= 0.0 {
            return Err(anyhow!("alert frequency must be positive"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<LookoutConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
