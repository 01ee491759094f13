//! lookoutd - live-camera watch daemon
//!
//! This daemon:
//! 1. Loads configuration (file + environment)
//! 2. Loads the classifier; detection stays disabled until it is ready
//! 3. Starts the camera session and the detection loop
//! 4. Renders overlay state and the recent panel to the terminal
//! 5. Stops cooperatively on ctrl-c (the in-flight cycle finishes first)

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use lookout::{
    facing_from_name, CameraSession, DetectionLoop, LookoutConfig, LoopSettings, PanelMode,
    PulseDevice, StubClassifier, SyntheticConfig, SyntheticDevice, TerminalPanel, ToneEmitter,
    ToneSettings, Viewport, VolumeControl,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Panel output mode: auto, plain, or pretty.
    #[arg(long)]
    ui: Option<String>,
    /// Override the configured facing mode (front|rear).
    #[arg(long)]
    facing: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = LookoutConfig::load()?;
    let facing = match args.facing.as_deref() {
        Some(name) => facing_from_name(name)?,
        None => cfg.camera.facing,
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let device = SyntheticDevice::new(SyntheticConfig {
        width: cfg.camera.width,
        height: cfg.camera.height,
        ..SyntheticConfig::default()
    });
    let mut session = CameraSession::new(Box::new(device), facing);

    let panel = TerminalPanel::new(
        PanelMode::from_flag(args.ui.as_deref()),
        Viewport {
            width: cfg.viewport.width,
            height: cfg.viewport.height,
        },
        std::io::stderr().is_terminal(),
    );

    let volume = VolumeControl::new(cfg.alert.volume);
    let emitter = ToneEmitter::new(
        pulse_device()?,
        ToneSettings {
            frequency_hz: cfg.alert.frequency_hz,
            pulse: cfg.alert.pulse,
        },
    );

    let mut detection = DetectionLoop::new(
        Box::new(StubClassifier::motion()),
        Box::new(panel),
        emitter,
        volume.clone(),
        LoopSettings {
            tuning: cfg.detection,
            min_alert_interval: cfg.alert.min_interval,
            target_fps: cfg.camera.target_fps,
        },
    );

    detection.load_classifier()?;
    detection.enable(&mut session, facing)?;

    log::info!(
        "lookoutd running. facing={} fps={} volume={}%",
        facing.as_str(),
        cfg.camera.target_fps,
        volume.percent(),
    );

    let stats = detection.run(&mut session, &stop);
    log::info!(
        "stopped. cycles={} skipped={} failed={} accepted={} alerts={}",
        stats.cycles,
        stats.skipped,
        stats.failed_cycles,
        stats.detections_accepted,
        stats.alerts_fired,
    );
    Ok(())
}

#[cfg(feature = "alert-rodio")]
fn pulse_device() -> Result<Box<dyn PulseDevice>> {
    Ok(Box::new(lookout::RodioPulse::new()?))
}

#[cfg(not(feature = "alert-rodio"))]
fn pulse_device() -> Result<Box<dyn PulseDevice>> {
    Ok(Box::new(lookout::StubPulse::new()))
}
