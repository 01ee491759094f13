//! demo - end-to-end synthetic run of the watch pipeline

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use lookout::{
    BoundingBox, CameraSession, CycleOutcome, Detection, DetectionLoop, FacingMode, LoopSettings,
    PanelMode, StubClassifier, StubPulse, SyntheticConfig, SyntheticDevice, TerminalPanel,
    ToneEmitter, ToneSettings, Viewport, VolumeControl,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of detection cycles to run.
    #[arg(long, default_value_t = 40)]
    cycles: u64,
    /// Alert volume in [0, 1].
    #[arg(long, default_value_t = 0.1)]
    volume: f32,
    /// Exercise a facing-mode switch halfway through.
    #[arg(long)]
    switch_facing: bool,
    /// Milliseconds between cycles.
    #[arg(long, default_value_t = 25)]
    interval_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.cycles == 0 {
        return Err(anyhow::anyhow!("cycles must be >= 1"));
    }

    stage("load classifier");
    let classifier = StubClassifier::scripted(scripted_detections(args.cycles));

    let pulse = StubPulse::new();
    let pulse_log = pulse.log_handle();
    let emitter = ToneEmitter::new(Box::new(pulse), ToneSettings::default());
    let volume = VolumeControl::new(args.volume);

    let panel = TerminalPanel::new(
        PanelMode::Plain,
        Viewport {
            width: 640.0,
            height: 480.0,
        },
        false,
    );

    let mut detection = DetectionLoop::new(
        Box::new(classifier),
        Box::new(panel),
        emitter,
        volume,
        LoopSettings::default(),
    );
    detection.load_classifier()?;

    stage("start camera session");
    let device = SyntheticDevice::new(SyntheticConfig::default());
    let mut session = CameraSession::new(Box::new(device), FacingMode::Front);
    detection.enable(&mut session, FacingMode::Front)?;

    stage("run detection cycles");
    let mut completed = 0u64;
    for cycle in 0..args.cycles {
        if args.switch_facing && cycle == args.cycles / 2 {
            session.switch_facing()?;
            eprintln!("demo: switched facing to {}", session.facing().as_str());
        }
        if let CycleOutcome::Completed { .. } = detection.tick(&mut session) {
            completed += 1;
        }
        std::thread::sleep(Duration::from_millis(args.interval_ms));
    }

    stage("stop session");
    session.stop();
    detection.shutdown();

    let stats = detection.stats();
    let pulses = pulse_log.lock().expect("pulse log").len();
    println!("demo summary:");
    println!("  cycles requested: {}", args.cycles);
    println!("  cycles completed: {}", completed);
    println!("  detections accepted: {}", stats.detections_accepted);
    println!("  alerts fired: {}", stats.alerts_fired);
    println!("  tone pulses recorded: {}", pulses);
    println!("next steps:");
    println!("  RUST_LOG=debug cargo run --bin lookoutd");
    println!("  cargo run --bin demo -- --cycles 80 --switch-facing");

    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

/// One scripted result list per cycle: a strong detection every few
/// cycles, low-confidence clutter in between.
fn scripted_detections(cycles: u64) -> Vec<Vec<Detection>> {
    (0..cycles)
        .map(|cycle| {
            if cycle % 5 == 0 {
                vec![Detection::new(
                    "person",
                    0.91,
                    BoundingBox {
                        x: 120.0,
                        y: 80.0,
                        width: 160.0,
                        height: 240.0,
                    },
                )]
            } else if cycle % 7 == 0 {
                vec![Detection::new(
                    "cat",
                    0.88,
                    BoundingBox {
                        x: 40.0,
                        y: 300.0,
                        width: 90.0,
                        height: 70.0,
                    },
                )]
            } else {
                vec![Detection::new(
                    "chair",
                    0.31,
                    BoundingBox {
                        x: 500.0,
                        y: 200.0,
                        width: 100.0,
                        height: 150.0,
                    },
                )]
            }
        })
        .collect()
}
