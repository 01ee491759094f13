use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use lookout::{FacingMode, LookoutConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LOOKOUT_CONFIG",
        "LOOKOUT_FACING",
        "LOOKOUT_TARGET_FPS",
        "LOOKOUT_VOLUME",
        "LOOKOUT_ALERT_INTERVAL_MS",
        "LOOKOUT_CONFIDENCE_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "facing": "rear",
            "target_fps": 12,
            "width": 800,
            "height": 600
        },
        "viewport": {
            "width": 400.0,
            "height": 300.0
        },
        "detection": {
            "confidence_threshold": 0.5,
            "height_scale": 1.5,
            "top_offset_ratio": 0.2
        },
        "alert": {
            "min_interval_ms": 2000,
            "pulse_ms": 150,
            "frequency_hz": 880.0,
            "volume": 0.25
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("LOOKOUT_CONFIG", file.path());
    std::env::set_var("LOOKOUT_FACING", "front");
    std::env::set_var("LOOKOUT_VOLUME", "0.5");

    let cfg = LookoutConfig::load().expect("load config");

    assert_eq!(cfg.camera.facing, FacingMode::Front);
    assert_eq!(cfg.camera.target_fps, 12);
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.viewport.width, 400.0);
    assert_eq!(cfg.viewport.height, 300.0);
    assert_eq!(cfg.detection.confidence_threshold, 0.5);
    assert_eq!(cfg.detection.height_scale, 1.5);
    assert_eq!(cfg.detection.top_offset_ratio, 0.2);
    assert_eq!(cfg.alert.min_interval, Duration::from_millis(2000));
    assert_eq!(cfg.alert.pulse, Duration::from_millis(150));
    assert_eq!(cfg.alert.frequency_hz, 880.0);
    assert_eq!(cfg.alert.volume, 0.5);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LookoutConfig::load().expect("load defaults");

    assert_eq!(cfg.camera.facing, FacingMode::Front);
    assert_eq!(cfg.camera.target_fps, 10);
    assert_eq!(cfg.detection.confidence_threshold, 0.66);
    assert_eq!(cfg.detection.height_scale, 2.0);
    assert_eq!(cfg.detection.top_offset_ratio, 0.1);
    assert_eq!(cfg.alert.min_interval, Duration::from_millis(1000));
    assert_eq!(cfg.alert.pulse, Duration::from_millis(100));
    assert_eq!(cfg.alert.volume, 0.1);

    clear_env();
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LOOKOUT_CONFIDENCE_THRESHOLD", "1.5");
    let err = LookoutConfig::load().unwrap_err();
    assert!(err.to_string().contains("confidence_threshold"));

    clear_env();
}

#[test]
fn invalid_facing_name_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LOOKOUT_FACING", "sideways");
    assert!(LookoutConfig::load().is_err());

    clear_env();
}

#[test]
fn zero_alert_interval_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LOOKOUT_ALERT_INTERVAL_MS", "0");
    assert!(LookoutConfig::load().is_err());

    clear_env();
}
