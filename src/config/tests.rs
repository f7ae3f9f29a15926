use super::CaptureConfig;

#[test]
fn defaults_are_valid() {
    CaptureConfig::default().validate().expect("defaults should pass validation");
}

#[test]
fn default_chunk_covers_100ms_at_16k() {
    let cfg = CaptureConfig::default();
    assert_eq!(cfg.chunk_samples(), 1600);
    assert_eq!(cfg.calibration_chunks(), 5);
}

#[test]
fn rejects_stereo_capture() {
    let cfg = CaptureConfig {
        channels: 2,
        ..CaptureConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("mono"), "got: {err}");
}

#[test]
fn rejects_out_of_range_chunk() {
    for chunk_ms in [0, 5, 501] {
        let cfg = CaptureConfig {
            chunk_ms,
            ..CaptureConfig::default()
        };
        assert!(cfg.validate().is_err(), "chunk_ms={chunk_ms} should fail");
    }
}

#[test]
fn rejects_min_duration_above_max() {
    let cfg = CaptureConfig {
        min_duration_ms: 61_000,
        ..CaptureConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_cutoffs_outside_band() {
    let inverted = CaptureConfig {
        lowpass_hz: 50.0,
        ..CaptureConfig::default()
    };
    assert!(inverted.validate().is_err());

    let above_nyquist = CaptureConfig {
        lowpass_hz: 9_000.0,
        ..CaptureConfig::default()
    };
    assert!(above_nyquist.validate().is_err());
}

#[test]
fn rejects_denoise_strength_above_one() {
    let cfg = CaptureConfig {
        denoise_strength: 1.2,
        ..CaptureConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn round_trips_through_serde() {
    let cfg = CaptureConfig::default();
    let json = serde_json::to_string(&cfg).expect("serialize");
    let back: CaptureConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.sample_rate, cfg.sample_rate);
    assert_eq!(back.trailing_silence_ms, cfg.trailing_silence_ms);
    assert_eq!(back.calibrate, cfg.calibrate);
}

#[test]
fn partial_config_fills_defaults() {
    let cfg: CaptureConfig =
        serde_json::from_str(r#"{"max_duration_ms": 30000}"#).expect("deserialize");
    assert_eq!(cfg.max_duration_ms, 30_000);
    assert_eq!(cfg.sample_rate, 16_000);
    assert_eq!(cfg.chunk_ms, 100);
}
