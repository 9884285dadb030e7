use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use synheart_motor::encoder::{FeatureBundle, PayloadStatus};
use synheart_motor::schema::Wrists;
use synheart_motor::types::{GyroRecording, Hand, HandRole, KeyEvent};
use synheart_motor::{
    tapping_features, wearable_features, AnalysisConfig, MotorProcessor, TappingRecord, WearableRecord,
};

fn qp_only_config(windows_ms: Vec<i64>) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.windows_ms = windows_ms;
    config.protocols.truncate(1);
    config
}

#[test]
fn two_target_stream_yields_expected_flight_times() {
    let events: Vec<KeyEvent> = serde_json::from_str(
        r#"[{"k":80,"p":1,"e":0},{"k":80,"p":0,"e":100},{"k":81,"p":1,"e":520},
            {"k":81,"p":0,"e":600},{"k":80,"p":1,"e":1020},{"k":80,"p":0,"e":1100}]"#,
    )
    .unwrap();
    let record = TappingRecord {
        subject_id: "HC100".to_string(),
        hand: Hand::Right,
        side: None,
        streams: BTreeMap::from([("0".to_string(), events.clone()), ("1".to_string(), events)]),
    };

    let bundle = tapping_features(&record, &qp_only_config(vec![2000])).unwrap();
    let window = bundle
        .hand("qp", HandRole::Dominant)
        .and_then(|h| h.window(2000))
        .unwrap();

    assert_eq!(window.taps, 2);
    assert_eq!(window.errors, Some(0.0));
    assert_eq!(window.flight.mean, Some(500.0));
    assert_eq!(window.flight.outliers, 0);
    assert_eq!(window.accuracy, Some(1.0));
    // Identical hands are perfectly symmetric
    assert_eq!(bundle.asymmetry[0].flight.slope, Some(0.0));
}

#[test]
fn sinusoidal_rotation_round_trip() {
    let fs = 400.0;
    let freq = 2.0;
    let amplitude = 30.0;
    let omega = 2.0 * PI * freq;
    let timestamps: Vec<f64> = (0..(fs * 5.0) as usize).map(|i| i as f64 / fs).collect();
    let angular_velocity = timestamps
        .iter()
        .map(|t| amplitude * omega * (omega * t + 0.3).cos())
        .collect();

    let record = WearableRecord {
        subject_id: "PD020ON".to_string(),
        hand: Hand::Left,
        side: Some(3),
        wrists: Wrists {
            left: Some(GyroRecording {
                timestamps,
                angular_velocity,
                sample_rate: fs,
            }),
            right: None,
        },
    };

    let config = AnalysisConfig::default();
    let bundle = wearable_features(&record, None, &config).unwrap();
    let left = bundle.hand(Hand::Left).unwrap();

    assert!(left.affected);
    assert!(left.movements >= 15);
    let mean_amplitude = left.amplitude.mean.unwrap();
    assert!((mean_amplitude - 2.0 * amplitude).abs() < 0.5, "amplitude {mean_amplitude}");
    assert!(left.period_variance.unwrap() < 1e-4);

    let grid = config.wearable.cwt.frequency_grid(fs);
    let bin_width = grid[1] - grid[0];
    let dominant = left.dominant_frequency.unwrap();
    assert!((dominant - freq).abs() <= bin_width, "dominant {dominant}");
    assert!((left.main_frequency.unwrap() - freq).abs() < 1e-9);
}

#[test]
fn dominant_frequency_lands_within_one_bin_at_100_hz() {
    let fs = 100.0;
    let freq = 2.0;
    let omega = 2.0 * PI * freq;
    let timestamps: Vec<f64> = (0..(fs * 20.0) as usize).map(|i| i as f64 / fs).collect();
    let angular_velocity = timestamps
        .iter()
        .map(|t| 45.0 * omega * (omega * t + 0.3).cos())
        .collect();

    let record = WearableRecord {
        subject_id: "HC044".to_string(),
        hand: Hand::Right,
        side: None,
        wrists: Wrists {
            left: None,
            right: Some(GyroRecording {
                timestamps,
                angular_velocity,
                sample_rate: fs,
            }),
        },
    };

    let config = AnalysisConfig::default();
    let bundle = wearable_features(&record, None, &config).unwrap();
    let right = bundle.hand(Hand::Right).unwrap();

    let grid = config.wearable.cwt.frequency_grid(fs);
    let bin_width = grid[1] - grid[0];
    let dominant = right.dominant_frequency.unwrap();
    assert!((dominant - freq).abs() <= bin_width, "dominant {dominant}, bin {bin_width}");
    assert!((right.main_frequency.unwrap() - freq).abs() < 1e-9);
}

#[test]
fn processor_round_trips_ndjson() {
    let config = AnalysisConfig::from_json(r#"{"windows_ms": [10000, 20000]}"#).unwrap();
    let processor = MotorProcessor::new(config).unwrap();

    let events: Vec<serde_json::Value> = (0..80)
        .flat_map(|i| {
            let key = if i % 2 == 0 { 77 } else { 78 };
            let t = i * 250;
            [
                serde_json::json!({"k": key, "p": 1, "e": t}),
                serde_json::json!({"k": key, "p": 0, "e": t + 70}),
            ]
        })
        .collect();
    let record = serde_json::json!({
        "subject_id": "CA031",
        "hand": "right",
        "side": 1,
        "d": {"2": events, "3": events}
    });
    let input = format!("{record}\n\n");

    let payloads = processor.process_tapping(&input).unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].status, PayloadStatus::Ok);

    let Some(FeatureBundle::Tapping(bundle)) = &payloads[0].features else {
        panic!("expected a tapping bundle");
    };
    let mn = bundle.hand("mn", HandRole::Dominant).unwrap();
    let windows: Vec<i64> = mn.windows.iter().map(|w| w.window_ms).collect();
    assert_eq!(windows, vec![10_000, 20_000]);
    assert!(mn.affected);
    assert_eq!(mn.window(20_000).unwrap().flight.mean, Some(250.0));

    // QP and M streams are absent from the record
    let missing: Vec<&str> = bundle
        .diagnostics
        .iter()
        .filter(|d| d.feature == "stream")
        .filter_map(|d| d.protocol.as_deref())
        .collect();
    assert_eq!(missing, vec!["qp", "qp", "m", "m"]);

    let line = serde_json::to_string(&payloads[0]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["features"]["kind"], "tapping");
    assert_eq!(value["provenance"]["subject_id"], "CA031");
}
