//! Integration tests for the outlier cleaning pipeline

use indexmap::IndexMap;
use keypoint_outliers::analysis::diagnostics::{medoid_distance_traces, velocity_traces};
use keypoint_outliers::{
    clean_recording, filter_outlier_maps, filter_outliers, filter_outliers_parallel,
    recordings_from_maps,
    CombinedOutliers, DetectorKind, ErrorPolicy, OutlierConfig, OutlierError, Recording,
    RecordingReporter, RecordingSet,
};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INJECTED_FRAMES: [usize; 5] = [10, 30, 50, 70, 90];
const INJECTED_KEYPOINT: usize = 1;

/// Uniform random coordinates in [0, 100]
fn random_coordinates(rng: &mut StdRng, n_frames: usize, n_keypoints: usize) -> Array3<f64> {
    Array3::from_shape_fn((n_frames, n_keypoints, 2), |_| rng.gen_range(0.0..=100.0))
}

/// Recordings "A" (random) and "B" (random with 5 injected glitches)
fn glitch_batch() -> RecordingSet {
    let mut rng = StdRng::seed_from_u64(42);

    let a = random_coordinates(&mut rng, 100, 3);
    let mut b = random_coordinates(&mut rng, 100, 3);
    for &f in &INJECTED_FRAMES {
        b[[f, INJECTED_KEYPOINT, 0]] = 10000.0;
        b[[f, INJECTED_KEYPOINT, 1]] = 10000.0;
    }

    let mut coordinates = IndexMap::new();
    coordinates.insert("A".to_string(), a);
    coordinates.insert("B".to_string(), b);

    let mut confidences = IndexMap::new();
    confidences.insert("A".to_string(), Array2::from_elem((100, 3), 0.9));
    confidences.insert("B".to_string(), Array2::from_elem((100, 3), 0.9));

    recordings_from_maps(coordinates, confidences, None).unwrap()
}

fn stray_flags(outliers: &CombinedOutliers) -> usize {
    outliers
        .mask()
        .indexed_iter()
        .filter(|&((f, k), &m)| m && !(k == INJECTED_KEYPOINT && INJECTED_FRAMES.contains(&f)))
        .count()
}

#[test]
fn test_end_to_end_injected_glitches() {
    let config = OutlierConfig::new(4.0, 30.0);
    let output = filter_outliers(&glitch_batch(), &config, None).unwrap();

    let b = &output.outliers["B"];
    for &f in &INJECTED_FRAMES {
        assert!(b.is_outlier(f, INJECTED_KEYPOINT), "frame {} not flagged", f);
        assert_eq!(b.flagged_by(f, INJECTED_KEYPOINT), vec![DetectorKind::MedoidDistance]);

        let cleaned = &output.recordings["B"];
        assert_eq!(cleaned.confidences()[[f, INJECTED_KEYPOINT]], 0.0);
        for axis in 0..2 {
            let value = cleaned.coordinates()[[f, INJECTED_KEYPOINT, axis]];
            assert!((0.0..=100.0).contains(&value), "glitch survived: {}", value);
        }
    }

    assert_eq!(stray_flags(b), 0);
    assert_eq!(b.outlier_count(), INJECTED_FRAMES.len());

    // Uniform noise yields few outliers
    assert!(output.outliers["A"].outlier_count() <= 20);
}

#[test]
fn test_shapes_and_keys_preserved() {
    let input = glitch_batch();
    let output = filter_outliers(&input, &OutlierConfig::new(4.0, 30.0), None).unwrap();
    let (coordinates, confidences) = output.into_maps();

    assert_eq!(coordinates.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(confidences.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    for (name, recording) in &input {
        assert_eq!(coordinates[name].dim(), recording.coordinates().dim());
        assert_eq!(confidences[name].dim(), recording.confidences().dim());
    }

    // Input untouched
    assert_eq!(input["B"].coordinates()[[10, INJECTED_KEYPOINT, 0]], 10000.0);
}

#[test]
fn test_unmasked_entries_are_bit_identical() {
    let input = glitch_batch();
    let output = filter_outliers(&input, &OutlierConfig::new(4.0, 30.0), None).unwrap();

    for (name, cleaned) in &output.recordings {
        let raw = &input[name];
        let mask = output.outliers[name].mask();
        for ((f, k), &flagged) in mask.indexed_iter() {
            if flagged {
                assert_eq!(cleaned.confidences()[[f, k]], 0.0);
            } else {
                assert_eq!(cleaned.confidences()[[f, k]], raw.confidences()[[f, k]]);
                for axis in 0..2 {
                    assert_eq!(
                        cleaned.coordinates()[[f, k, axis]].to_bits(),
                        raw.coordinates()[[f, k, axis]].to_bits()
                    );
                }
            }
        }
    }
}

#[test]
fn test_zero_outliers_round_trip() {
    // Rigid body translating at constant speed: every metric is constant
    let coords = Array3::from_shape_fn((30, 4, 2), |(f, k, d)| {
        f as f64 * 2.0 + [0.0, 8.0, 3.0, 5.0][k] + d as f64 * [1.0, 6.0, 2.0, 9.0][k]
    });
    let confs = Array2::from_shape_fn((30, 4), |(f, k)| 0.5 + (f * 4 + k) as f64 / 1000.0);
    let recording = Recording::new(coords.clone(), confs.clone()).unwrap();

    let mut config = OutlierConfig::new(4.0, 30.0);
    config.use_keypoint_distance_outliers = true;
    config.use_velocity_outliers = true;

    let cleaned = clean_recording(&recording, &config).unwrap();
    assert_eq!(cleaned.outliers.outlier_count(), 0);
    assert_eq!(cleaned.recording.coordinates(), &coords);
    assert_eq!(cleaned.recording.confidences(), &confs);
}

#[test]
fn test_all_detectors_contribute_provenance() {
    let mut config = OutlierConfig::new(4.0, 30.0);
    config.use_keypoint_distance_outliers = true;
    config.use_velocity_outliers = true;

    let output = filter_outliers(&glitch_batch(), &config, None).unwrap();
    let b = &output.outliers["B"];

    assert_eq!(
        b.detectors(),
        vec![
            DetectorKind::MedoidDistance,
            DetectorKind::KeypointDistance,
            DetectorKind::Velocity
        ]
    );
    for source in b.sources() {
        assert_eq!(source.mask.dim(), (100, 3));
    }
    for ((f, k), &flagged) in b.mask().indexed_iter() {
        assert_eq!(flagged, !b.flagged_by(f, k).is_empty());
    }
    assert!(b
        .flagged_by(10, INJECTED_KEYPOINT)
        .contains(&DetectorKind::Velocity));
}

#[test]
fn test_parallel_equals_sequential() {
    let mut config = OutlierConfig::new(4.0, 30.0);
    config.use_keypoint_distance_outliers = true;

    let input = glitch_batch();
    let sequential = filter_outliers(&input, &config, None).unwrap();
    let parallel = filter_outliers_parallel(&input, &config, None).unwrap();

    assert_eq!(sequential.recordings, parallel.recordings);
    assert_eq!(sequential.outliers, parallel.outliers);
}

#[test]
fn test_reporter_sees_each_recording_in_order() {
    let mut calls: Vec<(String, usize)> = Vec::new();
    let mut reporter = |name: &str,
                        raw: &Array3<f64>,
                        cleaned: &Array3<f64>,
                        outliers: &CombinedOutliers| {
        assert_eq!(raw.dim(), cleaned.dim());
        calls.push((name.to_string(), outliers.outlier_count()));
    };

    let input = glitch_batch();
    filter_outliers_parallel(
        &input,
        &OutlierConfig::new(4.0, 30.0),
        Some(&mut reporter as &mut dyn RecordingReporter),
    )
    .unwrap();

    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "A");
    assert_eq!(calls[1].0, "B");
    assert!(calls[1].1 >= INJECTED_FRAMES.len());
}

#[test]
fn test_shape_mismatch_names_recording() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut coordinates = IndexMap::new();
    coordinates.insert("A".to_string(), random_coordinates(&mut rng, 20, 3));
    coordinates.insert("B".to_string(), random_coordinates(&mut rng, 20, 3));

    let mut confidences = IndexMap::new();
    confidences.insert("A".to_string(), Array2::from_elem((20, 3), 1.0));
    confidences.insert("B".to_string(), Array2::from_elem((20, 4), 1.0));

    let err = recordings_from_maps(coordinates, confidences, None).unwrap_err();
    assert!(matches!(err.root(), OutlierError::ShapeMismatch(_)));
    assert!(err.to_string().starts_with("Recording 'B'"));
}

#[test]
fn test_map_batch_collects_shape_mismatch() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut coordinates = IndexMap::new();
    let mut confidences = IndexMap::new();
    for name in ["A", "B", "C"] {
        coordinates.insert(name.to_string(), random_coordinates(&mut rng, 30, 3));
        confidences.insert(name.to_string(), Array2::from_elem((30, 3), 0.9));
    }
    confidences.insert("B".to_string(), Array2::from_elem((29, 3), 0.9));

    let mut config = OutlierConfig::new(4.0, 30.0);
    config.error_policy = ErrorPolicy::CollectAndContinue;
    let output =
        filter_outlier_maps(coordinates.clone(), confidences.clone(), None, &config, None).unwrap();

    assert_eq!(output.recordings.keys().collect::<Vec<_>>(), vec!["A", "C"]);
    assert_eq!(output.failures.keys().collect::<Vec<_>>(), vec!["B"]);
    assert!(matches!(output.failures["B"].root(), OutlierError::ShapeMismatch(_)));
    assert_eq!(output.report().metadata.recordings_failed, 1);

    config.error_policy = ErrorPolicy::HaltOnFirst;
    let err = filter_outlier_maps(coordinates, confidences, None, &config, None).unwrap_err();
    assert!(err.to_string().starts_with("Recording 'B'"));
}

#[test]
fn test_missing_detections_are_interpolated() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut coords = random_coordinates(&mut rng, 40, 3);
    coords[[12, 2, 0]] = f64::NAN;
    coords[[12, 2, 1]] = f64::NAN;
    coords[[13, 0, 0]] = f64::INFINITY;
    let recording = Recording::new(coords, Array2::from_elem((40, 3), 0.9)).unwrap();

    let mut config = OutlierConfig::new(4.0, 30.0);
    config.use_keypoint_distance_outliers = true;
    config.use_velocity_outliers = true;
    let cleaned = clean_recording(&recording, &config).unwrap();

    for (f, k) in [(12, 2), (13, 0)] {
        assert!(cleaned.outliers.flagged_by(f, k).contains(&DetectorKind::NonFinite));
        assert_eq!(cleaned.recording.confidences()[[f, k]], 0.0);
    }
    // Gap filled from neighbours inside the [0, 100] range
    assert!(cleaned
        .recording
        .coordinates()
        .iter()
        .all(|v| (0.0..=100.0).contains(v)));
}

#[test]
fn test_keypoint_dim_mismatch_names_recording() {
    let mut set = glitch_batch();
    let xyl = Array3::from_elem((20, 3, 3), 1.0);
    set.insert(
        "C".to_string(),
        Recording::new(xyl, Array2::from_elem((20, 3), 1.0)).unwrap(),
    );

    let mut config = OutlierConfig::new(4.0, 30.0);
    config.keypoint_dim = Some(2);

    let err = filter_outliers(&set, &config, None).unwrap_err();
    match &err {
        OutlierError::Recording { name, source } => {
            assert_eq!(name, "C");
            assert!(matches!(**source, OutlierError::ShapeMismatch(_)));
        }
        other => panic!("unexpected error: {}", other),
    }

    config.error_policy = ErrorPolicy::CollectAndContinue;
    let output = filter_outliers(&set, &config, None).unwrap();
    assert_eq!(output.recordings.len(), 2);
    assert_eq!(output.failures.keys().collect::<Vec<_>>(), vec!["C"]);
}

#[test]
fn test_single_keypoint_pairwise_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let recording = Recording::new(
        random_coordinates(&mut rng, 20, 1),
        Array2::from_elem((20, 1), 1.0),
    )
    .unwrap();

    let mut config = OutlierConfig::new(4.0, 30.0);
    assert!(clean_recording(&recording, &config).is_ok());

    config.use_keypoint_distance_outliers = true;
    assert!(matches!(
        clean_recording(&recording, &config),
        Err(OutlierError::InsufficientData(_))
    ));
}

#[test]
fn test_config_from_json_mapping() {
    let config: OutlierConfig = serde_json::from_str(
        r#"{
            "outlier_scale_factor": 6.0,
            "fps": 30.0,
            "use_keypoint_distance_outliers": true,
            "error_policy": "collect_and_continue",
            "kappa": 1000000.0,
            "num_iters": 50
        }"#,
    )
    .unwrap();

    assert!(config.use_keypoint_distance_outliers);
    assert_eq!(config.outlier_threshold_percentage, 0.3);
    assert_eq!(config.pairwise_scale_factor(), 6.0);
    assert_eq!(config.error_policy, ErrorPolicy::CollectAndContinue);
}

#[test]
fn test_report_and_diagnostics_serialize() {
    let mut config = OutlierConfig::new(4.0, 30.0);
    config.use_velocity_outliers = true;

    let input = glitch_batch();
    let output = filter_outliers(&input, &config, None).unwrap();

    let report = output.report();
    assert_eq!(report.summaries["B"].per_keypoint.len(), 3);
    assert_eq!(report.metadata.recordings_processed, 2);
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["summaries"]["B"]["outlier_count"].as_u64().unwrap() >= 5);

    let raw = input["B"].coordinates().view();
    let cleaned = output.recordings["B"].coordinates().view();
    let medoid = medoid_distance_traces("B", raw, cleaned, &output.outliers["B"], None).unwrap();
    let velocity =
        velocity_traces("B", raw, cleaned, config.fps, &output.outliers["B"], None).unwrap();

    assert_eq!(medoid.traces[0].dim(), (100, 3));
    assert_eq!(velocity.traces[0].dim(), (99, 3));
    assert!(serde_json::to_string(&medoid).is_ok());
}
