//! Batch drivers
//!
//! Both drivers borrow the input collection and return new maps; nothing the
//! caller holds is modified. Results follow the input's insertion order.

use std::time::Instant;

use indexmap::IndexMap;
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use super::reporter::RecordingReporter;
use crate::analysis::metadata::BatchMetadata;
use crate::analysis::result::{BatchReport, CleanedRecording};
use crate::analysis::summary::summarize_outliers;
use crate::clean_recording;
use crate::config::{ErrorPolicy, OutlierConfig};
use crate::data::{collect_recordings_from_maps, recordings_from_maps, Recording, RecordingSet};
use crate::detection::CombinedOutliers;
use crate::error::OutlierError;

/// Everything a batch run produces
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Cleaned recordings, same keys and shapes as the input
    pub recordings: RecordingSet,

    /// Combined outlier structure per cleaned recording
    pub outliers: IndexMap<String, CombinedOutliers>,

    /// Failed recordings (only populated under `CollectAndContinue`)
    pub failures: IndexMap<String, OutlierError>,

    /// Run metadata
    pub metadata: BatchMetadata,
}

impl BatchOutput {
    fn new(config: &OutlierConfig, capacity: usize) -> Self {
        Self {
            recordings: RecordingSet::with_capacity(capacity),
            outliers: IndexMap::with_capacity(capacity),
            failures: IndexMap::new(),
            metadata: BatchMetadata::for_config(config),
        }
    }

    /// Split cleaned recordings into (coordinate map, confidence map)
    pub fn into_maps(
        self,
    ) -> (
        IndexMap<String, Array3<f64>>,
        IndexMap<String, Array2<f64>>,
    ) {
        let mut coordinates = IndexMap::with_capacity(self.recordings.len());
        let mut confidences = IndexMap::with_capacity(self.recordings.len());

        for (name, recording) in self.recordings {
            let (coords, confs) = recording.into_parts();
            coordinates.insert(name.clone(), coords);
            confidences.insert(name, confs);
        }

        (coordinates, confidences)
    }

    /// Summaries, failures and metadata, ready to serialize
    pub fn report(&self) -> BatchReport {
        BatchReport {
            summaries: self
                .outliers
                .iter()
                .map(|(name, outliers)| (name.clone(), summarize_outliers(outliers)))
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|(name, err)| (name.clone(), err.to_string()))
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Record one recording's outcome
    ///
    /// The reporter sees successful recordings only. Under `HaltOnFirst` a
    /// failure is returned as the batch error.
    fn record(
        &mut self,
        name: &str,
        raw: &Recording,
        outcome: Result<CleanedRecording, OutlierError>,
        policy: ErrorPolicy,
        reporter: &mut Option<&mut dyn RecordingReporter>,
    ) -> Result<(), OutlierError> {
        match outcome {
            Ok(cleaned) => {
                if let Some(reporter) = reporter.as_mut() {
                    reporter.on_recording_processed(
                        name,
                        raw.coordinates(),
                        cleaned.recording.coordinates(),
                        &cleaned.outliers,
                    );
                }
                self.recordings.insert(name.to_string(), cleaned.recording);
                self.outliers.insert(name.to_string(), cleaned.outliers);
                Ok(())
            }
            Err(err) => {
                let err = err.for_recording(name);
                match policy {
                    ErrorPolicy::HaltOnFirst => Err(err),
                    ErrorPolicy::CollectAndContinue => {
                        log::warn!("Skipping {}", err);
                        self.failures.insert(name.to_string(), err);
                        Ok(())
                    }
                }
            }
        }
    }

    fn finish(mut self, start: Instant) -> Self {
        self.metadata.recordings_processed = self.recordings.len();
        self.metadata.recordings_failed = self.failures.len();
        self.metadata.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::debug!(
            "Batch finished: {} cleaned, {} failed in {:.2} ms",
            self.metadata.recordings_processed,
            self.metadata.recordings_failed,
            self.metadata.processing_time_ms
        );

        self
    }
}

/// Detect and interpolate outliers in every recording, one after another
///
/// # Arguments
///
/// * `recordings` - Recordings keyed by name, processed in insertion order
/// * `config` - Detection parameters shared by all recordings
/// * `reporter` - Optional callback invoked after each recording is cleaned
///
/// # Returns
///
/// `BatchOutput` with cleaned recordings and per-recording outlier structures
///
/// # Errors
///
/// `InvalidConfig` for a bad configuration. Under `HaltOnFirst`, the first
/// failing recording's error wrapped in `OutlierError::Recording`.
///
/// # Example
///
/// ```no_run
/// use keypoint_outliers::{filter_outliers, LoggingReporter, OutlierConfig, RecordingSet};
///
/// let recordings = RecordingSet::new(); // from recordings_from_maps(...)
/// let mut reporter = LoggingReporter::new();
///
/// let output = filter_outliers(&recordings, &OutlierConfig::new(6.0, 30.0), Some(&mut reporter))?;
/// let (coordinates, confidences) = output.into_maps();
/// # Ok::<(), keypoint_outliers::OutlierError>(())
/// ```
pub fn filter_outliers(
    recordings: &RecordingSet,
    config: &OutlierConfig,
    mut reporter: Option<&mut dyn RecordingReporter>,
) -> Result<BatchOutput, OutlierError> {
    config.validate()?;

    let start = Instant::now();
    let total = recordings.len();
    let mut output = BatchOutput::new(config, total);

    for (i, (name, recording)) in recordings.iter().enumerate() {
        log::info!("{}/{}: {}", i + 1, total, name);
        let outcome = clean_recording(recording, config);
        output.record(name, recording, outcome, config.error_policy, &mut reporter)?;
    }

    Ok(output.finish(start))
}

/// Same as [`filter_outliers`], with recordings cleaned on the rayon pool
///
/// The reporter still runs on the calling thread, in insertion order, after
/// all recordings are computed. Output is identical to the sequential driver.
pub fn filter_outliers_parallel(
    recordings: &RecordingSet,
    config: &OutlierConfig,
    mut reporter: Option<&mut dyn RecordingReporter>,
) -> Result<BatchOutput, OutlierError> {
    config.validate()?;

    let start = Instant::now();
    let entries: Vec<(&String, &Recording)> = recordings.iter().collect();
    log::info!("Cleaning {} recordings in parallel", entries.len());

    let outcomes: Vec<Result<CleanedRecording, OutlierError>> = entries
        .par_iter()
        .map(|(_, recording)| clean_recording(recording, config))
        .collect();

    let mut output = BatchOutput::new(config, entries.len());
    for ((name, recording), outcome) in entries.into_iter().zip(outcomes) {
        output.record(name, recording, outcome, config.error_policy, &mut reporter)?;
    }

    Ok(output.finish(start))
}

/// Clean recordings handed over as coordinate and confidence maps
///
/// Builds the recordings (see [`recordings_from_maps`]) and runs
/// [`filter_outliers`] on them. Recordings that cannot be built, such as a
/// confidence map that disagrees with its coordinates, follow
/// `config.error_policy` like any other per-recording failure: under
/// `CollectAndContinue` they are listed in [`BatchOutput::failures`] ahead of
/// recordings that failed during cleaning.
///
/// # Errors
///
/// `InvalidConfig` for a bad configuration. Under `HaltOnFirst`, the first
/// failing recording's error wrapped in `OutlierError::Recording`.
pub fn filter_outlier_maps(
    coordinates: IndexMap<String, Array3<f64>>,
    confidences: IndexMap<String, Array2<f64>>,
    bodyparts: Option<&[String]>,
    config: &OutlierConfig,
    reporter: Option<&mut dyn RecordingReporter>,
) -> Result<BatchOutput, OutlierError> {
    config.validate()?;

    match config.error_policy {
        ErrorPolicy::HaltOnFirst => {
            let recordings = recordings_from_maps(coordinates, confidences, bodyparts)?;
            filter_outliers(&recordings, config, reporter)
        }
        ErrorPolicy::CollectAndContinue => {
            let (recordings, mut failures) =
                collect_recordings_from_maps(coordinates, confidences, bodyparts);
            for err in failures.values() {
                log::warn!("Skipping {}", err);
            }

            let mut output = filter_outliers(&recordings, config, reporter)?;
            failures.extend(output.failures);
            output.failures = failures;
            output.metadata.recordings_failed = output.failures.len();
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn recording(n_frames: usize, spike: Option<usize>) -> Recording {
        let mut coords = Array3::from_shape_fn((n_frames, 3, 2), |(f, k, d)| {
            k as f64 * 5.0 + d as f64 + (f % 4) as f64 * 0.25
        });
        if let Some(f) = spike {
            coords[[f, 1, 0]] = 900.0;
            coords[[f, 1, 1]] = 900.0;
        }
        Recording::new(coords, Array2::from_elem((n_frames, 3), 0.9)).unwrap()
    }

    fn batch() -> RecordingSet {
        let mut set = RecordingSet::new();
        set.insert("A".to_string(), recording(20, None));
        set.insert("B".to_string(), recording(20, Some(7)));
        set.insert("C".to_string(), recording(20, Some(12)));
        set
    }

    #[test]
    fn test_preserves_keys_and_order() {
        let output = filter_outliers(&batch(), &OutlierConfig::new(4.0, 30.0), None).unwrap();

        assert_eq!(output.recordings.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(output.outliers.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert!(output.outliers["B"].is_outlier(7, 1));
        assert_eq!(output.recordings["B"].confidences()[[7, 1]], 0.0);
        assert_eq!(output.metadata.recordings_processed, 3);
    }

    #[test]
    fn test_reporter_called_in_order() {
        let mut names = Vec::new();
        let mut reporter =
            |name: &str, raw: &Array3<f64>, cleaned: &Array3<f64>, _o: &CombinedOutliers| {
                assert_eq!(raw.dim(), cleaned.dim());
                names.push(name.to_string());
            };

        filter_outliers(
            &batch(),
            &OutlierConfig::new(4.0, 30.0),
            Some(&mut reporter as &mut dyn RecordingReporter),
        )
        .unwrap();

        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_halt_on_first_names_recording() {
        let mut set = batch();
        set.insert("short".to_string(), recording(1, None));

        let err = filter_outliers(&set, &OutlierConfig::new(4.0, 30.0), None).unwrap_err();
        match err {
            OutlierError::Recording { name, source } => {
                assert_eq!(name, "short");
                assert!(matches!(*source, OutlierError::InsufficientData(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_collect_policy_keeps_good_recordings() {
        let mut set = RecordingSet::new();
        set.insert("short".to_string(), recording(1, None));
        set.insert("A".to_string(), recording(20, None));

        let mut config = OutlierConfig::new(4.0, 30.0);
        config.error_policy = ErrorPolicy::CollectAndContinue;
        let output = filter_outliers(&set, &config, None).unwrap();

        assert_eq!(output.recordings.keys().collect::<Vec<_>>(), vec!["A"]);
        assert!(output.failures.contains_key("short"));
        assert!(!output.recordings.contains_key("short"));
        assert_eq!(output.metadata.recordings_failed, 1);

        let report = output.report();
        assert!(report.failures["short"].contains("Recording 'short'"));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let err = filter_outliers(&batch(), &OutlierConfig::new(-1.0, 30.0), None).unwrap_err();
        assert!(matches!(err, OutlierError::InvalidConfig(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut config = OutlierConfig::new(4.0, 30.0);
        config.use_keypoint_distance_outliers = true;
        config.use_velocity_outliers = true;

        let sequential = filter_outliers(&batch(), &config, None).unwrap();
        let parallel = filter_outliers_parallel(&batch(), &config, None).unwrap();

        assert_eq!(sequential.recordings, parallel.recordings);
        for (name, outliers) in &sequential.outliers {
            assert_eq!(outliers.mask(), parallel.outliers[name].mask());
        }
    }

    #[test]
    fn test_into_maps() {
        let output = filter_outliers(&batch(), &OutlierConfig::new(4.0, 30.0), None).unwrap();
        let (coordinates, confidences) = output.into_maps();

        assert_eq!(coordinates.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(coordinates["A"].dim(), (20, 3, 2));
        assert_eq!(confidences["C"].dim(), (20, 3));
    }

    fn maps_with_bad_confidences() -> (IndexMap<String, Array3<f64>>, IndexMap<String, Array2<f64>>) {
        let mut coordinates = IndexMap::new();
        let mut confidences = IndexMap::new();
        for (name, conf_frames) in [("good", 20), ("bad", 19), ("also_good", 20)] {
            let (coords, _) = recording(20, Some(5)).into_parts();
            coordinates.insert(name.to_string(), coords);
            confidences.insert(name.to_string(), Array2::from_elem((conf_frames, 3), 0.9));
        }
        (coordinates, confidences)
    }

    #[test]
    fn test_maps_collect_shape_mismatch() {
        let (coordinates, confidences) = maps_with_bad_confidences();
        let mut config = OutlierConfig::new(4.0, 30.0);
        config.error_policy = ErrorPolicy::CollectAndContinue;

        let output = filter_outlier_maps(coordinates, confidences, None, &config, None).unwrap();

        assert_eq!(output.recordings.keys().collect::<Vec<_>>(), vec!["good", "also_good"]);
        assert!(output.outliers["good"].is_outlier(5, 1));
        assert_eq!(output.failures.keys().collect::<Vec<_>>(), vec!["bad"]);
        assert!(matches!(output.failures["bad"].root(), OutlierError::ShapeMismatch(_)));
        assert_eq!(output.metadata.recordings_processed, 2);
        assert_eq!(output.metadata.recordings_failed, 1);
    }

    #[test]
    fn test_maps_halt_on_shape_mismatch() {
        let (coordinates, confidences) = maps_with_bad_confidences();
        let err = filter_outlier_maps(
            coordinates,
            confidences,
            None,
            &OutlierConfig::new(4.0, 30.0),
            None,
        )
        .unwrap_err();

        assert!(err.to_string().starts_with("Recording 'bad'"));
    }
}
