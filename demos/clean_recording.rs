//! Example: Clean a single synthetic recording
//!
//! Usage:
//!   cargo run --example clean_recording -- [--velocity] [--pairwise]
//!
//! Generates a walking skeleton with a few tracking glitches, removes them and
//! prints the outlier summary as JSON.

use keypoint_outliers::analysis::diagnostics::medoid_distance_traces;
use keypoint_outliers::{clean_recording, OutlierConfig, Recording};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;

const BODYPARTS: [&str; 6] = ["nose", "left_ear", "right_ear", "neck", "spine", "tail_base"];

/// Skeleton translating across the arena with per-frame jitter
fn synthetic_recording(rng: &mut StdRng, n_frames: usize) -> Array3<f64> {
    let offsets = [(0.0, 0.0), (-4.0, 3.0), (4.0, 3.0), (0.0, 8.0), (0.0, 18.0), (0.0, 30.0)];
    Array3::from_shape_fn((n_frames, offsets.len(), 2), |(f, k, d)| {
        let base = if d == 0 { f as f64 * 0.5 + offsets[k].0 } else { 100.0 + offsets[k].1 };
        base + rng.gen_range(-0.5..0.5)
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = OutlierConfig::new(6.0, 30.0);
    config.use_velocity_outliers = args.iter().any(|a| a == "--velocity");
    config.use_keypoint_distance_outliers = args.iter().any(|a| a == "--pairwise");

    let mut rng = StdRng::seed_from_u64(2024);
    let n_frames = 600;
    let mut coords = synthetic_recording(&mut rng, n_frames);

    // Identity swaps and detector misfires
    for _ in 0..8 {
        let f = rng.gen_range(0..n_frames);
        let k = rng.gen_range(0..BODYPARTS.len());
        coords[[f, k, 0]] += rng.gen_range(80.0..200.0);
        coords[[f, k, 1]] -= rng.gen_range(80.0..200.0);
    }

    let bodyparts: Vec<String> = BODYPARTS.iter().map(|s| s.to_string()).collect();
    let recording = Recording::new(coords, Array2::from_elem((n_frames, BODYPARTS.len()), 0.95))?
        .with_bodyparts(bodyparts.clone())?;

    let cleaned = clean_recording(&recording, &config)?;
    let summary = cleaned.summary();

    println!("Cleaning Results:");
    println!("  Detectors: {:?}", cleaned.outliers.detectors());
    println!(
        "  Outliers: {} ({:.2}% of points)",
        summary.outlier_count, summary.outlier_percentage
    );
    for (part, count) in bodyparts.iter().zip(&summary.per_keypoint) {
        println!("    {:<10} {}", part, count);
    }

    let traces = medoid_distance_traces(
        "synthetic",
        recording.coordinates().view(),
        cleaned.recording.coordinates().view(),
        &cleaned.outliers,
        Some(bodyparts.as_slice()),
    )?;
    println!("  Trace set: {} rows × {} panels", traces.n_rows(), traces.n_columns());

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
