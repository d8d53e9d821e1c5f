//! Example: Clean many recordings in parallel
//!
//! Usage:
//!   cargo run --release --example clean_batch -- [--jobs N] [--recordings N] [--json]
//!
//! Notes:
//! - Parallelism is across recordings. Each recording is cleaned single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use indexmap::IndexMap;
use keypoint_outliers::{
    filter_outliers_parallel, recordings_from_maps, ErrorPolicy, LoggingReporter, OutlierConfig,
};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::env;
use std::time::Instant;

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

/// Random-walk skeleton with occasional large glitches
fn synthetic_coordinates(rng: &mut StdRng, n_frames: usize, n_keypoints: usize) -> Array3<f64> {
    let mut coords = Array3::<f64>::zeros((n_frames, n_keypoints, 2));
    let mut center = [200.0, 200.0];

    for f in 0..n_frames {
        center[0] += rng.gen_range(-1.0..1.0);
        center[1] += rng.gen_range(-1.0..1.0);
        for k in 0..n_keypoints {
            coords[[f, k, 0]] = center[0] + k as f64 * 5.0 + rng.gen_range(-0.5..0.5);
            coords[[f, k, 1]] = center[1] + rng.gen_range(-0.5..0.5);
            if rng.gen_bool(0.002) {
                coords[[f, k, 0]] += 300.0;
            }
        }
    }

    coords
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut n_recordings = 16;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--recordings" => {
                n_recordings = args
                    .first()
                    .ok_or("--recordings requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: clean_batch [--jobs N] [--recordings N] [--json]\n\
                     \n\
                     --jobs N         Parallel workers (default: CPU-1)\n\
                     --recordings N   Synthetic recordings to generate (default: 16)\n\
                     --json           Emit the batch report as JSON\n"
                );
                return Ok(());
            }
            other => return Err(format!("unknown argument: {}", other).into()),
        }
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} recordings, jobs={}", n_recordings, jobs);

    let mut rng = StdRng::seed_from_u64(7);
    let mut coordinates = IndexMap::new();
    let mut confidences = IndexMap::new();
    for i in 0..n_recordings {
        let name = format!("session_{:03}", i);
        let n_frames = rng.gen_range(500..2000);
        coordinates.insert(name.clone(), synthetic_coordinates(&mut rng, n_frames, 8));
        confidences.insert(name, Array2::from_elem((n_frames, 8), 0.9));
    }
    let recordings = recordings_from_maps(coordinates, confidences, None)?;

    let mut config = OutlierConfig::new(6.0, 30.0);
    config.use_keypoint_distance_outliers = true;
    config.use_velocity_outliers = true;
    config.error_policy = ErrorPolicy::CollectAndContinue;

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let mut reporter = LoggingReporter::new();

    let t0 = Instant::now();
    let output = pool.install(|| filter_outliers_parallel(&recordings, &config, Some(&mut reporter)))?;
    let elapsed = t0.elapsed();

    let report = output.report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (name, summary) in &report.summaries {
            println!(
                "{:<14} frames={:<5} outliers={:<4} ({:.2}%)",
                name, summary.n_frames, summary.outlier_count, summary.outlier_percentage
            );
        }
        for (name, reason) in &report.failures {
            println!("{:<14} FAILED: {}", name, reason);
        }
    }

    eprintln!(
        "Done: {} cleaned, {} failed, {} needing review in {:.2}s",
        report.metadata.recordings_processed,
        report.metadata.recordings_failed,
        report.recordings_needing_review().len(),
        elapsed.as_secs_f64()
    );

    Ok(())
}
