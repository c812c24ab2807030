//! Run a CASA analysis over a JSON detection stream.
//!
//! Usage:
//!     cargo run --release --example analyze_json [input.json] [config.json]
//!
//! The input holds the calibration and the frames:
//!
//! ```json
//! {
//!   "calibration": { "microns_per_pixel": 0.5, "fps": 25.0 },
//!   "frames": [
//!     { "frame_index": 0, "timestamp": 0.0, "detections": [{ "x": 10.0, "y": 20.0 }] }
//!   ]
//! }
//! ```
//!
//! Without an input file a synthetic sample of swimmers is analyzed. Log output is
//! controlled with `RUST_LOG` (e.g. `RUST_LOG=casa_track=debug`).

use std::env;
use std::fs;
use std::time::Instant;

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use casa_track::{AnalysisConfig, Calibration, CasaAnalysis, Detection, FrameDetections};

#[derive(Debug, Deserialize)]
struct Input {
    calibration: Calibration,
    frames: Vec<FrameDetections>,
}

/// Swimmers on parallel lanes with a sideways head beat.
fn synthetic_input() -> Input {
    let fps = 25.0;
    let frames = (0..75u64)
        .map(|frame| {
            let t = frame as f64;
            let detections = (0..5)
                .map(|lane| {
                    let speed = 1.0 + lane as f64;
                    let beat = 1.5 * (t * 1.3 + lane as f64).sin();
                    Detection {
                        x: 40.0 + speed * t,
                        y: 80.0 + 120.0 * lane as f64 + beat,
                    }
                })
                .collect();
            FrameDetections {
                frame_index: frame,
                timestamp: t / fps,
                detections,
            }
        })
        .collect();
    Input {
        calibration: Calibration {
            microns_per_pixel: 0.5,
            fps,
        },
        frames,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("casa_track=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let input = match args.get(1) {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => synthetic_input(),
    };
    let config = match args.get(2) {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    info!(
        frames = input.frames.len(),
        microns_per_pixel = input.calibration.microns_per_pixel,
        fps = input.calibration.fps,
        "loaded detection stream"
    );

    let analysis = CasaAnalysis::new(input.calibration, config)?;
    let start = Instant::now();
    let result = analysis.run(input.frames)?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
