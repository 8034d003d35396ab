//! Command-line front end that replays a newline-delimited JSON detection stream through the
//! tracking core and prints the resulting tracks and (when depth/intrinsics are present) 3D
//! positions, one set of lines per input frame.

use anyhow::{Context, Result};
use clap::Parser;
use mot_common::{BoundingBox2D, BoxRejectionConfig, LocalizationConfig, TrackingConfig};
use mot_kalman::FilterKind;
use mot_pose::{DepthFrame, Intrinsics, PoseEstimator};
use mot_tracker::MultiClassTracker;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "mot",
    version,
    about = "Replay a newline-delimited JSON detection stream through the tracking core",
    after_help = "Each input line is a JSON object:\n  \
                  {\"dt\": 0.1, \"detections\": [{\"x\": 100.0, \"y\": 100.0, \"w\": 40.0, \"h\": 60.0, \"confidence\": 0.9, \"class_id\": 0}]}\n\
                  Two fields are optional and unlock 3D output once present on any line:\n  \
                  \"intrinsics\": {\"fx\": 500.0, \"fy\": 500.0, \"cx\": 320.0, \"cy\": 240.0, \"distortion\": []}\n  \
                  \"depth\": {\"width\": 640, \"height\": 480, \"data\": [...row-major meters...]}\n\
                  Reads from a file argument, or stdin if omitted."
)]
struct Cli {
    /// Path to a newline-delimited JSON detection file. Reads stdin if omitted.
    input: Option<PathBuf>,

    /// Which Kalman filter variant to track 2D boxes with.
    #[arg(long, value_enum, default_value = "linear2d")]
    filter: FilterArg,

    /// Path to a JSON-encoded `TrackingConfig`. Uses built-in defaults if omitted.
    #[arg(long)]
    tracking_config: Option<PathBuf>,

    /// Path to a JSON-encoded `BoxRejectionConfig`. Uses built-in defaults if omitted.
    #[arg(long)]
    rejection_config: Option<PathBuf>,

    /// Path to a JSON-encoded `LocalizationConfig`. Uses built-in defaults if omitted; camera
    /// intrinsics are still only active once a frame (or this config) supplies `fx`/`fy` > 0.
    #[arg(long)]
    localization_config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FilterArg {
    Linear2d,
    Extended2dh,
}

impl From<FilterArg> for FilterKind {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Linear2d => FilterKind::Linear2D,
            FilterArg::Extended2dh => FilterKind::Extended2DH,
        }
    }
}

#[derive(Deserialize)]
struct FrameRecord {
    dt: f32,
    detections: Vec<DetectionRecord>,
    intrinsics: Option<IntrinsicsRecord>,
    depth: Option<DepthRecord>,
}

#[derive(Deserialize)]
struct DetectionRecord {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    confidence: f32,
    class_id: u32,
}

#[derive(Deserialize)]
struct IntrinsicsRecord {
    fx: f32,
    fy: f32,
    cx: f32,
    cy: f32,
    #[serde(default)]
    distortion: Vec<f32>,
}

#[derive(Deserialize)]
struct DepthRecord {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let tracking_cfg = match &cli.tracking_config {
        Some(path) => load_json(path).with_context(|| format!("reading tracking config from {}", path.display()))?,
        None => TrackingConfig::default(),
    };
    let rejection_cfg = match &cli.rejection_config {
        Some(path) => load_json(path).with_context(|| format!("reading rejection config from {}", path.display()))?,
        None => BoxRejectionConfig::default(),
    };
    let localization_cfg = match &cli.localization_config {
        Some(path) => load_json(path).with_context(|| format!("reading localization config from {}", path.display()))?,
        None => LocalizationConfig::default(),
    };

    let mut tracker = MultiClassTracker::new(cli.filter.into(), tracking_cfg, rejection_cfg).context("constructing tracker")?;
    let pose = PoseEstimator::new(localization_cfg);

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut frame_index = 0u64;
    for line in reader.lines() {
        let line = line.context("reading input line")?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("parsing frame {frame_index} as JSON"))?;

        if let Some(intrinsics) = &frame.intrinsics {
            pose.update_camera_parameters(
                Intrinsics { fx: intrinsics.fx, fy: intrinsics.fy, cx: intrinsics.cx, cy: intrinsics.cy },
                intrinsics.distortion.clone(),
            );
        }

        let detections: Vec<BoundingBox2D> = frame
            .detections
            .iter()
            .map(|d| BoundingBox2D::new(d.x, d.y, d.w, d.h, d.confidence, d.class_id))
            .collect();

        let depth_frame = match &frame.depth {
            Some(d) => {
                anyhow::ensure!(
                    d.data.len() == (d.width * d.height) as usize,
                    "frame {frame_index}: depth data length {} doesn't match {}x{}",
                    d.data.len(),
                    d.width,
                    d.height
                );
                Some(DepthFrame::new(d.width, d.height, d.data.clone()))
            }
            None => None,
        };

        let output = tracker.update(&detections, frame.dt);
        info!(frame = frame_index, classes = output.len(), "frame processed");

        let mut class_ids: Vec<_> = output.keys().copied().collect();
        class_ids.sort_unstable();
        for class_id in class_ids {
            for track in &output[&class_id] {
                println!(
                    "frame={frame_index} class={class_id} id={id} status={status:?} x={x:.2} y={y:.2}",
                    id = track.id,
                    status = track.status,
                    x = track.state[0],
                    y = track.state[1],
                );
            }
        }

        if let Some(depth_frame) = &depth_frame {
            for (j, det) in detections.iter().enumerate() {
                match pose.localize(det, depth_frame) {
                    Ok(position) if position.valid => println!(
                        "frame={frame_index} detection={j} class={class} position=({x:.2},{y:.2},{z:.2})",
                        class = det.class_id,
                        x = position.x,
                        y = position.y,
                        z = position.z,
                    ),
                    Ok(_) => println!("frame={frame_index} detection={j} class={} position=invalid", det.class_id),
                    Err(err) => info!(frame = frame_index, detection = j, %err, "localization skipped"),
                }
            }
        }

        frame_index += 1;
    }

    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))
}
