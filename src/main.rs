mod action;
mod analysis;
mod capture;
mod config;
mod output;
mod pose;

use analysis::{AnalysisResult, Stroke};
use anyhow::{Context, Result};
use capture::{DecodeOptions, FfmpegDecoder, FrameSource};
use clap::{Parser, Subcommand};
use config::{ActionConfig, Config};
use output::TextFileReport;
use pose::LandmarkSource;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Video files picked up from the input directory
const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".mov"];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory scanned for .mp4, .avi and .mov files
    #[arg(long, default_value = "videos")]
    videos_dir: PathBuf,

    /// Report output path
    #[arg(long, default_value = "swimming_analysis_report.txt")]
    report: PathBuf,

    /// Path to the pose landmark model (ONNX file)
    #[arg(long, default_value = "models/pose_landmark_full.onnx")]
    model: String,

    /// TOML file overriding thresholds and limits
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Name the activity in one video with a Kinetics-400 action model
    Recognize {
        /// Video file to classify
        video: PathBuf,

        /// Path to the R3D-18 action model (ONNX file)
        #[arg(long, default_value = "models/r3d_18.onnx")]
        model: String,

        /// Class names, one per line, in model output order
        #[arg(long, default_value = "kinetics_classnames.txt")]
        labels: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(path) = &args.dump_config {
        config
            .save(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    if let Some(Command::Recognize { video, model, labels }) = &args.command {
        return recognize_video(video, model, labels, &config.action);
    }

    tracing::info!("Swim coach starting");
    tracing::info!("Videos: {}", args.videos_dir.display());
    tracing::info!("Frame limit per video: {}", config.max_frames);

    let videos = list_videos(&args.videos_dir)?;
    if videos.is_empty() {
        tracing::warn!("No videos found in {}", args.videos_dir.display());
    }

    let mut model = pose::create_default_model(&args.model, &config.model)
        .context("Failed to load pose landmark model")?;
    let (input_width, input_height) = model.input_size();
    tracing::info!("Pose model input: {}x{}", input_width, input_height);

    let results = run_batch(&videos, model.as_mut(), &config);

    let mut sink = TextFileReport::new(&args.report);
    output::generate_report(&results, &mut sink, config.report.top_n);
    tracing::info!("Analysis complete. Report generated.");

    Ok(())
}

/// Analyze every video, keeping going past the ones that fail
fn run_batch(videos: &[PathBuf], model: &mut dyn LandmarkSource, config: &Config) -> BTreeMap<String, AnalysisResult> {
    let mut results = BTreeMap::new();

    for path in videos {
        let name = file_name(path);
        tracing::info!("Analyzing {}...", name);

        match analyze_file(path, model, config) {
            Ok(result) => {
                if result.stroke == Stroke::Unknown {
                    tracing::warn!("{}: no swimmer detected", name);
                } else {
                    tracing::info!("{}: {}", name, result.stroke);
                }
                results.insert(name, result);
            }
            Err(e) => tracing::error!("Error analyzing {}: {:#}", name, e),
        }
    }

    results
}

fn analyze_file(path: &Path, model: &mut dyn LandmarkSource, config: &Config) -> Result<AnalysisResult> {
    let _span = tracing::info_span!("video", file = %path.display()).entered();
    let mut frames = FfmpegDecoder::open(path).context("Failed to open video")?;
    let (width, height) = frames.resolution();
    tracing::debug!("Frame size {}x{}", width, height);
    analysis::analyze_video(&mut frames, model, config)
}

/// Classify a whole video and print its most likely activities
fn recognize_video(video: &Path, model_path: &str, labels_path: &Path, config: &ActionConfig) -> Result<()> {
    let labels = action::load_labels(labels_path)?;
    let mut model = action::create_default_model(model_path).context("Failed to load action model")?;

    let (width, height) = model.clip_size();
    let options = DecodeOptions {
        fps: Some(config.fps),
        size: Some((width, height)),
    };
    let mut frames = FfmpegDecoder::open_with(video, options).context("Failed to open video")?;
    let clip = action::read_clip(&mut frames, width, config.max_clip_frames)?;

    let predictions = action::recognize(model.as_mut(), &clip, &labels, config.top_k)?;

    println!("Video Analysis Results:");
    println!("This video is about:");
    for (i, prediction) in predictions.iter().enumerate() {
        println!("{}. {}", i + 1, prediction.label);
    }

    Ok(())
}

/// Video files directly inside `dir`, sorted by name
fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_video(&file_name(&path)) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

fn is_video(name: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
