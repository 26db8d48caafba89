use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;

use featscan::detection::preprocessing::save_rgb_to_file;
use featscan::{
    ConsoleEvents, CornerDetector, DenoiseKind, DetectionPipeline, FeatureDetector, InteractiveTuner,
    LineDetector, PngDisplay, ThresholdState,
};

#[derive(Clone, Copy, ValueEnum)]
enum Detector {
    Corner,
    Line,
}

#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    Gaussian,
    Median,
}

impl From<Filter> for DenoiseKind {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Gaussian => DenoiseKind::Gaussian,
            Filter::Median => DenoiseKind::Median,
        }
    }
}

#[derive(Parser)]
#[command(name = "featscan")]
#[command(about = "Detect corners or lines in a single image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Display name for the image (defaults to the file stem)
    #[arg(long)]
    name: Option<String>,

    /// Uniform resize factor applied after grayscale conversion
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Which features to detect
    #[arg(long, value_enum, default_value_t = Detector::Corner)]
    detector: Detector,

    /// Run the filtered variant with this noise filter
    #[arg(long, value_enum)]
    filter: Option<Filter>,

    /// Corner quality level in [0, 100]
    #[arg(long, default_value_t = 50)]
    quality: i32,

    /// Low edge threshold for line detection in [0, 255]
    #[arg(long, default_value_t = ThresholdState::DEFAULT_LOW)]
    threshold: i32,

    /// Directory for feature files and rendered windows
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Also write every pixel's RGB value to this file
    #[arg(long, value_name = "FILE")]
    dump_pixels: Option<PathBuf>,

    /// After line detection, read thresholds from stdin and redraw (q to stop)
    #[arg(long)]
    tune: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn open<D: FeatureDetector>(args: &Cli, detector: D) -> anyhow::Result<DetectionPipeline<D>> {
    let name = args.name.clone().unwrap_or_else(|| {
        args.image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let pipeline = DetectionPipeline::open(&args.image_path, name, args.scale, detector)
        .with_context(|| format!("Failed to open {}", args.image_path.display()))?
        .with_output_dir(&args.out_dir);

    if let Some(dump) = &args.dump_pixels {
        save_rgb_to_file(pipeline.image().pixels(), dump)?;
    }
    Ok(pipeline)
}

fn process<D: FeatureDetector>(
    args: &Cli,
    pipeline: &mut DetectionPipeline<D>,
    display: &mut PngDisplay,
) -> anyhow::Result<()> {
    let (corners, lines) = {
        let features = match args.filter {
            Some(filter) => pipeline.run_filtered(filter.into(), display)?,
            None => pipeline.run(display)?,
        };
        (features.corner_count(), features.line_count())
    };
    info!("{}: {} corners, {} lines", pipeline.name(), corners, lines);
    Ok(())
}

fn run(args: Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    let mut display = PngDisplay::new(&args.out_dir)?;

    match args.detector {
        Detector::Corner => {
            let mut pipeline = open(&args, CornerDetector::new(args.quality)?)?;
            process(&args, &mut pipeline, &mut display)?;
        }
        Detector::Line => {
            let mut pipeline = open(&args, LineDetector::new(args.threshold)?)?;
            process(&args, &mut pipeline, &mut display)?;

            if args.tune {
                println!("Enter a threshold in [0, {}] per line, q to finish", ThresholdState::DEFAULT_MAX);
                let mut tuner = InteractiveTuner::with_range(args.threshold, ThresholdState::DEFAULT_MAX)?;
                let mut events = ConsoleEvents::new(io::stdin().lock(), ThresholdState::DEFAULT_MAX);
                let summary = tuner.run(&mut pipeline, &mut events, &mut display)?;
                println!(
                    "Final threshold {}: {} lines ({} redraws)",
                    summary.threshold, summary.line_count, summary.renders
                );
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
