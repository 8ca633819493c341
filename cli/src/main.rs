use motion_detector_common::config::Config;
use motion_detector_core::{
    CaptureOptions, Classification, Detection, ImageSequenceCamera, MotionDetector,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

const USAGE: &str = "usage: motion-detector [config.toml] <frame1> <frame2>";

#[derive(Debug, Serialize)]
struct Report {
    camera: String,
    classifications: Vec<Classification>,
    detections: Vec<Detection>,
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, frame_paths) = match args.as_slice() {
        [first, second] => (PathBuf::from("config.toml"), [first, second]),
        [config, first, second] => (PathBuf::from(config), [first, second]),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        camera = config.camera.name,
        sensitivity = config.detector.effective_sensitivity(),
        min_box_size = config.detector.min_box_size,
        denoise_kernel = config.detector.denoise_kernel,
        close_kernel = config.detector.close_kernel,
        "starting motion detector"
    );

    let camera = ImageSequenceCamera::new(
        config.camera.name.clone(),
        frame_paths.iter().map(|p| PathBuf::from(p.as_str())).collect(),
    );
    let detector = match MotionDetector::new(&config, camera) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "invalid detector configuration");
            std::process::exit(1);
        }
    };

    let options = CaptureOptions {
        return_image: false,
        return_classifications: true,
        return_detections: true,
    };
    let result = match detector
        .capture_all_from_camera(&config.camera.name, options)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "motion detection failed");
            std::process::exit(1);
        }
    };

    let report = Report {
        camera: config.camera.name.clone(),
        classifications: result.classifications.unwrap_or_default(),
        detections: result.detections.unwrap_or_default(),
    };
    info!(
        confidence = report.classifications.first().map(|c| c.confidence),
        detections = report.detections.len(),
        "motion analysis complete"
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!(error = %e, "failed to serialize report");
            std::process::exit(1);
        }
    }
}
