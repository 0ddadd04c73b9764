use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use headcount_core::{read_detection_file, FaceApi, TelemetryMessage};
use headcount_hw::motion::{DEFAULT_INDICATOR_LINE, DEFAULT_INPUT_LINE};
use headcount_hw::{MotionSensor, Webcam};
use headcountd::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "headcount", about = "headcount people-counter CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one photo
    Capture {
        /// Directory to write image.jpg into (default: configured photo dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Run face detection on an image and print the face count
    Detect {
        image: PathBuf,
    },
    /// Parse a stored detection result and print the face count
    Parse {
        result: PathBuf,
    },
    /// Capture, detect, and print the telemetry payload
    Count,
    /// Publish a people count once to the configured broker
    Publish {
        count: u32,
    },
    /// Read the PIR motion sensor
    Motion {
        /// Sensor input GPIO line
        #[arg(long, default_value_t = DEFAULT_INPUT_LINE)]
        input: u32,
        /// Indicator output GPIO line
        #[arg(long, default_value_t = DEFAULT_INDICATOR_LINE)]
        output: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Capture { dir } => {
            let dir = dir.unwrap_or_else(|| config.photo_dir.clone());
            let photo = Webcam::new(config.capture.clone()).capture(&dir)?;
            println!("{}", photo.display());
        }
        Commands::Detect { image } => {
            config.validate_recognizer()?;
            let count = FaceApi::new(config.recognizer.clone())
                .count_faces(&image, &config.result_path)?;
            println!("{}", serde_json::to_string(&count)?);
        }
        Commands::Parse { result } => {
            let count = read_detection_file(&result)?;
            println!("{}", serde_json::to_string(&count)?);
        }
        Commands::Count => {
            config.validate_recognizer()?;
            let photo = Webcam::new(config.capture.clone()).capture(&config.photo_dir)?;
            let count = FaceApi::new(config.recognizer.clone())
                .count_faces(&photo, &config.result_path)?;
            println!("{}", TelemetryMessage::from(count).to_payload());
        }
        Commands::Publish { count } => {
            config.validate_broker()?;
            let message = TelemetryMessage::new(count);
            headcountd::publisher::publish_once(&config.broker, &message).await?;
            println!("{}", message.to_payload());
        }
        Commands::Motion { input, output } => {
            let level = MotionSensor::new(input, output).read()?;
            println!("{}", if level { "motion" } else { "idle" });
        }
    }

    Ok(())
}
