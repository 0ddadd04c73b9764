//! headcount-core — People counting from face-detection results.
//!
//! Parses the detection result document produced by the remote
//! face-detection service, drives that service through an external
//! HTTP client, and builds the telemetry message published per cycle.

pub mod detection;
pub mod recognizer;
pub mod telemetry;
pub mod types;

pub use detection::{parse_detection, read_detection_file, DetectionError};
pub use recognizer::{FaceApi, RecognizerConfig, RecognizerError};
pub use telemetry::TelemetryMessage;
pub use types::{DetectionDocument, FaceCount, FaceLocation};
