//! Remote face detection through an external HTTP client.
//!
//! Uploads the captured photo to the visual-recognition `detect_faces`
//! endpoint with `curl` and stores the response body as the detection
//! result document.

use crate::detection::{read_detection_file, DetectionError};
use crate::types::FaceCount;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Pinned API version of the detection endpoint.
pub const API_VERSION: &str = "2018-03-19";

pub const DEFAULT_ENDPOINT: &str =
    "https://gateway.watsonplatform.net/visual-recognition/api/v3/detect_faces?version=2018-03-19";

/// Multipart form field the service expects the image under.
const IMAGE_FIELD: &str = "images_file";

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create result file {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// HTTP client binary (default: curl).
    pub http_client: String,
    pub api_key: String,
    pub endpoint: String,
}

impl RecognizerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: "curl".to_string(),
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Client for the remote face-detection service.
pub struct FaceApi {
    config: RecognizerConfig,
}

impl FaceApi {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the HTTP client for one upload.
    pub fn args(&self, image: &Path) -> Vec<String> {
        vec![
            "-s".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            "-u".to_string(),
            format!("apikey:{}", self.config.api_key),
            "--form".to_string(),
            format!("{IMAGE_FIELD}=@{}", image.display()),
            self.config.endpoint.clone(),
        ]
    }

    /// Upload `image` and write the response body to `output`.
    ///
    /// `output` is truncated first, so a failed call never leaves the
    /// previous cycle's result behind.
    pub fn detect(&self, image: &Path, output: &Path) -> Result<PathBuf, RecognizerError> {
        let program = &self.config.http_client;
        let out = File::create(output).map_err(|source| RecognizerError::Output {
            path: output.display().to_string(),
            source,
        })?;

        tracing::debug!(
            client = %program,
            image = %image.display(),
            endpoint = %self.config.endpoint,
            "uploading image for face detection"
        );

        let status = Command::new(program)
            .args(self.args(image))
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::null())
            .status()
            .map_err(|source| RecognizerError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RecognizerError::Failed {
                program: program.clone(),
                status,
            });
        }

        Ok(output.to_path_buf())
    }

    /// Detect faces in `image` and count them from the stored result.
    pub fn count_faces(&self, image: &Path, output: &Path) -> Result<FaceCount, RecognizerError> {
        let result = self.detect(image, output)?;
        Ok(read_detection_file(result)?)
    }
}
