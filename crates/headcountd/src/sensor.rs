//! People-count source: photo capture followed by remote face detection.

use crate::config::Config;
use headcount_core::{FaceApi, FaceCount, RecognizerError};
use headcount_hw::{CaptureError, Webcam};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    #[error("recognition error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("sensor worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Produces one people count per call.
#[allow(async_fn_in_trait)]
pub trait Sensor {
    async fn people_count(&mut self) -> Result<FaceCount, SensorError>;
}

struct Pipeline {
    webcam: Webcam,
    api: FaceApi,
    photo_dir: PathBuf,
    result_path: PathBuf,
}

impl Pipeline {
    fn run(&self) -> Result<FaceCount, SensorError> {
        let photo = self.webcam.capture(&self.photo_dir)?;
        let count = self.api.count_faces(&photo, &self.result_path)?;
        tracing::debug!(
            faces = count.face_number,
            location = ?count.location,
            "faces detected"
        );
        Ok(count)
    }
}

/// Webcam plus face-detection service. Both steps run external programs,
/// so each cycle executes on the blocking pool.
pub struct CameraSensor {
    pipeline: Arc<Pipeline>,
}

impl CameraSensor {
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                webcam: Webcam::new(config.capture.clone()),
                api: FaceApi::new(config.recognizer.clone()),
                photo_dir: config.photo_dir.clone(),
                result_path: config.result_path.clone(),
            }),
        }
    }
}

impl Sensor for CameraSensor {
    async fn people_count(&mut self) -> Result<FaceCount, SensorError> {
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || pipeline.run()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.photo_dir = dir.path().to_path_buf();
        config.result_path = dir.path().join("out_faces.json");
        config.capture.binary = "false".into();

        let err = CameraSensor::new(&config).people_count().await.unwrap_err();
        assert!(matches!(err, SensorError::Capture(CaptureError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_people_count_success() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("image.jpg"), b"\xff\xd8").unwrap();
        let client = dir.path().join("fake-curl");
        std::fs::write(
            &client,
            "#!/bin/sh\necho '{\"images\":[{\"faces\":[{\"face_location\":{\"height\":8,\"width\":6,\"left\":2,\"top\":4}}]}]}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&client, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = Config::default();
        config.photo_dir = dir.path().to_path_buf();
        config.result_path = dir.path().join("out_faces.json");
        config.capture.binary = "true".into();
        config.recognizer.http_client = client.display().to_string();
        let mut sensor = CameraSensor::new(&config);

        // A concurrent fork in another test thread can briefly hold the fresh script open.
        let mut result = sensor.people_count().await;
        for _ in 0..20 {
            match &result {
                Err(SensorError::Recognizer(RecognizerError::Spawn { source, .. }))
                    if source.raw_os_error() == Some(26) =>
                {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    result = sensor.people_count().await;
                }
                _ => break,
            }
        }

        let count = result.unwrap();
        assert_eq!(count.face_number, 1);
        assert_eq!(
            count.location,
            Some(headcount_core::FaceLocation { height: 8, width: 6, left: 2, top: 4 })
        );
    }

    #[tokio::test]
    async fn test_recognizer_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("image.jpg"), b"\xff\xd8").unwrap();
        let mut config = Config::default();
        config.photo_dir = dir.path().to_path_buf();
        config.result_path = dir.path().join("out_faces.json");
        config.capture.binary = "true".into();
        config.recognizer.http_client = "false".into();

        let err = CameraSensor::new(&config).people_count().await.unwrap_err();
        assert!(matches!(err, SensorError::Recognizer(RecognizerError::Failed { .. })));
    }
}
