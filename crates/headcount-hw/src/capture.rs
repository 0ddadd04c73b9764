//! Still photo capture via `fswebcam`.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// File name of the captured photo inside the capture directory.
pub const PHOTO_FILE_NAME: &str = "image.jpg";

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("capture produced no file at {0}")]
    MissingOutput(String),
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture utility binary (default: fswebcam).
    pub binary: String,
    /// Requested resolution, `WIDTHxHEIGHT`.
    pub resolution: String,
    /// Keep fswebcam's caption banner on the image.
    pub banner: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            binary: "fswebcam".to_string(),
            resolution: "1280x720".to_string(),
            banner: false,
        }
    }
}

/// Webcam driven through an external capture utility.
pub struct Webcam {
    config: CaptureConfig,
}

impl Webcam {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Path the photo is written to for a given capture directory.
    pub fn photo_path(dir: &Path) -> PathBuf {
        dir.join(PHOTO_FILE_NAME)
    }

    pub fn args(&self, output: &Path) -> Vec<String> {
        let mut args = vec!["-r".to_string(), self.config.resolution.clone()];
        if !self.config.banner {
            args.push("--no-banner".to_string());
        }
        args.push(output.display().to_string());
        args
    }

    /// Capture one photo into `dir`, overwriting the previous one.
    pub fn capture(&self, dir: &Path) -> Result<PathBuf, CaptureError> {
        let program = &self.config.binary;
        let output = Self::photo_path(dir);

        let status = Command::new(program)
            .args(self.args(&output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| CaptureError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CaptureError::Failed {
                program: program.clone(),
                status,
            });
        }

        // fswebcam can exit 0 without writing a frame.
        if !output.exists() {
            return Err(CaptureError::MissingOutput(output.display().to_string()));
        }

        tracing::debug!(path = %output.display(), resolution = %self.config.resolution, "photo captured");
        Ok(output)
    }
}
