//! PIR motion sensor on a sysfs GPIO line.
//!
//! Lines are addressed by kernel (BCM) number. The sensor input on header
//! pin 11 is GPIO 17; the indicator LED on header pin 3 is GPIO 2.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";
pub const DEFAULT_INPUT_LINE: u32 = 17;
pub const DEFAULT_INDICATOR_LINE: u32 = 2;

#[derive(Error, Debug)]
pub enum MotionError {
    #[error("gpio {line}: {op} failed: {source}")]
    Sysfs {
        line: u32,
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("gpio {line}: unexpected value {value:?}")]
    BadValue { line: u32, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// PIR sensor input paired with an indicator output.
pub struct MotionSensor {
    root: PathBuf,
    input: u32,
    indicator: u32,
}

impl MotionSensor {
    pub fn new(input: u32, indicator: u32) -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT, input, indicator)
    }

    /// Use an alternate sysfs GPIO root.
    pub fn with_root(root: impl AsRef<Path>, input: u32, indicator: u32) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            input,
            indicator,
        }
    }

    /// Configure both lines and return the instantaneous input level.
    pub fn read(&self) -> Result<bool, MotionError> {
        self.configure(self.input, Direction::In)?;
        self.configure(self.indicator, Direction::Out)?;

        let value_path = self.line_dir(self.input).join("value");
        let raw = std::fs::read_to_string(&value_path).map_err(|source| MotionError::Sysfs {
            line: self.input,
            op: "read value",
            source,
        })?;

        let level = match raw.trim() {
            "0" => false,
            "1" => true,
            other => {
                return Err(MotionError::BadValue {
                    line: self.input,
                    value: other.to_string(),
                })
            }
        };
        tracing::debug!(line = self.input, level, "motion sensor read");
        Ok(level)
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{line}"))
    }

    /// Export `line` if it is not yet exported, then set its direction.
    fn configure(&self, line: u32, direction: Direction) -> Result<(), MotionError> {
        let dir = self.line_dir(line);
        if !dir.exists() {
            std::fs::write(self.root.join("export"), line.to_string()).map_err(|source| {
                MotionError::Sysfs {
                    line,
                    op: "export",
                    source,
                }
            })?;
        }

        std::fs::write(dir.join("direction"), direction.as_str()).map_err(|source| {
            MotionError::Sysfs {
                line,
                op: "set direction",
                source,
            }
        })
    }
}

impl Default for MotionSensor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_LINE, DEFAULT_INDICATOR_LINE)
    }
}
