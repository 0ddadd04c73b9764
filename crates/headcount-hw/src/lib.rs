//! headcount-hw — Hardware access for the people counter.
//!
//! Photo capture through an external webcam utility and PIR motion
//! sensing through the Linux sysfs GPIO interface.

pub mod capture;
pub mod motion;

pub use capture::{CaptureConfig, CaptureError, Webcam};
pub use motion::{MotionError, MotionSensor};
