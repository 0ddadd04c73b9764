//! headcountd — People-counting telemetry daemon.
//!
//! Each cycle captures a photo, has the remote service detect faces in it,
//! and publishes the resulting count to an MQTT broker.

pub mod config;
pub mod poller;
pub mod publisher;
pub mod sensor;

pub use config::Config;
pub use poller::{PollStats, Poller};
pub use publisher::{MqttPublisher, Telemetry};
pub use sensor::{CameraSensor, Sensor};
