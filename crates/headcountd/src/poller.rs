//! Fixed-interval polling loop: count, publish, sleep.

use crate::publisher::{PublishError, Telemetry};
use crate::sensor::{Sensor, SensorError};
use headcount_core::TelemetryMessage;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// Running totals since the poller started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub cycles: u64,
    pub published: u64,
    pub failures: u64,
}

pub struct Poller<S, T> {
    sensor: S,
    telemetry: T,
    interval: Duration,
    stats: PollStats,
}

impl<S: Sensor, T: Telemetry> Poller<S, T> {
    pub fn new(sensor: S, telemetry: T, interval: Duration) -> Self {
        Self {
            sensor,
            telemetry,
            interval,
            stats: PollStats::default(),
        }
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn into_telemetry(self) -> T {
        self.telemetry
    }

    /// Count people once and publish the result.
    pub async fn cycle(&mut self) -> Result<TelemetryMessage, CycleError> {
        let count = self.sensor.people_count().await?;
        let message = TelemetryMessage::from(count);
        self.telemetry.publish(&message).await?;
        Ok(message)
    }

    /// One cycle followed by the fixed pause. A failed cycle skips its
    /// publish; the pause is the same either way.
    async fn tick(&mut self) {
        self.stats.cycles += 1;
        match self.cycle().await {
            Ok(message) => {
                self.stats.published += 1;
                tracing::info!(payload = %message.to_payload(), "published");
            }
            Err(e) => {
                self.stats.failures += 1;
                tracing::warn!(error = %e, cycle = self.stats.cycles, "cycle failed");
            }
        }
        tokio::time::sleep(self.interval).await;
    }

    /// Poll until `shutdown` resolves.
    pub async fn run_until<F: Future>(&mut self, shutdown: F) -> PollStats {
        tokio::pin!(shutdown);
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "polling started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.tick() => {}
            }
        }
        tracing::info!(
            cycles = self.stats.cycles,
            published = self.stats.published,
            failures = self.stats.failures,
            "polling stopped"
        );
        self.stats
    }
}
