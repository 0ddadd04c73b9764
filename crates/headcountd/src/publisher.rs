//! MQTT telemetry publisher.

use crate::config::BrokerConfig;
use headcount_core::TelemetryMessage;
use rumqttc::{AsyncClient, ClientError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Capacity of the client request channel.
const REQUEST_CAPACITY: usize = 10;
/// Pause after a connection error before the event loop reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Upper bound on a one-shot publish, connect to disconnect.
const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(10);
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("mqtt client: {0}")]
    Client(#[from] ClientError),
    #[error("mqtt connection: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    #[error("timed out waiting for the broker")]
    Timeout,
}

/// Destination for per-cycle telemetry.
#[allow(async_fn_in_trait)]
pub trait Telemetry {
    async fn publish(&mut self, message: &TelemetryMessage) -> Result<(), PublishError>;
}

fn mqtt_options(config: &BrokerConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options
        .set_keep_alive(config.keep_alive)
        .set_credentials(&config.username, &config.password);
    options
}

/// Long-lived broker connection; publishes are fire-and-forget (QoS 0).
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
    driver: JoinHandle<()>,
}

impl MqttPublisher {
    /// Open the broker connection and spawn the task driving it.
    pub fn connect(config: &BrokerConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
        tracing::info!(
            host = %config.host,
            port = config.port,
            client_id = %config.client_id,
            topic = %config.topic,
            "connecting to broker"
        );
        let driver = tokio::spawn(drive(eventloop));
        Self {
            client,
            topic: config.topic.clone(),
            driver,
        }
    }

    /// Send DISCONNECT and stop the connection task.
    pub async fn disconnect(self) -> Result<(), PublishError> {
        let result = self.client.disconnect().await;
        let abort = self.driver.abort_handle();
        // The driver exits once the DISCONNECT is written.
        if tokio::time::timeout(DISCONNECT_GRACE, self.driver).await.is_err() {
            abort.abort();
        }
        result.map_err(PublishError::from)
    }
}

impl Telemetry for MqttPublisher {
    async fn publish(&mut self, message: &TelemetryMessage) -> Result<(), PublishError> {
        let payload = message.to_payload();
        // Never wait on a full request queue while the broker is unreachable;
        // the message is dropped instead.
        self.client
            .try_publish(&self.topic, QoS::AtMostOnce, false, payload.into_bytes())?;
        Ok(())
    }
}

/// Poll the event loop forever. rumqttc reconnects on the next poll after an error.
async fn drive(mut eventloop: EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "broker connected");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("broker disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "broker connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Connect, publish a single message, and disconnect.
pub async fn publish_once(
    config: &BrokerConfig,
    message: &TelemetryMessage,
) -> Result<(), PublishError> {
    let (client, mut eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);
    client
        .publish(&config.topic, QoS::AtMostOnce, false, message.to_payload().into_bytes())
        .await?;
    client.disconnect().await?;

    tokio::time::timeout(ONE_SHOT_TIMEOUT, flush(&mut eventloop, &config.topic))
        .await
        .map_err(|_| PublishError::Timeout)?
}

/// Drive `eventloop` until the queued DISCONNECT has gone out.
async fn flush(eventloop: &mut EventLoop, topic: &str) -> Result<(), PublishError> {
    loop {
        match eventloop.poll().await? {
            Event::Outgoing(Outgoing::Publish(_)) => {
                tracing::debug!(topic, "publish sent");
            }
            Event::Outgoing(Outgoing::Disconnect) => return Ok(()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> BrokerConfig {
        BrokerConfig {
            host: "broker.local".into(),
            port: 1883,
            client_id: "d:org:raspberry:main".into(),
            username: "use-token-auth".into(),
            password: "secret".into(),
            topic: "iot-2/evt/status/fmt/json".into(),
            keep_alive: Duration::from_secs(60),
        }
    }

    fn unreachable_broker() -> BrokerConfig {
        BrokerConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..broker()
        }
    }

    #[tokio::test]
    async fn test_publish_drops_when_queue_full() {
        let mut publisher = MqttPublisher::connect(&unreachable_broker());
        let message = TelemetryMessage::new(3);

        // Nothing yields in between, so the driver never drains the queue.
        for _ in 0..REQUEST_CAPACITY {
            publisher.publish(&message).await.unwrap();
        }
        let err = publisher.publish(&message).await.unwrap_err();
        assert!(matches!(err, PublishError::Client(_)));

        publisher.driver.abort();
    }

    #[tokio::test]
    async fn test_publish_once_unreachable_broker() {
        let err = publish_once(&unreachable_broker(), &TelemetryMessage::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Connection(_)));
    }

    #[test]
    fn test_mqtt_options() {
        let options = mqtt_options(&broker());
        assert_eq!(options.broker_address(), ("broker.local".to_string(), 1883));
        assert_eq!(options.client_id(), "d:org:raspberry:main");
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert_eq!(
            options.credentials(),
            Some(("use-token-auth".to_string(), "secret".to_string()))
        );
    }
}
