use anyhow::{Context, Result};
use headcountd::{CameraSensor, Config, MqttPublisher, Poller};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("headcountd starting");

    let config = Config::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    tracing::info!(
        photo_dir = %config.photo_dir.display(),
        result_path = %config.result_path.display(),
        interval_secs = config.poll_interval.as_secs(),
        "configuration loaded"
    );

    let publisher = MqttPublisher::connect(&config.broker);
    let sensor = CameraSensor::new(&config);
    let mut poller = Poller::new(sensor, publisher, config.poll_interval);

    tracing::info!("headcountd ready");

    // Runs until signaled
    poller
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("headcountd shutting down");
    poller.into_telemetry().disconnect().await?;

    Ok(())
}
