mod alarm;
mod config;
mod sensors;
mod uplink;

use alarm::{AlarmAction, AlarmMonitor};
use config::NodeConfig;
use sensors::{SensorReader, SimulatedSource};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use uplink::{UplinkPayload, WebhookUplink};

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = NodeConfig::from_env()?;

    info!("Sensor node starting: {}", config.device_id);
    info!("  Webhook: {}", config.webhook_url);

    let mut source = SimulatedSource::new();
    if let Some((start, len)) = config.gas_event {
        info!("  Simulated gas event at sample {} for {} samples", start, len);
        source = source.with_gas_event(start, len);
    }
    let mut reader = SensorReader::new(Box::new(source));
    info!("  Sensor source: {}", reader.source_name());

    info!("Calibrating gas sensors in clean air...");
    reader
        .calibrate(config.calibration_samples, config.calibration_delay)
        .await?;

    let uplink = Arc::new(WebhookUplink::new(
        config.webhook_url.clone(),
        config.upload_timeout,
    )?);
    let mut monitor = AlarmMonitor::new();

    let mut wind_ticker = interval(config.wind_interval);
    let mut sample_ticker = interval(config.sample_interval);
    let mut upload_ticker = interval(config.upload_interval);
    for ticker in [&mut wind_ticker, &mut sample_ticker, &mut upload_ticker] {
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }
    // First upload waits a full period so a sample exists
    upload_ticker.tick().await;

    // Main event loop
    loop {
        tokio::select! {
            _ = wind_ticker.tick() => {
                match reader.measure_wind().await {
                    Ok(speed) => debug!("Wind speed: {:.2} m/s", speed),
                    Err(e) => warn!("Failed to read anemometer: {}", e),
                }
            }
            _ = sample_ticker.tick() => {
                let readings = match reader.sample().await {
                    Ok(readings) => readings,
                    Err(e) => {
                        error!("Failed to read sensors: {}", e);
                        continue;
                    }
                };
                for action in monitor.evaluate(&readings) {
                    match action {
                        AlarmAction::Siren { on } => {
                            if let Err(e) = reader.set_siren(on).await {
                                error!("Failed to switch siren: {}", e);
                            }
                        }
                        AlarmAction::Notify { message } => {
                            info!("Alert for {}: {}", config.device_id, message);
                        }
                    }
                }
            }
            _ = upload_ticker.tick() => {
                let Some(readings) = reader.latest() else {
                    debug!("No readings yet, skipping upload");
                    continue;
                };
                let payload = UplinkPayload::new(&readings, reader.wind_speed());
                let uplink = uplink.clone();
                tokio::spawn(async move {
                    match uplink.send(&payload).await {
                        Ok(()) => debug!("Uploaded reading to {}", uplink.url()),
                        Err(e) => error!("Failed to upload reading: {}", e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
