//! `airq-agent` -- synthetic air-quality sensor.
//!
//! Publishes a randomized temperature / humidity / VOC reading to the
//! measures topic every tick and, on a slower cadence, announces alarm
//! transitions derived from threshold rules to the alarms topic. Exists to
//! exercise the monitoring pipeline without real hardware.
//!
//! See [`airq_agent::config`] for the environment variables it reads.

use airq_agent::config::AgentConfig;
use airq_agent::driver::{self, DriverSettings};
use airq_agent::publisher::MqttPublisher;
use airq_agent::source::RandomSource;
use airq_core::{AlarmTracker, RuleTable};
use tokio_util::sync::CancellationToken;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airq_agent=info,airq_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        host = %config.mqtt.host,
        port = config.mqtt.port,
        client_id = %config.mqtt.client_id,
        thresholds = ?config.thresholds,
        "Starting airq-agent",
    );

    let publisher = MqttPublisher::connect(&config.mqtt)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Cannot reach MQTT broker");
            std::process::exit(1);
        });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let mut source = RandomSource::new();
    let mut tracker = AlarmTracker::new(RuleTable::from_thresholds(&config.thresholds));
    let settings = DriverSettings::from(&config);

    let stats = driver::run(&mut source, &mut tracker, &publisher, &settings, cancel).await;

    tracing::info!(
        measurements = stats.measurements_published,
        evaluations = stats.alarm_evaluations,
        alarms = stats.alarms_published,
        failures = stats.publish_failures,
        "Interrupted by user, releasing broker connection",
    );

    publisher.disconnect().await;

    tracing::info!("Shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
