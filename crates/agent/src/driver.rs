//! Measurement and alarm cadences.
//!
//! Every `measure_interval` a reading is sampled and published to the
//! measures topic. Every `alarm_interval` the most recent reading is run
//! through the [`AlarmTracker`] and the resulting transitions are published
//! one by one to the alarms topic, deactivations first.
//!
//! Delivery is best effort: the tracker records a transition as soon as it
//! is computed, so an alarm event whose publish fails is not retried.

use std::time::Duration;

use airq_core::topics::Topics;
use airq_core::{AlarmTracker, Reading};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::publisher::{publish_json, Publisher};
use crate::source::MeasurementSource;

/// Topics and cadences for [`run`].
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub topics: Topics,
    pub measure_interval: Duration,
    pub alarm_interval: Duration,
}

impl From<&AgentConfig> for DriverSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            topics: config.topics.clone(),
            measure_interval: config.measure_interval,
            alarm_interval: config.alarm_interval,
        }
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub measurements_published: u64,
    pub alarm_evaluations: u64,
    pub alarms_published: u64,
    pub publish_failures: u64,
}

/// Run both cadences until `cancel` fires.
///
/// Publish failures are logged and counted; they never stop the loop.
pub async fn run<S, P>(
    source: &mut S,
    tracker: &mut AlarmTracker,
    publisher: &P,
    settings: &DriverSettings,
    cancel: CancellationToken,
) -> DriverStats
where
    S: MeasurementSource + ?Sized,
    P: Publisher + ?Sized,
{
    let mut measure_ticker = tokio::time::interval(settings.measure_interval);
    measure_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // First alarm evaluation one full alarm period after startup.
    let mut alarm_ticker = tokio::time::interval_at(
        Instant::now() + settings.alarm_interval,
        settings.alarm_interval,
    );
    alarm_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut latest: Option<Reading> = None;
    let mut stats = DriverStats::default();

    tracing::info!(
        measures_topic = %settings.topics.measures,
        alarms_topic = %settings.topics.alarms,
        measure_interval_secs = settings.measure_interval.as_secs_f64(),
        alarm_interval_secs = settings.alarm_interval.as_secs_f64(),
        "Publishing loop started",
    );

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!("Publishing loop interrupted");
                break;
            }
            _ = measure_ticker.tick() => {
                let reading = source.sample();
                latest = Some(reading);
                publish_measurement(publisher, &settings.topics, &reading, &mut stats).await;
            }
            _ = alarm_ticker.tick() => {
                let Some(reading) = latest else {
                    continue;
                };
                stats.alarm_evaluations += 1;
                publish_alarms(publisher, &settings.topics, tracker, &reading, &mut stats).await;
            }
        }
    }

    stats
}

async fn publish_measurement<P>(
    publisher: &P,
    topics: &Topics,
    reading: &Reading,
    stats: &mut DriverStats,
) where
    P: Publisher + ?Sized,
{
    match publish_json(publisher, &topics.measures, reading).await {
        Ok(payload) => {
            stats.measurements_published += 1;
            tracing::debug!(topic = %topics.measures, %payload, "Published measurement");
        }
        Err(e) => {
            stats.publish_failures += 1;
            tracing::warn!(topic = %topics.measures, error = %e, "Failed to publish measurement");
        }
    }
}

async fn publish_alarms<P>(
    publisher: &P,
    topics: &Topics,
    tracker: &mut AlarmTracker,
    reading: &Reading,
    stats: &mut DriverStats,
) where
    P: Publisher + ?Sized,
{
    let diff = tracker.evaluate(reading);

    for event in diff.publish_order() {
        let kind = if event.is_activation() { "activation" } else { "deactivation" };
        match publish_json(publisher, &topics.alarms, event).await {
            Ok(payload) => {
                stats.alarms_published += 1;
                tracing::info!(
                    topic = %topics.alarms,
                    alarm_class = %event.alarm_class,
                    kind,
                    %payload,
                    "Published alarm",
                );
            }
            Err(e) => {
                stats.publish_failures += 1;
                tracing::warn!(
                    topic = %topics.alarms,
                    alarm_class = %event.alarm_class,
                    kind,
                    error = %e,
                    "Failed to publish alarm",
                );
            }
        }
    }
}
