//! Agent configuration loaded from environment variables.
//!
//! | Env Var                     | Default               |
//! |-----------------------------|-----------------------|
//! | `MQTT_HOST`                 | `localhost`           |
//! | `MQTT_PORT`                 | `1883`                |
//! | `MQTT_KEEPALIVE_SECS`       | `60`                  |
//! | `MQTT_CLIENT_ID`            | `airq-sim`            |
//! | `MQTT_QOS`                  | `0`                   |
//! | `MQTT_CONNECT_TIMEOUT_SECS` | `10`                  |
//! | `TOPIC_BASE`                | `/tfm/nrr/airquality` |
//! | `MEASURE_INTERVAL_SECS`     | `1`                   |
//! | `ALARM_INTERVAL_SECS`       | `10`                  |
//! | `ALARM_CONFIG_PATH`         | unset                 |
//! | `ALARM_TEMP_H`              | `27`                  |
//! | `ALARM_TEMP_L`              | `19`                  |
//! | `ALARM_HUM_H`               | `65`                  |
//! | `ALARM_HUM_L`               | `50`                  |
//! | `ALARM_VOC_INDEX`           | `150`                 |
//!
//! Thresholds are layered: reference defaults, then the device config
//! document at `ALARM_CONFIG_PATH`, then the individual `ALARM_*` variables.

use std::str::FromStr;
use std::time::Duration;

use airq_core::rules::{ThresholdOverrides, Thresholds};
use airq_core::topics::{Topics, DEFAULT_TOPIC_BASE};
use rumqttc::QoS;

use crate::error::AgentError;

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub client_id: String,
    pub qos: QoS,
    /// How long to wait for the broker's CONNACK at startup.
    pub connect_timeout: Duration,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            keep_alive: Duration::from_secs(60),
            client_id: "airq-sim".into(),
            qos: QoS::AtMostOnce,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub mqtt: MqttSettings,
    pub topics: Topics,
    pub measure_interval: Duration,
    /// Must be strictly longer than `measure_interval`.
    pub alarm_interval: Duration,
    pub thresholds: Thresholds,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MqttSettings::default();

        let mqtt = MqttSettings {
            host: lookup("MQTT_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "MQTT_PORT", defaults.port)?,
            keep_alive: Duration::from_secs(parse_or(&lookup, "MQTT_KEEPALIVE_SECS", 60u64)?),
            client_id: lookup("MQTT_CLIENT_ID").unwrap_or(defaults.client_id),
            qos: parse_qos(parse_or(&lookup, "MQTT_QOS", 0u8)?)?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "MQTT_CONNECT_TIMEOUT_SECS",
                10u64,
            )?),
        };

        let topics = Topics::from_base(
            &lookup("TOPIC_BASE").unwrap_or_else(|| DEFAULT_TOPIC_BASE.to_string()),
        );

        let measure_secs: u64 = parse_or(&lookup, "MEASURE_INTERVAL_SECS", 1)?;
        let alarm_secs: u64 = parse_or(&lookup, "ALARM_INTERVAL_SECS", 10)?;
        if measure_secs == 0 {
            return Err(AgentError::Config(
                "MEASURE_INTERVAL_SECS must be greater than zero".into(),
            ));
        }
        if alarm_secs <= measure_secs {
            return Err(AgentError::Config(format!(
                "ALARM_INTERVAL_SECS ({alarm_secs}) must be greater than MEASURE_INTERVAL_SECS ({measure_secs})"
            )));
        }

        let thresholds = load_thresholds(&lookup)?;

        Ok(Self {
            mqtt,
            topics,
            measure_interval: Duration::from_secs(measure_secs),
            alarm_interval: Duration::from_secs(alarm_secs),
            thresholds,
        })
    }
}

fn load_thresholds<F>(lookup: &F) -> Result<Thresholds, AgentError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut thresholds = Thresholds::default();

    if let Some(path) = lookup("ALARM_CONFIG_PATH") {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| AgentError::Config(format!("cannot read ALARM_CONFIG_PATH '{path}': {e}")))?;
        thresholds = ThresholdOverrides::from_json(&raw)?.apply(thresholds);
    }

    thresholds.temp_high = parse_or(lookup, "ALARM_TEMP_H", thresholds.temp_high)?;
    thresholds.temp_low = parse_or(lookup, "ALARM_TEMP_L", thresholds.temp_low)?;
    thresholds.humidity_high = parse_or(lookup, "ALARM_HUM_H", thresholds.humidity_high)?;
    thresholds.humidity_low = parse_or(lookup, "ALARM_HUM_L", thresholds.humidity_low)?;
    thresholds.voc_index_limit = parse_or(lookup, "ALARM_VOC_INDEX", thresholds.voc_index_limit)?;

    thresholds.validate()?;
    Ok(thresholds)
}

/// Parse `key` if set, otherwise fall back to `default`.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AgentError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AgentError::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}

fn parse_qos(level: u8) -> Result<QoS, AgentError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(AgentError::Config(format!(
            "MQTT_QOS must be 0, 1 or 2, got {other}"
        ))),
    }
}
