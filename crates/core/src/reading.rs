//! A single sensor measurement.

use serde::{Deserialize, Serialize};

/// One snapshot of the simulated SHT40 + SGP40 sensor pair.
///
/// Field order matches the measures payload:
/// `{"humidity_rh", "temp_celsius", "voc_raw", "voc_index"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Relative humidity, percent.
    #[serde(rename = "humidity_rh")]
    pub humidity: i32,
    /// Temperature in degrees Celsius.
    #[serde(rename = "temp_celsius")]
    pub temperature: i32,
    /// Raw SGP40 ticks.
    pub voc_raw: i32,
    /// Processed VOC index (1..=500).
    pub voc_index: i32,
}

impl Reading {
    pub fn new(humidity: i32, temperature: i32, voc_raw: i32, voc_index: i32) -> Self {
        Self {
            humidity,
            temperature,
            voc_raw,
            voc_index,
        }
    }
}
