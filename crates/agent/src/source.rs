//! Measurement sources.
//!
//! [`MeasurementSource`] is the seam between the driver loop and whatever
//! produces readings. [`RandomSource`] stands in for the SHT40/SGP40 sensor
//! pair by sampling each field uniformly; [`ScriptedSource`] replays fixed
//! readings so tests and demos are reproducible.

use std::ops::RangeInclusive;

use airq_core::Reading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces one [`Reading`] per measurement tick.
pub trait MeasurementSource: Send {
    fn sample(&mut self) -> Reading;
}

/// Relative humidity range, percent.
pub const HUMIDITY_RANGE: RangeInclusive<i32> = 0..=100;
/// Temperature range, degrees Celsius.
pub const TEMPERATURE_RANGE: RangeInclusive<i32> = -10..=55;
/// Raw SGP40 tick range.
pub const VOC_RAW_RANGE: RangeInclusive<i32> = 100..=1000;
/// VOC index range.
pub const VOC_INDEX_RANGE: RangeInclusive<i32> = 1..=500;

/// Uniform sampler over the sensor ranges above.
pub struct RandomSource<R = StdRng> {
    rng: R,
}

impl RandomSource {
    /// Sampler seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSource<R> {
    /// Sample with a caller-supplied generator, e.g. a seeded one.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> MeasurementSource for RandomSource<R> {
    fn sample(&mut self) -> Reading {
        Reading {
            humidity: self.rng.random_range(HUMIDITY_RANGE),
            temperature: self.rng.random_range(TEMPERATURE_RANGE),
            voc_raw: self.rng.random_range(VOC_RAW_RANGE),
            voc_index: self.rng.random_range(VOC_INDEX_RANGE),
        }
    }
}

/// Replays a fixed list of readings, then keeps repeating the last one.
pub struct ScriptedSource {
    readings: Vec<Reading>,
    next: usize,
}

impl ScriptedSource {
    /// # Panics
    ///
    /// Panics if `readings` is empty.
    pub fn new(readings: Vec<Reading>) -> Self {
        assert!(!readings.is_empty(), "ScriptedSource needs at least one reading");
        Self { readings, next: 0 }
    }

    /// Number of readings handed out so far.
    pub fn sampled(&self) -> usize {
        self.next
    }
}

impl MeasurementSource for ScriptedSource {
    fn sample(&mut self) -> Reading {
        let idx = self.next.min(self.readings.len() - 1);
        self.next += 1;
        self.readings[idx]
    }
}
