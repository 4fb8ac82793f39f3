//! `airq-core` -- domain types and alarm edge detection for the air-quality
//! sensor simulator.
//!
//! Pure logic only: no I/O, no clocks, no randomness. The agent crate wires
//! these types to a measurement source and an MQTT publisher.

pub mod alarm;
pub mod error;
pub mod reading;
pub mod rules;
pub mod topics;
pub mod tracker;

pub use alarm::{AlarmClass, AlarmEvent};
pub use error::CoreError;
pub use reading::Reading;
pub use rules::{AlarmRule, Comparison, Field, RuleTable, ThresholdOverrides, Thresholds};
pub use tracker::{AlarmDiff, AlarmTracker};
