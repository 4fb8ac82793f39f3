//! Threshold rule table.
//!
//! A [`RuleTable`] is an ordered, immutable list of [`AlarmRule`]s. The
//! table's order is the emission order used by the
//! [`AlarmTracker`](crate::AlarmTracker); adding a class or moving a limit
//! only touches the table.

use std::collections::HashSet;

use serde::Deserialize;

use crate::alarm::AlarmClass;
use crate::error::CoreError;
use crate::reading::Reading;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Reference high-temperature limit, degrees Celsius.
pub const DEFAULT_TEMP_HIGH: i32 = 27;
/// Reference low-temperature limit, degrees Celsius.
pub const DEFAULT_TEMP_LOW: i32 = 19;
/// Reference high-humidity limit, percent RH.
pub const DEFAULT_HUMIDITY_HIGH: i32 = 65;
/// Reference low-humidity limit, percent RH.
pub const DEFAULT_HUMIDITY_LOW: i32 = 50;
/// Reference VOC index limit.
pub const DEFAULT_VOC_INDEX_LIMIT: i32 = 150;

/// Numeric limits the reference rule table is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub temp_high: i32,
    pub temp_low: i32,
    pub humidity_high: i32,
    pub humidity_low: i32,
    pub voc_index_limit: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temp_high: DEFAULT_TEMP_HIGH,
            temp_low: DEFAULT_TEMP_LOW,
            humidity_high: DEFAULT_HUMIDITY_HIGH,
            humidity_low: DEFAULT_HUMIDITY_LOW,
            voc_index_limit: DEFAULT_VOC_INDEX_LIMIT,
        }
    }
}

impl Thresholds {
    /// Reject limit pairs where the low limit is not below the high limit.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.temp_low >= self.temp_high {
            return Err(CoreError::Validation(format!(
                "temperature low limit ({}) must be below high limit ({})",
                self.temp_low, self.temp_high
            )));
        }
        if self.humidity_low >= self.humidity_high {
            return Err(CoreError::Validation(format!(
                "humidity low limit ({}) must be below high limit ({})",
                self.humidity_low, self.humidity_high
            )));
        }
        Ok(())
    }
}

/// Partial threshold update in the device configuration format.
///
/// Every key is optional; other device settings that share the document
/// (`screen_sec`, `room`, `rst_wifi_prov`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThresholdOverrides {
    pub alarm_temp_h: Option<i32>,
    pub alarm_temp_l: Option<i32>,
    pub alarm_hum_h: Option<i32>,
    pub alarm_hum_l: Option<i32>,
    pub alarm_voc: Option<i32>,
}

impl ThresholdOverrides {
    /// Parse a device configuration JSON document.
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid threshold document: {e}")))
    }

    /// Apply the present keys on top of `base`.
    pub fn apply(&self, base: Thresholds) -> Thresholds {
        Thresholds {
            temp_high: self.alarm_temp_h.unwrap_or(base.temp_high),
            temp_low: self.alarm_temp_l.unwrap_or(base.temp_low),
            humidity_high: self.alarm_hum_h.unwrap_or(base.humidity_high),
            humidity_low: self.alarm_hum_l.unwrap_or(base.humidity_low),
            voc_index_limit: self.alarm_voc.unwrap_or(base.voc_index_limit),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The reading field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Humidity,
    VocRaw,
    VocIndex,
}

impl Field {
    pub fn select(self, reading: &Reading) -> i32 {
        match self {
            Field::Temperature => reading.temperature,
            Field::Humidity => reading.humidity,
            Field::VocRaw => reading.voc_raw,
            Field::VocIndex => reading.voc_index,
        }
    }
}

/// Strict comparison against a rule's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Above,
    Below,
}

impl Comparison {
    pub fn holds(self, value: i32, limit: i32) -> bool {
        match self {
            Comparison::Above => value > limit,
            Comparison::Below => value < limit,
        }
    }
}

/// One threshold predicate and the message announced when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRule {
    pub class: AlarmClass,
    pub field: Field,
    pub comparison: Comparison,
    pub limit: i32,
    pub message: String,
}

impl AlarmRule {
    /// Rule using the class's default message.
    pub fn new(class: AlarmClass, field: Field, comparison: Comparison, limit: i32) -> Self {
        Self {
            class,
            field,
            comparison,
            limit,
            message: class.default_message().to_string(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_triggered(&self, reading: &Reading) -> bool {
        self.comparison.holds(self.field.select(reading), self.limit)
    }
}

/// Ordered set of rules, at most one per alarm class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<AlarmRule>,
}

impl RuleTable {
    /// Build a table from arbitrary rules.
    ///
    /// Fails if any class appears more than once.
    pub fn new(rules: Vec<AlarmRule>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.class) {
                return Err(CoreError::Validation(format!(
                    "alarm class {} appears more than once in the rule table",
                    rule.class
                )));
            }
        }
        Ok(Self { rules })
    }

    /// The five reference rules, in [`AlarmClass::ALL`] order.
    pub fn from_thresholds(t: &Thresholds) -> Self {
        use AlarmClass::*;
        use Comparison::*;

        Self {
            rules: vec![
                AlarmRule::new(TemperatureHigh, Field::Temperature, Above, t.temp_high),
                AlarmRule::new(TemperatureLow, Field::Temperature, Below, t.temp_low),
                AlarmRule::new(HumidityHigh, Field::Humidity, Above, t.humidity_high),
                AlarmRule::new(HumidityLow, Field::Humidity, Below, t.humidity_low),
                AlarmRule::new(AirQualityBad, Field::VocIndex, Above, t.voc_index_limit),
            ],
        }
    }

    pub fn rules(&self) -> &[AlarmRule] {
        &self.rules
    }

    /// Classes whose predicate holds for `reading`, in table order.
    pub fn triggered<'a>(&'a self, reading: &'a Reading) -> impl Iterator<Item = AlarmClass> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.is_triggered(reading))
            .map(|rule| rule.class)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_thresholds(&Thresholds::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn reading(temp: i32, hum: i32, voc_index: i32) -> Reading {
        Reading::new(hum, temp, 300, voc_index)
    }

    // -- reference table ------------------------------------------------------

    #[test]
    fn reference_table_follows_declared_class_order() {
        let classes: Vec<AlarmClass> = RuleTable::default().rules().iter().map(|r| r.class).collect();
        assert_eq!(classes, AlarmClass::ALL.to_vec());
    }

    #[test]
    fn hot_and_dry_reading_triggers_two_classes() {
        let table = RuleTable::default();
        let r = reading(30, 40, 10);
        let triggered: Vec<_> = table.triggered(&r).collect();
        assert_eq!(
            triggered,
            vec![AlarmClass::TemperatureHigh, AlarmClass::HumidityLow]
        );
    }

    #[test]
    fn limits_are_exclusive() {
        let table = RuleTable::default();
        let r = reading(27, 65, 150);
        assert_eq!(table.triggered(&r).count(), 0);

        let r = reading(19, 50, 150);
        assert_eq!(table.triggered(&r).count(), 0);
    }

    #[test]
    fn bad_air_uses_voc_index_not_raw() {
        let table = RuleTable::default();
        let r = Reading::new(55, 22, 900, 151);
        let triggered: Vec<_> = table.triggered(&r).collect();
        assert_eq!(triggered, vec![AlarmClass::AirQualityBad]);
    }

    // -- custom tables --------------------------------------------------------

    #[test]
    fn duplicate_class_is_rejected() {
        let rules = vec![
            AlarmRule::new(AlarmClass::TemperatureHigh, Field::Temperature, Comparison::Above, 27),
            AlarmRule::new(AlarmClass::TemperatureHigh, Field::Temperature, Comparison::Above, 35),
        ];
        assert_matches!(RuleTable::new(rules), Err(CoreError::Validation(_)));
    }

    #[test]
    fn custom_message_is_kept() {
        let rule = AlarmRule::new(AlarmClass::AirQualityBad, Field::VocRaw, Comparison::Above, 800)
            .with_message("open a window");
        let table = RuleTable::new(vec![rule]).unwrap();
        assert_eq!(table.rules()[0].message, "open a window");
        assert!(table.rules()[0].is_triggered(&Reading::new(50, 20, 801, 1)));
    }

    // -- thresholds -----------------------------------------------------------

    #[test]
    fn inverted_limits_fail_validation() {
        let t = Thresholds {
            temp_low: 30,
            ..Thresholds::default()
        };
        assert_matches!(t.validate(), Err(CoreError::Validation(msg)) if msg.contains("temperature"));

        let t = Thresholds {
            humidity_low: 65,
            ..Thresholds::default()
        };
        assert_matches!(t.validate(), Err(CoreError::Validation(msg)) if msg.contains("humidity"));

        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn overrides_apply_only_present_keys() {
        let raw = r#"{"screen_sec": 30, "room": "lab", "alarm_temp_h": 30, "alarm_voc": 200}"#;
        let overrides = ThresholdOverrides::from_json(raw).unwrap();
        let t = overrides.apply(Thresholds::default());

        assert_eq!(t.temp_high, 30);
        assert_eq!(t.voc_index_limit, 200);
        assert_eq!(t.temp_low, DEFAULT_TEMP_LOW);
        assert_eq!(t.humidity_high, DEFAULT_HUMIDITY_HIGH);
        assert_eq!(t.humidity_low, DEFAULT_HUMIDITY_LOW);
    }

    #[test]
    fn overrides_accept_sub_zero_temperature() {
        let overrides = ThresholdOverrides::from_json(r#"{"alarm_temp_l": -5, "alarm_temp_h": 8}"#).unwrap();
        let t = overrides.apply(Thresholds::default());

        assert_eq!(t.temp_low, -5);
        assert_eq!(t.temp_high, 8);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn malformed_override_document_is_a_validation_error() {
        assert_matches!(
            ThresholdOverrides::from_json("{\"alarm_temp_h\": \"hot\"}"),
            Err(CoreError::Validation(_))
        );
    }
}
