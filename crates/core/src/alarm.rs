//! Alarm classes and the events announced for them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A fixed category of abnormal sensor condition.
///
/// The discriminant is the wire identity sent as `alarm_class` on the alarms
/// topic, so the declared order must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AlarmClass {
    TemperatureHigh = 0,
    TemperatureLow = 1,
    HumidityHigh = 2,
    HumidityLow = 3,
    AirQualityBad = 4,
}

impl AlarmClass {
    /// Every class, in declared order.
    pub const ALL: [AlarmClass; 5] = [
        AlarmClass::TemperatureHigh,
        AlarmClass::TemperatureLow,
        AlarmClass::HumidityHigh,
        AlarmClass::HumidityLow,
        AlarmClass::AirQualityBad,
    ];

    /// Integer identity used on the wire.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Short diagnostic name, as shown by the device firmware logs.
    pub fn name(self) -> &'static str {
        match self {
            AlarmClass::TemperatureHigh => "AC_TEMP_H",
            AlarmClass::TemperatureLow => "AC_TEMP_L",
            AlarmClass::HumidityHigh => "AC_HUM_H",
            AlarmClass::HumidityLow => "AC_HUM_L",
            AlarmClass::AirQualityBad => "AC_VOC_LIMIT",
        }
    }

    /// Default human-readable recommendation sent in the `info` field.
    ///
    /// The monitoring dashboard displays these verbatim.
    pub fn default_message(self) -> &'static str {
        match self {
            AlarmClass::TemperatureHigh => {
                "La temperatura es demasiado elevada. Recomendamos activar la climatizacion."
            }
            AlarmClass::TemperatureLow => {
                "La temperatura es demasiado baja. Recomendamos activar la climatizacion."
            }
            AlarmClass::HumidityHigh => {
                "La humedad es demasiado elevada. Recomendamos deshumidificar el ambiente."
            }
            AlarmClass::HumidityLow => {
                "La humedad es demasiado baja. Recomendamos humidificar el ambiente."
            }
            AlarmClass::AirQualityBad => {
                "La calidad del aire es mala. Recomendamos ventilar o purificar el aire."
            }
        }
    }
}

impl std::fmt::Display for AlarmClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AlarmClass> for u8 {
    fn from(class: AlarmClass) -> Self {
        class.code()
    }
}

impl TryFrom<u8> for AlarmClass {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AlarmClass::ALL
            .into_iter()
            .find(|class| class.code() == code)
            .ok_or(CoreError::UnknownAlarmClass(code))
    }
}

/// An activation (`disable = false`) or deactivation (`disable = true`)
/// message for one alarm class.
///
/// Serializes to the alarms payload `{"disable", "alarm_class", "info"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub disable: bool,
    pub alarm_class: AlarmClass,
    pub info: String,
}

impl AlarmEvent {
    pub fn activate(alarm_class: AlarmClass, info: impl Into<String>) -> Self {
        Self {
            disable: false,
            alarm_class,
            info: info.into(),
        }
    }

    pub fn deactivate(alarm_class: AlarmClass, info: impl Into<String>) -> Self {
        Self {
            disable: true,
            alarm_class,
            info: info.into(),
        }
    }

    pub fn is_activation(&self) -> bool {
        !self.disable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn codes_follow_declared_order() {
        let codes: Vec<u8> = AlarmClass::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_matches!(
            AlarmClass::try_from(5),
            Err(CoreError::UnknownAlarmClass(5))
        );
        assert_eq!(AlarmClass::try_from(3).unwrap(), AlarmClass::HumidityLow);
    }

    #[test]
    fn event_serializes_class_as_integer() {
        let event = AlarmEvent::deactivate(AlarmClass::AirQualityBad, "ventilate");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["disable"], true);
        assert_eq!(value["alarm_class"], 4);
        assert_eq!(value["info"], "ventilate");
    }

    #[test]
    fn activation_flag_is_inverse_of_disable() {
        assert!(AlarmEvent::activate(AlarmClass::HumidityHigh, "x").is_activation());
        assert!(!AlarmEvent::deactivate(AlarmClass::HumidityHigh, "x").is_activation());
    }

    #[test]
    fn event_with_unknown_class_fails_to_parse() {
        let raw = r#"{"disable": false, "alarm_class": 9, "info": "?"}"#;
        assert!(serde_json::from_str::<AlarmEvent>(raw).is_err());
    }

    #[test]
    fn display_uses_firmware_name() {
        assert_eq!(AlarmClass::TemperatureLow.to_string(), "AC_TEMP_L");
    }
}
