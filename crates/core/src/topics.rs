//! Well-known MQTT topic names.
//!
//! Both topics hang off a configurable base path, e.g.
//! `/tfm/nrr/airquality/measures`.

/// Default topic base used when `TOPIC_BASE` is not set.
pub const DEFAULT_TOPIC_BASE: &str = "/tfm/nrr/airquality";

/// Suffix of the topic carrying one [`Reading`](crate::Reading) per measurement tick.
pub const MEASURES_SUFFIX: &str = "measures";

/// Suffix of the topic carrying [`AlarmEvent`](crate::AlarmEvent)s.
pub const ALARMS_SUFFIX: &str = "alarms";

/// The pair of topics the simulator publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub measures: String,
    pub alarms: String,
}

impl Topics {
    /// Build both topic paths from a base, tolerating a trailing slash.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            measures: format!("{base}/{MEASURES_SUFFIX}"),
            alarms: format!("{base}/{ALARMS_SUFFIX}"),
        }
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self::from_base(DEFAULT_TOPIC_BASE)
    }
}
