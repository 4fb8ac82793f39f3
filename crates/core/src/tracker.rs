//! Alarm edge detection and deduplication.
//!
//! [`AlarmTracker`] remembers which alarm classes have been announced as
//! active and turns each new [`Reading`] into the minimal set of transitions:
//! classes that just started firing and classes that just stopped. A class
//! that stays in the same state produces nothing, so downstream consumers see
//! exactly one activation and one deactivation per episode.

use std::collections::HashSet;

use crate::alarm::{AlarmClass, AlarmEvent};
use crate::reading::Reading;
use crate::rules::RuleTable;

/// Transitions produced by a single [`AlarmTracker::evaluate`] call.
///
/// Both lists are in rule-table order and never share a class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmDiff {
    pub to_activate: Vec<AlarmEvent>,
    pub to_deactivate: Vec<AlarmEvent>,
}

impl AlarmDiff {
    pub fn is_empty(&self) -> bool {
        self.to_activate.is_empty() && self.to_deactivate.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_activate.len() + self.to_deactivate.len()
    }

    /// Events in delivery order: every deactivation, then every activation.
    pub fn publish_order(&self) -> impl Iterator<Item = &AlarmEvent> {
        self.to_deactivate.iter().chain(self.to_activate.iter())
    }
}

/// Owns the announced set and the rule table it is evaluated against.
#[derive(Debug, Clone)]
pub struct AlarmTracker {
    rules: RuleTable,
    /// Classes with an outstanding activation event.
    announced: HashSet<AlarmClass>,
}

impl AlarmTracker {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            announced: HashSet::new(),
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn is_announced(&self, class: AlarmClass) -> bool {
        self.announced.contains(&class)
    }

    /// Announced classes in rule-table order.
    pub fn announced(&self) -> Vec<AlarmClass> {
        self.rules
            .rules()
            .iter()
            .map(|rule| rule.class)
            .filter(|class| self.announced.contains(class))
            .collect()
    }

    /// Diff `reading` against the announced set and record the result.
    ///
    /// The announced set is updated as soon as the diff is computed,
    /// independent of whether the caller manages to deliver the events.
    pub fn evaluate(&mut self, reading: &Reading) -> AlarmDiff {
        let triggered: HashSet<AlarmClass> = self.rules.triggered(reading).collect();
        let mut diff = AlarmDiff::default();

        // Deactivations first: only classes absent from `triggered` can be
        // removed, so nothing removed here is re-added below in the same call.
        for rule in self.rules.rules() {
            if self.announced.contains(&rule.class) && !triggered.contains(&rule.class) {
                self.announced.remove(&rule.class);
                diff.to_deactivate
                    .push(AlarmEvent::deactivate(rule.class, rule.message.clone()));
            }
        }

        for rule in self.rules.rules() {
            if triggered.contains(&rule.class) && self.announced.insert(rule.class) {
                diff.to_activate
                    .push(AlarmEvent::activate(rule.class, rule.message.clone()));
            }
        }

        if !diff.is_empty() {
            tracing::debug!(
                activated = diff.to_activate.len(),
                deactivated = diff.to_deactivate.len(),
                announced = self.announced.len(),
                "Alarm state changed",
            );
        }

        diff
    }
}

impl Default for AlarmTracker {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
