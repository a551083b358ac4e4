// src/aggregator/snapshot.rs
//! Immutable per-run aggregate of every metric plus the submitting identity.

use std::collections::{BTreeMap, HashMap};

use crate::metric::MetricKind;
use crate::reader::MetricValue;
use crate::schema::MetricPayload;
use crate::session::Identity;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    player_id: String,
    values: BTreeMap<MetricKind, MetricValue>,
}

impl Snapshot {
    /// Build from completed reads. Every kind gets a slot; a kind with no
    /// read result is recorded as missing.
    pub fn assemble(identity: &Identity, mut results: HashMap<MetricKind, MetricValue>) -> Self {
        let values = MetricKind::all()
            .iter()
            .map(|kind| (*kind, results.remove(kind).unwrap_or_default()))
            .collect();
        Self {
            player_id: identity.player_id.clone(),
            values,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn get(&self, kind: MetricKind) -> MetricValue {
        self.values.get(&kind).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, MetricValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Kinds whose reader observed no data
    pub fn missing(&self) -> Vec<MetricKind> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_observed())
            .map(|(k, _)| *k)
            .collect()
    }

    /// Wire form. Integer fields truncate toward zero.
    pub fn to_payload(&self) -> MetricPayload {
        let int = |kind| self.get(kind).value() as i64;
        let float = |kind| self.get(kind).value();
        MetricPayload {
            player_id: self.player_id.clone(),
            step_count: int(MetricKind::StepCount),
            heart_rate: int(MetricKind::HeartRate),
            blood_oxygen_level: int(MetricKind::BloodOxygen),
            hrv: float(MetricKind::Hrv),
            vo_max: float(MetricKind::Vo2Max),
            cadence: float(MetricKind::StepLength),
            elevation_gain: int(MetricKind::ElevationGain),
        }
    }
}
