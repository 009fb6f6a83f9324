use std::sync::RwLock;
use tracing::{debug, warn};

use crate::clustering::EventId;
use crate::prediction::types::{HistoricalMatch, HistoricalRecord, PredictionFeatures};
use crate::TARGET_PREDICTION;

/// Weight of the trajectory code in the feature distance
pub const TRAJECTORY_DISTANCE_WEIGHT: f32 = 2.0;
pub const URGENCY_DISTANCE_WEIGHT: f32 = 1.0;
pub const ACTOR_DISTANCE_WEIGHT: f32 = 1.0;

/// Actor counts are divided by this before comparison
pub const ACTOR_COUNT_SCALE: f32 = 10.0;

/// Read access to previously stored prediction features
pub trait HistoricalPredictionStore: Send + Sync {
    /// Up to `k` stored predictions closest to `features`, nearest first,
    /// never including `exclude`.
    fn query(
        &self,
        features: &PredictionFeatures,
        exclude: &EventId,
        k: usize,
    ) -> Vec<HistoricalMatch>;
}

/// Weighted Euclidean distance over (trajectory, urgency, actor count / 10)
pub fn feature_distance(a: &PredictionFeatures, b: &PredictionFeatures) -> f32 {
    let trajectory = a.trajectory.code() - b.trajectory.code();
    let urgency = a.urgency - b.urgency;
    let actors = (a.actor_count as f32 - b.actor_count as f32) / ACTOR_COUNT_SCALE;

    (TRAJECTORY_DISTANCE_WEIGHT * trajectory * trajectory
        + URGENCY_DISTANCE_WEIGHT * urgency * urgency
        + ACTOR_DISTANCE_WEIGHT * actors * actors)
        .sqrt()
}

/// Prediction history held in memory
///
/// Later records for the same event replace earlier ones, so each event is
/// matched at most once.
#[derive(Debug, Default)]
pub struct InMemoryPredictionStore {
    records: RwLock<Vec<HistoricalRecord>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<HistoricalRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: HistoricalRecord) {
        let Ok(mut records) = self.records.write() else {
            warn!(target: TARGET_PREDICTION, "Prediction history lock poisoned; record dropped");
            return;
        };
        records.retain(|r| r.event_id != record.event_id);
        records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoricalPredictionStore for InMemoryPredictionStore {
    fn query(
        &self,
        features: &PredictionFeatures,
        exclude: &EventId,
        k: usize,
    ) -> Vec<HistoricalMatch> {
        let Ok(records) = self.records.read() else {
            warn!(target: TARGET_PREDICTION, "Prediction history lock poisoned; no matches");
            return Vec::new();
        };

        let mut matches: Vec<HistoricalMatch> = records
            .iter()
            .filter(|r| &r.event_id != exclude)
            .map(|r| HistoricalMatch {
                event_id: r.event_id.clone(),
                event_name: r.event_name.clone(),
                trajectory: r.features.trajectory,
                distance: feature_distance(features, &r.features),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        matches.truncate(k);

        debug!(
            target: TARGET_PREDICTION,
            "History query over {} records returned {} matches",
            records.len(),
            matches.len()
        );
        matches
    }
}
