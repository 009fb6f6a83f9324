use serde::{Deserialize, Serialize};

use crate::clustering::EventId;
use crate::prediction::types::{EventPrediction, Trajectory};

/// Entries kept in each ranked list
pub const SUMMARY_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub event_id: EventId,
    pub event_name: String,
    pub trajectory: Trajectory,
    pub confidence: f32,
    pub risk_count: usize,
}

impl From<&EventPrediction> for SummaryEntry {
    fn from(prediction: &EventPrediction) -> Self {
        Self {
            event_id: prediction.event_id.clone(),
            event_name: prediction.event_name.clone(),
            trajectory: prediction.trajectory,
            confidence: prediction.confidence,
            risk_count: prediction.risk_factors.len(),
        }
    }
}

/// Overview across the predictions of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub total_events: usize,
    pub escalating: usize,
    pub de_escalating: usize,
    pub stable: usize,
    /// Highest confidence first
    pub top_confidence: Vec<SummaryEntry>,
    /// Escalating events by risk factor count, then confidence
    pub most_concerning: Vec<SummaryEntry>,
}

impl PredictionSummary {
    pub fn from_predictions(predictions: &[EventPrediction]) -> Self {
        let count = |t: Trajectory| predictions.iter().filter(|p| p.trajectory == t).count();

        let mut top_confidence: Vec<SummaryEntry> =
            predictions.iter().map(SummaryEntry::from).collect();
        top_confidence.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        top_confidence.truncate(SUMMARY_LIMIT);

        let mut most_concerning: Vec<SummaryEntry> = predictions
            .iter()
            .filter(|p| p.trajectory == Trajectory::Escalating)
            .map(SummaryEntry::from)
            .collect();
        most_concerning.sort_by(|a, b| {
            b.risk_count
                .cmp(&a.risk_count)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        most_concerning.truncate(SUMMARY_LIMIT);

        Self {
            total_events: predictions.len(),
            escalating: count(Trajectory::Escalating),
            de_escalating: count(Trajectory::DeEscalating),
            stable: count(Trajectory::Stable),
            top_confidence,
            most_concerning,
        }
    }
}
