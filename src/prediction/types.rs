use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clustering::EventId;

/// Expected direction of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trajectory {
    Escalating,
    DeEscalating,
    Stable,
}

impl Trajectory {
    /// Numeric position used in feature vectors
    pub fn code(&self) -> f32 {
        match self {
            Trajectory::Escalating => 1.0,
            Trajectory::Stable => 0.0,
            Trajectory::DeEscalating => -1.0,
        }
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trajectory::Escalating => write!(f, "escalating"),
            Trajectory::DeEscalating => write!(f, "de-escalating"),
            Trajectory::Stable => write!(f, "stable"),
        }
    }
}

impl FromStr for Trajectory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "escalating" => Ok(Trajectory::Escalating),
            "de-escalating" => Ok(Trajectory::DeEscalating),
            "stable" => Ok(Trajectory::Stable),
            other => Err(format!("unknown trajectory '{}'", other)),
        }
    }
}

/// Rules of the risk checklist, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskKind {
    HighUrgency,
    RisingUrgency,
    ManyActors,
    NegativeTone,
    CoverageSurge,
    HighRiskKeywords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskKind,
    pub description: String,
}

/// The values compared when looking for similar past events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures {
    pub trajectory: Trajectory,
    pub urgency: f32,
    pub actor_count: usize,
}

/// A stored prediction from an earlier run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub event_id: EventId,
    pub event_name: String,
    pub features: PredictionFeatures,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalMatch {
    pub event_id: EventId,
    pub event_name: String,
    pub trajectory: Trajectory,
    /// Weighted feature distance; smaller is more similar
    pub distance: f32,
}

/// Forecast for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPrediction {
    pub event_id: EventId,
    pub event_name: String,
    pub as_of: DateTime<Utc>,
    pub trajectory: Trajectory,
    pub trajectory_score: f32,
    pub confidence: f32,
    pub key_indicators: Vec<String>,
    pub risk_factors: Vec<RiskFactor>,
    /// 7-day outlook
    pub short_term_outlook: String,
    /// 30-day outlook
    pub medium_term_outlook: String,
    pub similar_events: Vec<HistoricalMatch>,
    pub features: PredictionFeatures,
}

impl EventPrediction {
    pub fn to_record(&self) -> HistoricalRecord {
        HistoricalRecord {
            event_id: self.event_id.clone(),
            event_name: self.event_name.clone(),
            features: self.features,
            recorded_at: self.as_of,
        }
    }
}
