use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::article::ArticleId;
use crate::clustering::EventId;
use crate::entity::ActorKind;

/// Direction of the tone between the initial and current windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Deteriorating,
    Improving,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Deteriorating => write!(f, "deteriorating"),
            Trend::Improving => write!(f, "improving"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToneLabel {
    HighlyNegative,
    Negative,
    Neutral,
    Positive,
    HighlyPositive,
}

impl ToneLabel {
    pub fn from_sentiment(score: f32) -> Self {
        if score < -0.3 {
            ToneLabel::HighlyNegative
        } else if score < -0.1 {
            ToneLabel::Negative
        } else if score < 0.1 {
            ToneLabel::Neutral
        } else if score < 0.3 {
            ToneLabel::Positive
        } else {
            ToneLabel::HighlyPositive
        }
    }
}

impl fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneLabel::HighlyNegative => write!(f, "highly negative"),
            ToneLabel::Negative => write!(f, "negative"),
            ToneLabel::Neutral => write!(f, "neutral"),
            ToneLabel::Positive => write!(f, "positive"),
            ToneLabel::HighlyPositive => write!(f, "highly positive"),
        }
    }
}

/// Mean sentiment of one window with its label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneReading {
    pub mean: f32,
    pub label: ToneLabel,
}

impl ToneReading {
    pub fn new(mean: f32) -> Self {
        Self {
            mean,
            label: ToneLabel::from_sentiment(mean),
        }
    }
}

/// Chronological half of an event's coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    Initial,
    Current,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Initial => write!(f, "initial"),
            Window::Current => write!(f, "current"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorMention {
    pub name: String,
    pub kind: ActorKind,
    /// Number of member articles mentioning the actor
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPhrase {
    pub phrase: String,
    pub frequency: usize,
    pub window: Window,
    /// Absent from the initial window, or at least three times as frequent now
    pub is_new: bool,
}

/// Whether the later half of the event's time span drew more articles than the earlier half
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageTrend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

impl fmt::Display for CoverageTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageTrend::Increasing => write!(f, "increasing"),
            CoverageTrend::Decreasing => write!(f, "decreasing"),
            CoverageTrend::Stable => write!(f, "stable"),
            CoverageTrend::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub source_count: usize,
    pub time_span_hours: f64,
    pub articles_per_day: f64,
    pub trend: CoverageTrend,
}

/// One member's sentiment at its publication time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub article_id: ArticleId,
    pub published_at: DateTime<Utc>,
    pub sentiment: f32,
    pub label: ToneLabel,
}

/// Point-in-time view of how an event is being talked about
///
/// Always recomputed from the event's full membership; nothing here is
/// carried over from earlier analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhetoricAnalysis {
    pub event_id: EventId,
    pub event_name: String,
    /// Timestamp of the newest member article
    pub as_of: DateTime<Utc>,
    pub article_count: usize,
    pub initial_tone: ToneReading,
    pub current_tone: ToneReading,
    pub trend: Trend,
    pub sentiment_change: f32,
    /// Mean sentiment over every member
    pub mean_sentiment: f32,
    pub sentiment_variance: f32,
    /// Per-article sentiment, oldest first
    pub sentiment_timeline: Vec<SentimentPoint>,
    /// Urgency lexicon hits per article over the whole event
    pub urgency_score: f32,
    pub initial_urgency: f32,
    pub current_urgency: f32,
    pub urgency_indicators: Vec<String>,
    pub actor_mentions: Vec<ActorMention>,
    pub initial_actor_count: usize,
    pub current_actor_count: usize,
    pub key_phrases: Vec<KeyPhrase>,
    pub coverage: CoverageStats,
    pub narrative: String,
}

impl RhetoricAnalysis {
    /// Phrases flagged as new in the current window, in rank order
    pub fn new_phrases(&self) -> impl Iterator<Item = &KeyPhrase> {
        self.key_phrases
            .iter()
            .filter(|p| p.window == Window::Current && p.is_new)
    }

    /// Distinct actors mentioned anywhere in the event
    pub fn actor_count(&self) -> usize {
        self.actor_mentions.len()
    }
}

/// Cross-event extremes over a set of analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhetoricComparison {
    pub most_negative: String,
    pub most_positive: String,
    pub most_urgent: String,
    pub most_active: String,
    pub overall_sentiment: f32,
    pub interpretation: ToneLabel,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_label_bands() {
        assert_eq!(ToneLabel::from_sentiment(-0.5), ToneLabel::HighlyNegative);
        assert_eq!(ToneLabel::from_sentiment(-0.3), ToneLabel::Negative);
        assert_eq!(ToneLabel::from_sentiment(-0.1), ToneLabel::Neutral);
        assert_eq!(ToneLabel::from_sentiment(0.0), ToneLabel::Neutral);
        assert_eq!(ToneLabel::from_sentiment(0.1), ToneLabel::Positive);
        assert_eq!(ToneLabel::from_sentiment(0.3), ToneLabel::HighlyPositive);
        assert_eq!(ToneReading::new(-0.45).label.to_string(), "highly negative");
    }
}
