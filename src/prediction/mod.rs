//! Trajectory prediction
//!
//! Turns an event's rhetoric snapshot into a trajectory call, a confidence
//! score, a fixed-order risk checklist and outlook text, and attaches the
//! most similar past predictions from a [`HistoricalPredictionStore`].
//!
//! The trajectory score is a weighted sum:
//!
//! ```text
//! score = TREND_WEIGHT        * trend_signal                      (+1 deteriorating, -1 improving)
//!       + URGENCY_WEIGHT      * clamp(current_urgency - initial_urgency, -1, 1)
//!       + ACTOR_GROWTH_WEIGHT * clamp((current_actors - initial_actors) / max(1, initial_actors), -1, 1)
//! ```
//!
//! Above `ESCALATION_THRESHOLD` the event is escalating, below
//! `-DE_ESCALATION_THRESHOLD` it is de-escalating.

pub mod history;
pub mod outlook;
pub mod risk;
pub mod summary;
pub mod types;

use std::sync::Arc;
use tracing::{debug, info};

use crate::clustering::EventSnapshot;
use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::entity::normalizer::display_case;
use crate::rhetoric::{RhetoricAnalysis, Trend, TREND_EPSILON};
use crate::TARGET_PREDICTION;

pub use history::{HistoricalPredictionStore, InMemoryPredictionStore};
pub use summary::{PredictionSummary, SummaryEntry};
pub use types::*;

pub const TREND_WEIGHT: f32 = 0.5;
pub const URGENCY_WEIGHT: f32 = 0.8;
pub const ACTOR_GROWTH_WEIGHT: f32 = 0.2;
pub const ESCALATION_THRESHOLD: f32 = 0.25;
pub const DE_ESCALATION_THRESHOLD: f32 = 0.25;

pub const COUNT_WEIGHT: f32 = 0.6;
pub const SPAN_WEIGHT: f32 = 0.4;
/// Article count at which the count term reaches ~63% of its weight
pub const COUNT_SCALE: f32 = 10.0;
/// Observation span (days) at which the span term saturates
pub const FULL_SPAN_DAYS: f32 = 7.0;
pub const VARIANCE_PENALTY: f32 = 4.0;

/// Top-k for the similar-events lookup
pub const SIMILAR_EVENT_LIMIT: usize = DEFAULT_HISTORY_LIMIT;

/// Items listed in each key indicator line
const INDICATOR_ITEMS: usize = 3;

/// Combined trajectory score of an analysis
pub fn trajectory_score(analysis: &RhetoricAnalysis) -> f32 {
    let trend_signal = match analysis.trend {
        Trend::Deteriorating => 1.0,
        Trend::Improving => -1.0,
        Trend::Stable => 0.0,
    };
    let urgency_slope = (analysis.current_urgency - analysis.initial_urgency).clamp(-1.0, 1.0);
    let initial_actors = analysis.initial_actor_count.max(1) as f32;
    let actor_growth = ((analysis.current_actor_count as f32
        - analysis.initial_actor_count as f32)
        / initial_actors)
        .clamp(-1.0, 1.0);

    TREND_WEIGHT * trend_signal + URGENCY_WEIGHT * urgency_slope + ACTOR_GROWTH_WEIGHT * actor_growth
}

pub fn classify_trajectory(score: f32) -> Trajectory {
    if score > ESCALATION_THRESHOLD {
        Trajectory::Escalating
    } else if score < -DE_ESCALATION_THRESHOLD {
        Trajectory::DeEscalating
    } else {
        Trajectory::Stable
    }
}

/// Confidence in [0, 1]: grows with article count and observation span,
/// shrinks with sentiment variance.
pub fn confidence(article_count: usize, span_days: f32, sentiment_variance: f32) -> f32 {
    let count_term = 1.0 - (-(article_count as f32) / COUNT_SCALE).exp();
    let span_term = (span_days.max(0.0) / FULL_SPAN_DAYS).min(1.0);
    let penalty = 1.0 + VARIANCE_PENALTY * sentiment_variance.max(0.0);

    ((COUNT_WEIGHT * count_term + SPAN_WEIGHT * span_term) / penalty).clamp(0.0, 1.0)
}

/// Forecasts event trajectories
#[derive(Clone)]
pub struct TrajectoryPredictor {
    history: Arc<dyn HistoricalPredictionStore>,
    similar_limit: usize,
}

impl TrajectoryPredictor {
    pub fn new(history: Arc<dyn HistoricalPredictionStore>) -> Self {
        Self {
            history,
            similar_limit: SIMILAR_EVENT_LIMIT,
        }
    }

    /// A predictor with an empty history; `similar_events` is always empty.
    pub fn without_history() -> Self {
        Self::new(Arc::new(InMemoryPredictionStore::new()))
    }

    pub fn with_similar_limit(mut self, limit: usize) -> Self {
        self.similar_limit = limit;
        self
    }

    /// Predicts the trajectory of `snapshot` from its rhetoric analysis.
    ///
    /// Only the event's own members and analysis are read; the history store
    /// supplies `similar_events` and never includes the event itself.
    pub fn predict(&self, snapshot: &EventSnapshot, analysis: &RhetoricAnalysis) -> EventPrediction {
        debug_assert_eq!(
            &analysis.event_id,
            snapshot.id(),
            "analysis belongs to a different event"
        );
        let score = trajectory_score(analysis);
        let trajectory = classify_trajectory(score);

        let span = snapshot.event.last_seen() - snapshot.event.first_seen();
        let span_days = span.num_seconds().max(0) as f32 / 86_400.0;
        let confidence = confidence(snapshot.members.len(), span_days, analysis.sentiment_variance);

        let risk_factors = risk::identify_risk_factors(analysis);
        let features = PredictionFeatures {
            trajectory,
            urgency: analysis.urgency_score,
            actor_count: analysis.actor_count(),
        };
        let similar_events = self
            .history
            .query(&features, snapshot.id(), self.similar_limit);

        debug!(
            target: TARGET_PREDICTION,
            "{}: score {:.3}, {} risk factors, {} similar events",
            snapshot.id(),
            score,
            risk_factors.len(),
            similar_events.len()
        );

        let prediction = EventPrediction {
            event_id: snapshot.id().clone(),
            event_name: analysis.event_name.clone(),
            as_of: analysis.as_of,
            trajectory,
            trajectory_score: score,
            confidence,
            key_indicators: key_indicators(analysis),
            short_term_outlook: outlook::short_term(
                trajectory,
                risk_factors.len(),
                analysis.urgency_score,
            ),
            medium_term_outlook: outlook::medium_term(
                trajectory,
                risk_factors.len(),
                analysis.urgency_score,
            ),
            risk_factors,
            similar_events,
            features,
        };

        info!(
            target: TARGET_PREDICTION,
            "{} ({}) is {} with confidence {:.2}",
            prediction.event_name,
            prediction.event_id,
            prediction.trajectory,
            prediction.confidence
        );

        prediction
    }
}

/// Human-readable evidence behind a prediction
pub fn key_indicators(analysis: &RhetoricAnalysis) -> Vec<String> {
    let mut indicators = Vec::new();

    if analysis.sentiment_change.abs() > TREND_EPSILON {
        indicators.push(format!(
            "Tone shift from {} to {}",
            analysis.initial_tone.label, analysis.current_tone.label
        ));
    }

    if !analysis.urgency_indicators.is_empty() {
        let terms: Vec<&str> = analysis
            .urgency_indicators
            .iter()
            .take(INDICATOR_ITEMS)
            .map(|t| t.as_str())
            .collect();
        indicators.push(format!("Urgency indicators present: {}", terms.join(", ")));
    }

    let emerging: Vec<&str> = analysis
        .new_phrases()
        .take(INDICATOR_ITEMS)
        .map(|p| p.phrase.as_str())
        .collect();
    if !emerging.is_empty() {
        indicators.push(format!("Emerging phrases: {}", emerging.join(", ")));
    }

    if !analysis.actor_mentions.is_empty() {
        let actors: Vec<String> = analysis
            .actor_mentions
            .iter()
            .take(INDICATOR_ITEMS)
            .map(|a| display_case(&a.name))
            .collect();
        indicators.push(format!("Key actors: {}", actors.join(", ")));
    }

    indicators
}
