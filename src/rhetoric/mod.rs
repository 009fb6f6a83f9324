//! Rhetoric tracking
//!
//! Derives how coverage of a single event has shifted: tone of the earliest
//! versus latest articles, urgency language, which actors are named, and
//! which phrases are emerging. Every call recomputes from the event's
//! members, ordered by publication time.

pub mod lexicon;
pub mod phrases;
pub mod types;

use lazy_static::lazy_static;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::article::Article;
use crate::clustering::EventSnapshot;
use crate::entity::{ActorKind, Gazetteer};
use crate::error::AnalysisError;
use crate::vector::{mean, variance};
use crate::TARGET_RHETORIC;

pub use types::*;

/// Share of the (chronologically sorted) members forming the initial window
pub const INITIAL_WINDOW_FRACTION: f32 = 0.5;

/// Minimum change in mean sentiment that counts as a trend
pub const TREND_EPSILON: f32 = 0.1;

/// Fewest members for which a coverage trend is reported
pub const MIN_COVERAGE_TREND_ARTICLES: usize = 4;

/// Later-half to earlier-half article ratio above which coverage is increasing
const COVERAGE_INCREASE_RATIO: f64 = 1.5;
/// Ratio below which coverage is decreasing
const COVERAGE_DECREASE_RATIO: f64 = 0.5;

/// Members considered for the "recent coverage" sentence of the narrative
const RECENT_NARRATIVE_ARTICLES: usize = 5;

lazy_static! {
    static ref BUILTIN_GAZETTEER: Gazetteer = Gazetteer::builtin();
}

/// Analyzes an event against the built-in actor gazetteer.
pub fn analyze(snapshot: &EventSnapshot) -> Result<RhetoricAnalysis, AnalysisError> {
    analyze_with(snapshot, &BUILTIN_GAZETTEER)
}

/// Analyzes an event, resolving actors through `gazetteer`.
///
/// # Returns
/// * `Ok(RhetoricAnalysis)` - Snapshot of the event's rhetoric as of its newest article
/// * `Err(AnalysisError::EmptyEvent)` - If the snapshot has no members
/// * `Err(AnalysisError::InvalidSentiment)` - If a member's sentiment is outside [-1, 1]
pub fn analyze_with(
    snapshot: &EventSnapshot,
    gazetteer: &Gazetteer,
) -> Result<RhetoricAnalysis, AnalysisError> {
    let articles = snapshot.chronological();
    let Some(newest) = articles.last() else {
        return Err(AnalysisError::EmptyEvent(snapshot.id().clone()));
    };
    let as_of = newest.published_at;

    for article in &articles {
        if !article.sentiment.is_finite() || !(-1.0..=1.0).contains(&article.sentiment) {
            return Err(AnalysisError::InvalidSentiment {
                article_id: article.id.clone(),
                value: article.sentiment,
            });
        }
    }

    debug!(
        target: TARGET_RHETORIC,
        "Analyzing rhetoric for {} ({} articles)",
        snapshot.id(),
        articles.len()
    );

    let split = initial_window_len(articles.len());
    let (initial, current) = articles.split_at(split);
    let single = current.is_empty();
    // With one article both windows read from it
    let current = if single { initial } else { current };

    let initial_tone = ToneReading::new(mean(&sentiments(initial)));
    let current_tone = ToneReading::new(mean(&sentiments(current)));
    let sentiment_change = current_tone.mean - initial_tone.mean;
    let trend = if articles.len() < 2 {
        Trend::Stable
    } else {
        classify_trend(sentiment_change)
    };

    let all_sentiments = sentiments(&articles);
    let full_texts: Vec<String> = articles.iter().map(|a| a.full_text()).collect();
    let (initial_texts, current_texts) = full_texts.split_at(split);
    let current_texts = if single { initial_texts } else { current_texts };

    let urgency_score = lexicon::urgency_rate(full_texts.iter().map(|t| t.as_str()));
    let initial_urgency = lexicon::urgency_rate(initial_texts.iter().map(|t| t.as_str()));
    let current_urgency = lexicon::urgency_rate(current_texts.iter().map(|t| t.as_str()));
    let urgency_indicators = lexicon::distinct_terms(full_texts.iter().map(|t| t.as_str()));

    let actor_mentions = actor_mentions(&articles, gazetteer);
    let initial_actor_count = distinct_actors(initial, gazetteer);
    let current_actor_count = distinct_actors(current, gazetteer);

    let headlines: Vec<String> = articles.iter().map(|a| a.headline_text()).collect();
    let (initial_headlines, current_headlines) = headlines.split_at(split);
    let key_phrases = phrases::key_phrases(initial_headlines, current_headlines);

    let coverage = coverage_stats(&articles);

    let mut analysis = RhetoricAnalysis {
        event_id: snapshot.id().clone(),
        event_name: snapshot.name(),
        as_of,
        article_count: articles.len(),
        initial_tone,
        current_tone,
        trend,
        sentiment_change,
        mean_sentiment: mean(&all_sentiments),
        sentiment_variance: variance(&all_sentiments),
        sentiment_timeline: sentiment_timeline(&articles),
        urgency_score,
        initial_urgency,
        current_urgency,
        urgency_indicators,
        actor_mentions,
        initial_actor_count,
        current_actor_count,
        key_phrases,
        coverage,
        narrative: String::new(),
    };
    analysis.narrative = narrative(&analysis, &all_sentiments);

    info!(
        target: TARGET_RHETORIC,
        "{}: tone {} -> {} ({}), urgency {:.2}, {} actors",
        analysis.event_id,
        analysis.initial_tone.label,
        analysis.current_tone.label,
        analysis.trend,
        analysis.urgency_score,
        analysis.actor_count()
    );

    Ok(analysis)
}

/// Size of the initial window: `max(1, floor(n * INITIAL_WINDOW_FRACTION))`
pub fn initial_window_len(article_count: usize) -> usize {
    ((article_count as f32 * INITIAL_WINDOW_FRACTION).floor() as usize).max(1)
}

pub fn classify_trend(sentiment_change: f32) -> Trend {
    if sentiment_change < -TREND_EPSILON {
        Trend::Deteriorating
    } else if sentiment_change > TREND_EPSILON {
        Trend::Improving
    } else {
        Trend::Stable
    }
}

/// Compares several analyzed events; `None` for an empty slice.
///
/// Ties keep the earliest analysis in the slice.
pub fn compare_events(analyses: &[RhetoricAnalysis]) -> Option<RhetoricComparison> {
    let first = analyses.first()?;

    let mut most_negative = first;
    let mut most_positive = first;
    let mut most_urgent = first;
    let mut most_active = first;
    for analysis in &analyses[1..] {
        if analysis.mean_sentiment < most_negative.mean_sentiment {
            most_negative = analysis;
        }
        if analysis.mean_sentiment > most_positive.mean_sentiment {
            most_positive = analysis;
        }
        if analysis.urgency_score > most_urgent.urgency_score {
            most_urgent = analysis;
        }
        if analysis.article_count > most_active.article_count {
            most_active = analysis;
        }
    }

    let means: Vec<f32> = analyses.iter().map(|a| a.mean_sentiment).collect();
    let overall_sentiment = mean(&means);

    Some(RhetoricComparison {
        most_negative: most_negative.event_name.clone(),
        most_positive: most_positive.event_name.clone(),
        most_urgent: most_urgent.event_name.clone(),
        most_active: most_active.event_name.clone(),
        overall_sentiment,
        interpretation: ToneLabel::from_sentiment(overall_sentiment),
    })
}

fn sentiments(articles: &[Arc<Article>]) -> Vec<f32> {
    articles.iter().map(|a| a.sentiment).collect()
}

fn sentiment_timeline(articles: &[Arc<Article>]) -> Vec<SentimentPoint> {
    articles
        .iter()
        .map(|a| SentimentPoint {
            article_id: a.id.clone(),
            published_at: a.published_at,
            sentiment: a.sentiment,
            label: ToneLabel::from_sentiment(a.sentiment),
        })
        .collect()
}

/// Canonical actors named by one article, each counted once
fn article_actors<'g>(article: &Article, gazetteer: &'g Gazetteer) -> BTreeSet<(&'g str, ActorKind)> {
    article
        .entities
        .iter()
        .filter_map(|entity| gazetteer.resolve(entity))
        .map(|actor| (actor.name.as_str(), actor.kind))
        .collect()
}

fn distinct_actors(articles: &[Arc<Article>], gazetteer: &Gazetteer) -> usize {
    articles
        .iter()
        .flat_map(|a| article_actors(a, gazetteer))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Actor mention counts, most mentioned first, ties by name
fn actor_mentions(articles: &[Arc<Article>], gazetteer: &Gazetteer) -> Vec<ActorMention> {
    let mut counts: BTreeMap<(&str, ActorKind), usize> = BTreeMap::new();
    for article in articles {
        for key in article_actors(article, gazetteer) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut mentions: Vec<ActorMention> = counts
        .into_iter()
        .map(|((name, kind), count)| ActorMention {
            name: name.to_string(),
            kind,
            count,
        })
        .collect();
    mentions.sort_by(|a, b| b.count.cmp(&a.count));
    mentions
}

fn coverage_stats(articles: &[Arc<Article>]) -> CoverageStats {
    let sources: BTreeSet<&str> = articles.iter().map(|a| a.source.as_str()).collect();
    let time_span_hours = match (articles.first(), articles.last()) {
        (Some(first), Some(last)) => {
            (last.published_at - first.published_at).num_seconds() as f64 / 3600.0
        }
        _ => 0.0,
    };
    let span_days = (time_span_hours / 24.0).max(1.0);

    CoverageStats {
        source_count: sources.len(),
        time_span_hours,
        articles_per_day: articles.len() as f64 / span_days,
        trend: coverage_trend(articles),
    }
}

/// Compares article counts before and after the midpoint of the event's time span.
///
/// `articles` must be in publication order.
pub fn coverage_trend(articles: &[Arc<Article>]) -> CoverageTrend {
    if articles.len() < MIN_COVERAGE_TREND_ARTICLES {
        return CoverageTrend::InsufficientData;
    }
    let (Some(first), Some(last)) = (articles.first(), articles.last()) else {
        return CoverageTrend::InsufficientData;
    };
    let span = last.published_at - first.published_at;
    if span <= chrono::Duration::zero() {
        return CoverageTrend::Stable;
    }

    let midpoint = first.published_at + span / 2;
    let early = articles.iter().filter(|a| a.published_at < midpoint).count() as f64;
    let recent = articles.len() as f64 - early;

    if recent > early * COVERAGE_INCREASE_RATIO {
        CoverageTrend::Increasing
    } else if recent < early * COVERAGE_DECREASE_RATIO {
        CoverageTrend::Decreasing
    } else {
        CoverageTrend::Stable
    }
}

fn narrative(analysis: &RhetoricAnalysis, sentiments: &[f32]) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(match analysis.trend {
        Trend::Stable => format!(
            "Coverage has kept a broadly {} tone.",
            analysis.current_tone.label
        ),
        Trend::Deteriorating => format!(
            "Coverage has turned from {} to {}, a deterioration in tone.",
            analysis.initial_tone.label, analysis.current_tone.label
        ),
        Trend::Improving => format!(
            "Coverage has moved from {} to {}, an improvement in tone.",
            analysis.initial_tone.label, analysis.current_tone.label
        ),
    });

    if !analysis.urgency_indicators.is_empty() {
        let terms: Vec<&str> = analysis
            .urgency_indicators
            .iter()
            .take(3)
            .map(|t| t.as_str())
            .collect();
        parts.push(format!(
            "Urgent language ({}) points to heightened concern.",
            terms.join(", ")
        ));
    }

    let emerging: Vec<&str> = analysis
        .new_phrases()
        .take(3)
        .map(|p| p.phrase.as_str())
        .collect();
    if !emerging.is_empty() {
        parts.push(format!("Emerging phrases: {}.", emerging.join(", ")));
    }

    if sentiments.len() > 1 {
        let recent = &sentiments[sentiments.len().saturating_sub(RECENT_NARRATIVE_ARTICLES)..];
        let recent_mean = mean(recent);
        if recent_mean < -0.2 {
            parts.push("Recent coverage is predominantly negative.".to_string());
        } else if recent_mean > 0.2 {
            parts.push("Recent coverage is predominantly positive.".to_string());
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::{article, with_entities, with_text};
    use crate::clustering::{Event, EventSnapshot};
    use crate::entity::EntityType;

    fn snapshot(articles: Vec<Article>) -> EventSnapshot {
        let refs: Vec<&Article> = articles.iter().collect();
        let event = Event::from_articles(&refs, 1).unwrap();
        EventSnapshot {
            event,
            members: articles.into_iter().map(Arc::new).collect(),
        }
    }

    fn scored(sentiments: &[f32]) -> Vec<Article> {
        sentiments
            .iter()
            .enumerate()
            .map(|(i, s)| article(&format!("a{}", i), vec![1.0, 0.0], *s, i as i64 * 6))
            .collect()
    }

    #[test]
    fn test_declining_sentiment_is_deteriorating() {
        let analysis = analyze(&snapshot(scored(&[0.5, 0.3, 0.1, -0.2, -0.4]))).unwrap();
        assert_eq!(analysis.trend, Trend::Deteriorating);
        assert!((analysis.initial_tone.mean - 0.4).abs() < 1e-6);
        assert!(analysis.sentiment_change < -TREND_EPSILON);
        assert_eq!(analysis.initial_tone.label, ToneLabel::HighlyPositive);
        assert_eq!(analysis.current_tone.label, ToneLabel::Negative);
        assert!(analysis.narrative.contains("deterioration"));
    }

    #[test]
    fn test_rising_and_flat_sentiment() {
        let improving = analyze(&snapshot(scored(&[-0.5, -0.4, 0.2, 0.3]))).unwrap();
        assert_eq!(improving.trend, Trend::Improving);

        let flat = analyze(&snapshot(scored(&[0.1, 0.12, 0.08, 0.11]))).unwrap();
        assert_eq!(flat.trend, Trend::Stable);
    }

    #[test]
    fn test_single_article_is_stable() {
        let one = with_text(
            article("solo", vec![1.0], -0.8, 0),
            "Crisis deepens",
            "Officials warn of imminent collapse",
        );
        let analysis = analyze(&snapshot(vec![one])).unwrap();
        assert_eq!(analysis.trend, Trend::Stable);
        assert_eq!(analysis.initial_tone, analysis.current_tone);
        assert!((analysis.urgency_score - 3.0).abs() < 1e-6);
        assert_eq!(analysis.initial_urgency, analysis.current_urgency);
        assert!(analysis.key_phrases.iter().all(|p| p.window == Window::Initial));
    }

    #[test]
    fn test_window_sizes() {
        assert_eq!(initial_window_len(1), 1);
        assert_eq!(initial_window_len(2), 1);
        assert_eq!(initial_window_len(5), 2);
        assert_eq!(initial_window_len(20), 10);
    }

    #[test]
    fn test_urgency_per_window() {
        let articles = vec![
            with_text(article("a1", vec![1.0], 0.0, 0), "Talks open", ""),
            with_text(article("a2", vec![1.0], 0.0, 1), "Talks continue", ""),
            with_text(article("a3", vec![1.0], 0.0, 2), "Urgent crisis meeting", ""),
            with_text(article("a4", vec![1.0], 0.0, 3), "Ultimatum issued", ""),
        ];
        let analysis = analyze(&snapshot(articles)).unwrap();
        assert_eq!(analysis.initial_urgency, 0.0);
        assert!((analysis.current_urgency - 1.5).abs() < 1e-6);
        assert!((analysis.urgency_score - 0.75).abs() < 1e-6);
        assert_eq!(
            analysis.urgency_indicators,
            vec!["crisis", "ultimatum", "urgent"]
        );
    }

    #[test]
    fn test_actor_mentions_and_growth() {
        let articles = vec![
            with_entities(
                article("a1", vec![1.0], 0.0, 0),
                &[("Russia", EntityType::Location), ("Tuesday", EntityType::Date)],
            ),
            with_entities(
                article("a2", vec![1.0], 0.0, 1),
                &[("Russian Federation", EntityType::Organization)],
            ),
            with_entities(
                article("a3", vec![1.0], 0.0, 2),
                &[
                    ("Russia", EntityType::Location),
                    ("Ukraine", EntityType::Location),
                    ("NATO", EntityType::Organization),
                ],
            ),
            with_entities(
                article("a4", vec![1.0], 0.0, 3),
                &[("Ukraine", EntityType::Location), ("Zelenskyy", EntityType::Person)],
            ),
        ];
        let analysis = analyze(&snapshot(articles)).unwrap();

        assert_eq!(analysis.actor_mentions[0].name, "russia");
        assert_eq!(analysis.actor_mentions[0].count, 3);
        assert_eq!(analysis.actor_mentions[1].name, "ukraine");
        assert_eq!(analysis.initial_actor_count, 1);
        assert_eq!(analysis.current_actor_count, 4);
    }

    #[test]
    fn test_missing_entities_give_no_actors() {
        let analysis = analyze(&snapshot(scored(&[0.0, 0.0]))).unwrap();
        assert!(analysis.actor_mentions.is_empty());
        assert_eq!(analysis.current_actor_count, 0);
    }

    #[test]
    fn test_invalid_sentiment_is_rejected() {
        let result = analyze(&snapshot(scored(&[0.2, 1.5])));
        assert!(matches!(
            result,
            Err(AnalysisError::InvalidSentiment { ref article_id, .. }) if article_id == "a1"
        ));

        let result = analyze(&snapshot(scored(&[0.2, f32::NAN])));
        assert!(matches!(result, Err(AnalysisError::InvalidSentiment { .. })));
    }

    #[test]
    fn test_empty_snapshot_is_rejected() {
        let mut empty = snapshot(scored(&[0.0]));
        empty.members.clear();
        assert!(matches!(analyze(&empty), Err(AnalysisError::EmptyEvent(_))));
    }

    #[test]
    fn test_coverage_stats() {
        let mut articles = scored(&[0.0, 0.0, 0.0, 0.0]);
        articles[1].source = "agency".to_string();
        let analysis = analyze(&snapshot(articles)).unwrap();
        assert_eq!(analysis.coverage.source_count, 2);
        assert!((analysis.coverage.time_span_hours - 18.0).abs() < 1e-9);
        // Spans shorter than a day count as one day
        assert!((analysis.coverage.articles_per_day - 4.0).abs() < 1e-9);
        assert_eq!(analysis.coverage.trend, CoverageTrend::Stable);
    }

    fn at_hours(hours: &[i64]) -> Vec<Arc<Article>> {
        hours
            .iter()
            .enumerate()
            .map(|(i, h)| Arc::new(article(&format!("a{}", i), vec![1.0, 0.0], 0.0, *h)))
            .collect()
    }

    #[test]
    fn test_coverage_trend() {
        assert_eq!(
            coverage_trend(&at_hours(&[0, 40, 44, 46, 47, 48])),
            CoverageTrend::Increasing
        );
        assert_eq!(
            coverage_trend(&at_hours(&[0, 1, 2, 3, 48])),
            CoverageTrend::Decreasing
        );
        assert_eq!(
            coverage_trend(&at_hours(&[0, 10, 30, 48])),
            CoverageTrend::Stable
        );
        assert_eq!(
            coverage_trend(&at_hours(&[5, 5, 5, 5])),
            CoverageTrend::Stable
        );
        assert_eq!(
            coverage_trend(&at_hours(&[0, 40, 48])),
            CoverageTrend::InsufficientData
        );
    }

    #[test]
    fn test_sentiment_timeline_is_chronological() {
        let articles = vec![
            article("late", vec![1.0, 0.0], -0.5, 12),
            article("early", vec![1.0, 0.0], 0.4, 0),
        ];
        let analysis = analyze(&snapshot(articles)).unwrap();
        let ids: Vec<&str> = analysis
            .sentiment_timeline
            .iter()
            .map(|p| p.article_id.as_str())
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(analysis.sentiment_timeline[0].label, ToneLabel::HighlyPositive);
        assert_eq!(analysis.sentiment_timeline[1].label, ToneLabel::HighlyNegative);
        assert_eq!(analysis.sentiment_timeline[1].published_at, analysis.as_of);
    }

    #[test]
    fn test_compare_events() {
        let mut calm = analyze(&snapshot(scored(&[0.4, 0.3]))).unwrap();
        calm.event_name = "Calm".to_string();
        let mut tense = analyze(&snapshot(vec![
            with_text(article("t1", vec![1.0], -0.6, 0), "Crisis", ""),
            with_text(article("t2", vec![1.0], -0.4, 1), "Emergency", ""),
            with_text(article("t3", vec![1.0], -0.5, 2), "Threat", ""),
        ]))
        .unwrap();
        tense.event_name = "Tense".to_string();

        let comparison = compare_events(&[calm, tense]).unwrap();
        assert_eq!(comparison.most_negative, "Tense");
        assert_eq!(comparison.most_positive, "Calm");
        assert_eq!(comparison.most_urgent, "Tense");
        assert_eq!(comparison.most_active, "Tense");
        assert!((comparison.overall_sentiment - (-0.075)).abs() < 1e-5);
        assert_eq!(comparison.interpretation, ToneLabel::Neutral);

        assert!(compare_events(&[]).is_none());
    }
}
