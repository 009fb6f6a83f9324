use crate::entity::normalizer::display_case;
use crate::prediction::types::{RiskFactor, RiskKind};
use crate::rhetoric::RhetoricAnalysis;

/// Urgency score (hits per article) treated as high
pub const HIGH_URGENCY_SCORE: f32 = 0.5;
/// Rise in urgency between windows treated as significant
pub const RISING_URGENCY_DELTA: f32 = 0.3;
pub const MANY_ACTORS: usize = 3;
/// Current-window mean sentiment below this counts as persistently negative
pub const NEGATIVE_TONE: f32 = -0.3;
/// Articles per day above which coverage counts as surging
pub const COVERAGE_SURGE_PER_DAY: f64 = 3.0;

pub const HIGH_RISK_KEYWORDS: &[&str] = &[
    "military", "invasion", "war", "weapon", "strike", "attack", "missile", "nuclear",
];

/// Actors named in the many-actors description
const LISTED_ACTORS: usize = 5;

/// Evaluates the risk checklist. Each satisfied rule adds one factor, always
/// in the order of [`RiskKind`].
pub fn identify_risk_factors(analysis: &RhetoricAnalysis) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if analysis.urgency_score >= HIGH_URGENCY_SCORE {
        factors.push(RiskFactor {
            kind: RiskKind::HighUrgency,
            description: format!(
                "High urgency language ({:.2} indicators per article) suggests rapid escalation risk",
                analysis.urgency_score
            ),
        });
    }

    let urgency_delta = analysis.current_urgency - analysis.initial_urgency;
    if urgency_delta >= RISING_URGENCY_DELTA {
        factors.push(RiskFactor {
            kind: RiskKind::RisingUrgency,
            description: format!(
                "Urgency rose from {:.2} to {:.2} indicators per article",
                analysis.initial_urgency, analysis.current_urgency
            ),
        });
    }

    if analysis.actor_count() >= MANY_ACTORS {
        let names: Vec<String> = analysis
            .actor_mentions
            .iter()
            .take(LISTED_ACTORS)
            .map(|a| display_case(&a.name))
            .collect();
        factors.push(RiskFactor {
            kind: RiskKind::ManyActors,
            description: format!(
                "Multiple actors involved ({}), increasing complexity",
                names.join(", ")
            ),
        });
    }

    if analysis.current_tone.mean < NEGATIVE_TONE {
        factors.push(RiskFactor {
            kind: RiskKind::NegativeTone,
            description: "Persistently negative sentiment indicates deep tensions".to_string(),
        });
    }

    if analysis.coverage.articles_per_day > COVERAGE_SURGE_PER_DAY {
        factors.push(RiskFactor {
            kind: RiskKind::CoverageSurge,
            description: format!(
                "Coverage surge ({:.1} articles per day) suggests growing importance",
                analysis.coverage.articles_per_day
            ),
        });
    }

    let found = high_risk_keywords(analysis);
    if !found.is_empty() {
        factors.push(RiskFactor {
            kind: RiskKind::HighRiskKeywords,
            description: format!("High-risk keywords present: {}", found.join(", ")),
        });
    }

    factors
}

/// High-risk keywords appearing as a word (or its plural) in any key phrase,
/// in list order
pub fn high_risk_keywords(analysis: &RhetoricAnalysis) -> Vec<&'static str> {
    HIGH_RISK_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| {
            analysis.key_phrases.iter().any(|p| {
                p.phrase
                    .split(' ')
                    .any(|word| word == *keyword || word.strip_suffix('s') == Some(*keyword))
            })
        })
        .collect()
}
