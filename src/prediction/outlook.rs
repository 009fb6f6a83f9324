use crate::prediction::risk::HIGH_URGENCY_SCORE;
use crate::prediction::types::Trajectory;

/// Urgency below this reads as low in outlook text
const LOW_URGENCY_SCORE: f32 = 0.2;

fn urgency_level(urgency_score: f32) -> &'static str {
    if urgency_score >= HIGH_URGENCY_SCORE {
        "high"
    } else if urgency_score >= LOW_URGENCY_SCORE {
        "moderate"
    } else {
        "low"
    }
}

fn risk_clause(risk_count: usize) -> String {
    match risk_count {
        0 => "No risk factors are currently flagged.".to_string(),
        1 => "One risk factor is flagged.".to_string(),
        n => format!("{} risk factors are flagged.", n),
    }
}

/// 7-day outlook
pub fn short_term(trajectory: Trajectory, risk_count: usize, urgency_score: f32) -> String {
    let body = match trajectory {
        Trajectory::Escalating => {
            "Situation likely to intensify. Expect heavier coverage, official statements and sharper rhetoric; watch for actions that match the words."
        }
        Trajectory::DeEscalating => {
            "Situation showing signs of stabilizing. Expect continued dialogue and calmer rhetoric, with possible diplomatic progress."
        }
        Trajectory::Stable => {
            "Situation expected to hold steady. Keep watching for sudden changes in rhetoric or action."
        }
    };
    format!(
        "Short-term outlook (7 days): {} Urgency is {}. {}",
        body,
        urgency_level(urgency_score),
        risk_clause(risk_count)
    )
}

/// 30-day outlook
pub fn medium_term(trajectory: Trajectory, risk_count: usize, urgency_score: f32) -> String {
    let body = match trajectory {
        Trajectory::Escalating => format!(
            "With {} urgency, the situation may develop into a more serious crisis. Watch actor responses, outside involvement and whether rhetoric turns into concrete steps.",
            urgency_level(urgency_score)
        ),
        Trajectory::DeEscalating => {
            "If current trends hold, the situation should move toward resolution or at least stabilization. Watch for formal agreements or continued positive signals.".to_string()
        }
        Trajectory::Stable => {
            "The situation is likely to stay in its current state unless an outside catalyst shifts it.".to_string()
        }
    };
    format!("Medium-term outlook (30 days): {} {}", body, risk_clause(risk_count))
}
