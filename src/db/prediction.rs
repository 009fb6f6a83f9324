use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::core::{DbLockErrorExt, PredictionArchive};
use crate::clustering::EventId;
use crate::prediction::{
    EventPrediction, HistoricalRecord, InMemoryPredictionStore, PredictionFeatures, Trajectory,
};
use crate::TARGET_DB;

/// Attempts made when the database reports a lock
const MAX_WRITE_ATTEMPTS: u32 = 3;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

impl PredictionArchive {
    /// Appends a prediction. Earlier rows for the same event are kept; loading
    /// uses the most recent one.
    pub async fn record(&self, prediction: &EventPrediction) -> Result<()> {
        let risk_factors = serde_json::to_string(&prediction.risk_factors)
            .context("Failed to serialize risk factors")?;

        let mut attempt = 1;
        loop {
            let result = sqlx::query(
                r#"
                INSERT INTO predictions
                    (event_id, event_name, trajectory, trajectory_score, confidence,
                     urgency, actor_count, risk_factors, as_of)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(prediction.event_id.as_str())
            .bind(&prediction.event_name)
            .bind(prediction.trajectory.to_string())
            .bind(prediction.trajectory_score)
            .bind(prediction.confidence)
            .bind(prediction.features.urgency)
            .bind(prediction.features.actor_count as i64)
            .bind(&risk_factors)
            .bind(prediction.as_of.to_rfc3339())
            .execute(self.pool())
            .await;

            match result {
                Ok(_) => {
                    debug!(
                        target: TARGET_DB,
                        "Recorded prediction for {} ({})", prediction.event_id, prediction.trajectory
                    );
                    return Ok(());
                }
                Err(e) if e.is_database_lock_error() && attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(
                        target: TARGET_DB,
                        "Database locked recording {} (attempt {}), retrying",
                        prediction.event_id,
                        attempt
                    );
                    attempt += 1;
                    sleep(LOCK_RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to record prediction for {}", prediction.event_id)
                    })
                }
            }
        }
    }

    pub async fn record_all(&self, predictions: &[EventPrediction]) -> Result<()> {
        for prediction in predictions {
            self.record(prediction).await?;
        }
        Ok(())
    }

    /// All stored rows in insertion order
    pub async fn load_records(&self) -> Result<Vec<HistoricalRecord>> {
        let rows = sqlx::query(
            "SELECT event_id, event_name, trajectory, urgency, actor_count, as_of FROM predictions ORDER BY id",
        )
        .fetch_all(self.pool())
        .await
        .context("Failed to load predictions")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let event_id: String = row.try_get("event_id")?;
            let trajectory: String = row.try_get("trajectory")?;
            let as_of: String = row.try_get("as_of")?;
            let actor_count: i64 = row.try_get("actor_count")?;

            let trajectory = match trajectory.parse::<Trajectory>() {
                Ok(t) => t,
                Err(e) => {
                    warn!(target: TARGET_DB, "Skipping prediction for {}: {}", event_id, e);
                    continue;
                }
            };
            let recorded_at = DateTime::parse_from_rfc3339(&as_of)
                .with_context(|| format!("Invalid timestamp '{}' for {}", as_of, event_id))?
                .with_timezone(&Utc);

            records.push(HistoricalRecord {
                event_id: EventId(event_id),
                event_name: row.try_get("event_name")?,
                features: PredictionFeatures {
                    trajectory,
                    urgency: row.try_get("urgency")?,
                    actor_count: actor_count.max(0) as usize,
                },
                recorded_at,
            });
        }

        Ok(records)
    }

    /// Loads the archive into a queryable store, latest row per event.
    pub async fn load_store(&self) -> Result<InMemoryPredictionStore> {
        let records = self.load_records().await?;
        let store = InMemoryPredictionStore::from_records(records);
        info!(
            target: TARGET_DB,
            "Loaded {} historical predictions",
            store.len()
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::base_time;
    use crate::prediction::{HistoricalPredictionStore, RiskFactor, RiskKind};

    fn prediction(id: &str, trajectory: Trajectory, urgency: f32, actor_count: usize) -> EventPrediction {
        EventPrediction {
            event_id: EventId(id.to_string()),
            event_name: format!("Event {}", id),
            as_of: base_time(),
            trajectory,
            trajectory_score: trajectory.code() * 0.5,
            confidence: 0.6,
            key_indicators: Vec::new(),
            risk_factors: vec![RiskFactor {
                kind: RiskKind::HighUrgency,
                description: "High urgency".to_string(),
            }],
            short_term_outlook: String::new(),
            medium_term_outlook: String::new(),
            similar_events: Vec::new(),
            features: PredictionFeatures {
                trajectory,
                urgency,
                actor_count,
            },
        }
    }

    #[tokio::test]
    async fn test_record_and_load() {
        let archive = PredictionArchive::in_memory().await.unwrap();
        archive
            .record_all(&[
                prediction("e1", Trajectory::Escalating, 0.7, 4),
                prediction("e2", Trajectory::Stable, 0.1, 1),
            ])
            .await
            .unwrap();

        let records = archive.load_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id.as_str(), "e1");
        assert_eq!(records[0].features.trajectory, Trajectory::Escalating);
        assert_eq!(records[0].features.actor_count, 4);
        assert!((records[0].features.urgency - 0.7).abs() < 1e-6);
        assert_eq!(records[0].recorded_at, base_time());
        assert_eq!(archive.prediction_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_keeps_latest_per_event() {
        let archive = PredictionArchive::in_memory().await.unwrap();
        archive
            .record(&prediction("e1", Trajectory::Stable, 0.0, 1))
            .await
            .unwrap();
        archive
            .record(&prediction("e1", Trajectory::Escalating, 0.8, 5))
            .await
            .unwrap();
        archive
            .record(&prediction("e2", Trajectory::DeEscalating, 0.0, 0))
            .await
            .unwrap();

        let store = archive.load_store().await.unwrap();
        assert_eq!(store.len(), 2);

        let matches = store.query(
            &PredictionFeatures {
                trajectory: Trajectory::Escalating,
                urgency: 0.8,
                actor_count: 5,
            },
            &EventId("new".to_string()),
            3,
        );
        assert_eq!(matches[0].event_id.as_str(), "e1");
        assert_eq!(matches[0].distance, 0.0);
        assert_eq!(matches[1].event_id.as_str(), "e2");
    }

    #[tokio::test]
    async fn test_empty_archive() {
        let archive = PredictionArchive::in_memory().await.unwrap();
        assert!(archive.load_store().await.unwrap().is_empty());
    }
}
