use tracing::info;

use super::core::PredictionArchive;
use crate::TARGET_DB;

impl PredictionArchive {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id TEXT NOT NULL,
                event_name TEXT NOT NULL,
                trajectory TEXT NOT NULL, -- escalating, de-escalating, stable
                trajectory_score REAL NOT NULL,
                confidence REAL NOT NULL,
                urgency REAL NOT NULL,
                actor_count INTEGER NOT NULL,
                risk_factors TEXT NOT NULL, -- JSON array
                as_of TEXT NOT NULL -- RFC 3339
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_event_id ON predictions (event_id);
            CREATE INDEX IF NOT EXISTS idx_predictions_as_of ON predictions (as_of);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Prediction archive schema initialized");
        Ok(())
    }
}
