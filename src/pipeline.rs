//! Batch and incremental orchestration
//!
//! Clustering always finishes before any event is analyzed. Once membership
//! is fixed, each event is analyzed and predicted on its own blocking task
//! from an owned snapshot, at most `max_parallel_events` at a time. A failure
//! in one event is recorded in the [`BatchReport`] and never stops the others.

use std::collections::{BTreeSet, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::article::{Article, ArticleId};
use crate::clustering::dbscan::validate_dimensions;
use crate::clustering::{ClusterStatistics, EventId, EventRegistry, EventSnapshot};
use crate::config::PipelineConfig;
use crate::error::{ClusterError, PipelineError};
use crate::prediction::{
    EventPrediction, HistoricalPredictionStore, PredictionSummary, TrajectoryPredictor,
};
use crate::rhetoric::{analyze, compare_events, RhetoricAnalysis, RhetoricComparison};
use crate::TARGET_PIPELINE;

/// Registry shared between update batches; one writer per batch
pub type SharedRegistry = Arc<RwLock<EventRegistry>>;

#[derive(Debug, Clone)]
pub struct EventOutcome {
    pub analysis: RhetoricAnalysis,
    pub prediction: EventPrediction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFailure {
    pub event_id: EventId,
    pub reason: String,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Successful events, ordered by event id
    pub outcomes: Vec<EventOutcome>,
    pub failures: Vec<EventFailure>,
    /// Articles that did not join an event; in incremental mode, the
    /// candidates expired during the batch
    pub noise: Vec<ArticleId>,
    /// Articles skipped for zero-magnitude embeddings
    pub excluded: Vec<ArticleId>,
    /// Articles waiting in a candidate group (incremental mode only)
    pub pending: Vec<ArticleId>,
    pub statistics: ClusterStatistics,
}

impl BatchReport {
    pub fn predictions(&self) -> Vec<EventPrediction> {
        self.outcomes.iter().map(|o| o.prediction.clone()).collect()
    }

    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary::from_predictions(&self.predictions())
    }

    pub fn comparison(&self) -> Option<RhetoricComparison> {
        let analyses: Vec<RhetoricAnalysis> =
            self.outcomes.iter().map(|o| o.analysis.clone()).collect();
        compare_events(&analyses)
    }
}

pub struct AnalysisPipeline {
    config: PipelineConfig,
    predictor: TrajectoryPredictor,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::with_predictor(config, TrajectoryPredictor::without_history())
    }

    pub fn with_history(
        config: PipelineConfig,
        history: Arc<dyn HistoricalPredictionStore>,
    ) -> Result<Self, PipelineError> {
        let predictor = TrajectoryPredictor::new(history).with_similar_limit(config.history_limit);
        Self::with_predictor(config, predictor)
    }

    pub fn with_predictor(
        config: PipelineConfig,
        predictor: TrajectoryPredictor,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, predictor })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// An empty registry using this pipeline's policy
    pub fn new_registry(&self) -> SharedRegistry {
        Arc::new(RwLock::new(EventRegistry::new(self.config.registry_policy())))
    }

    /// Clusters a full batch, then analyzes every resulting event.
    ///
    /// # Returns
    /// * `Ok((registry, report))` - The seeded registry and the per-event results
    /// * `Err(PipelineError::Cluster)` - If embedding dimensions are inconsistent
    pub async fn run_batch(
        &self,
        articles: Vec<Article>,
    ) -> Result<(EventRegistry, BatchReport), PipelineError> {
        info!(
            target: TARGET_PIPELINE,
            "Starting batch run over {} articles", articles.len()
        );

        let policy = self.config.registry_policy();
        let threshold = self.config.similarity_threshold;
        let (registry, outcome) = tokio::task::spawn_blocking(move || {
            EventRegistry::from_batch(policy, articles, threshold)
        })
        .await
        .map_err(|e| PipelineError::WorkerPool(e.to_string()))??;

        let snapshots = registry.snapshots();
        let (outcomes, failures) = self.analyze_events(snapshots).await?;

        let report = BatchReport {
            outcomes,
            failures,
            noise: outcome.noise,
            excluded: outcome.excluded,
            pending: Vec::new(),
            statistics: registry.statistics(),
        };
        log_report(&report);
        Ok((registry, report))
    }

    /// Applies new articles to a shared registry, then analyzes the events
    /// they touched.
    ///
    /// The write lock is held once for the whole batch and articles are
    /// applied in `(published_at, id)` order. A dimension mismatch anywhere in
    /// the batch rejects it before any article is applied.
    pub async fn run_update(
        &self,
        registry: &SharedRegistry,
        mut articles: Vec<Article>,
    ) -> Result<BatchReport, PipelineError> {
        articles.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let threshold = self.config.similarity_threshold;

        let mut touched: BTreeSet<EventId> = BTreeSet::new();
        let mut pending = Vec::new();
        let mut excluded = Vec::new();
        // Candidates that may expire during this batch, in pending order
        let mut candidates: Vec<ArticleId> = Vec::new();
        {
            let mut guard = registry.write().await;
            check_batch_dimensions(&guard, &articles)?;
            candidates.extend(guard.forming_groups().into_iter().flatten());

            for article in articles {
                let article_id = article.id.clone();
                match guard.merge_or_assign(article, threshold)? {
                    Some(event_id) => {
                        touched.insert(event_id);
                    }
                    None if guard.is_pending(&article_id) => {
                        candidates.push(article_id.clone());
                        pending.push(article_id);
                    }
                    None => excluded.push(article_id),
                }
            }
        }

        // Candidates neither pending nor promoted were expired as noise
        let (snapshots, statistics, pending, noise) = {
            let guard = registry.read().await;
            let snapshots: Vec<EventSnapshot> =
                touched.iter().filter_map(|id| guard.snapshot(id)).collect();
            let pending: Vec<ArticleId> = pending
                .into_iter()
                .filter(|id| guard.is_pending(id))
                .collect();
            let mut seen = HashSet::new();
            let noise: Vec<ArticleId> = candidates
                .into_iter()
                .filter(|id| !guard.is_pending(id) && guard.event_for_article(id).is_none())
                .filter(|id| seen.insert(id.clone()))
                .collect();
            (snapshots, guard.statistics(), pending, noise)
        };

        info!(
            target: TARGET_PIPELINE,
            "Update touched {} events; {} articles pending, {} expired",
            snapshots.len(),
            pending.len(),
            noise.len()
        );

        let (outcomes, failures) = self.analyze_events(snapshots).await?;
        let report = BatchReport {
            outcomes,
            failures,
            noise,
            excluded,
            pending,
            statistics,
        };
        log_report(&report);
        Ok(report)
    }

    async fn analyze_events(
        &self,
        snapshots: Vec<EventSnapshot>,
    ) -> Result<(Vec<EventOutcome>, Vec<EventFailure>), PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_events.max(1)));
        let mut expected: Vec<EventId> = Vec::with_capacity(snapshots.len());
        let mut set = JoinSet::new();

        for snapshot in snapshots {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;
            let predictor = self.predictor.clone();
            expected.push(snapshot.id().clone());

            set.spawn_blocking(move || {
                let _permit = permit;
                let event_id = snapshot.id().clone();
                let result = catch_unwind(AssertUnwindSafe(|| {
                    analyze(&snapshot).map(|analysis| {
                        let prediction = predictor.predict(&snapshot, &analysis);
                        EventOutcome {
                            analysis,
                            prediction,
                        }
                    })
                }));
                let result = match result {
                    Ok(Ok(outcome)) => Ok(outcome),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(panic) => Err(format!("analysis panicked: {}", panic_message(&*panic))),
                };
                (event_id, result)
            });
        }

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        let mut join_errors = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => outcomes.push(outcome),
                Ok((event_id, Err(reason))) => {
                    warn!(target: TARGET_PIPELINE, "Event {} failed: {}", event_id, reason);
                    failures.push(EventFailure { event_id, reason });
                }
                Err(e) => {
                    error!(target: TARGET_PIPELINE, "Analysis task failed: {}", e);
                    join_errors.push(e.to_string());
                }
            }
        }

        // Tasks that never reported back are failures of their event
        if !join_errors.is_empty() {
            let reported: HashSet<EventId> = outcomes
                .iter()
                .map(|o: &EventOutcome| o.prediction.event_id.clone())
                .chain(failures.iter().map(|f: &EventFailure| f.event_id.clone()))
                .collect();
            let reason = join_errors.join("; ");
            for event_id in expected.into_iter().filter(|id| !reported.contains(id)) {
                failures.push(EventFailure {
                    event_id,
                    reason: reason.clone(),
                });
            }
        }

        outcomes.sort_by(|a, b| a.prediction.event_id.cmp(&b.prediction.event_id));
        failures.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Ok((outcomes, failures))
    }
}

/// Rejects the batch if any article, zero-magnitude ones included, disagrees
/// with the registry (or with the rest of the batch) on embedding length.
fn check_batch_dimensions(registry: &EventRegistry, articles: &[Article]) -> Result<(), ClusterError> {
    validate_dimensions(articles)?;

    if let (Some(expected), Some(first)) = (registry.dimension(), articles.first()) {
        if first.dimension() != expected {
            return Err(ClusterError::InvalidEmbeddingDimension {
                article_id: first.id.clone(),
                expected,
                found: first.dimension(),
            });
        }
    }
    Ok(())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_report(report: &BatchReport) {
    info!(
        target: TARGET_PIPELINE,
        "Run complete: {} events analyzed, {} failed, {} noise, {} excluded",
        report.outcomes.len(),
        report.failures.len(),
        report.noise.len(),
        report.excluded.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::article;
    use crate::prediction::InMemoryPredictionStore;

    fn config(min_members: usize, retention_days: i64) -> PipelineConfig {
        PipelineConfig {
            similarity_threshold: 0.8,
            min_members,
            retention_days,
            max_parallel_events: 2,
            history_limit: 3,
        }
    }

    fn two_stories() -> Vec<Article> {
        vec![
            article("a1", vec![1.0, 0.0, 0.0], 0.3, 0),
            article("a2", vec![0.98, 0.1, 0.0], 0.1, 1),
            article("a3", vec![0.97, 0.0, 0.1], -0.4, 2),
            article("b1", vec![0.0, 1.0, 0.0], 0.0, 3),
            article("b2", vec![0.1, 0.97, 0.0], 0.0, 4),
            article("n1", vec![0.0, 0.0, 1.0], 0.0, 5),
        ]
    }

    #[tokio::test]
    async fn test_run_batch() {
        let pipeline = AnalysisPipeline::new(config(2, 14)).unwrap();
        let (registry, report) = pipeline.run_batch(two_stories()).await.unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.noise, vec!["n1".to_string()]);
        assert_eq!(report.statistics.total_articles, 5);
        assert_eq!(report.summary().total_events, 2);
        assert!(report.comparison().is_some());

        let ids: Vec<&EventId> = report.outcomes.iter().map(|o| &o.prediction.event_id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_failing_event_does_not_stop_batch() {
        let mut articles = two_stories();
        articles[3].sentiment = 1.5;
        let pipeline = AnalysisPipeline::new(config(2, 14)).unwrap();
        let (registry, report) = pipeline.run_batch(articles).await.unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            Some(&report.failures[0].event_id),
            registry.event_for_article("b1")
        );
        assert!(report.failures[0].reason.contains("b1"));
    }

    #[tokio::test]
    async fn test_run_batch_rejects_mixed_dimensions() {
        let mut articles = two_stories();
        articles.push(article("odd", vec![1.0, 0.0], 0.0, 6));
        let pipeline = AnalysisPipeline::new(config(2, 14)).unwrap();
        let result = pipeline.run_batch(articles).await;
        assert!(matches!(
            result,
            Err(PipelineError::Cluster(ClusterError::InvalidEmbeddingDimension { .. }))
        ));
    }

    #[tokio::test]
    async fn test_run_update_accumulates_across_batches() {
        let pipeline = AnalysisPipeline::new(config(2, 14)).unwrap();
        let registry = pipeline.new_registry();

        let first = pipeline
            .run_update(&registry, vec![article("a1", vec![1.0, 0.0], 0.2, 0)])
            .await
            .unwrap();
        assert!(first.outcomes.is_empty());
        assert_eq!(first.pending, vec!["a1".to_string()]);

        let second = pipeline
            .run_update(
                &registry,
                vec![
                    article("a3", vec![0.97, 0.1], -0.3, 2),
                    article("a2", vec![0.99, 0.05], 0.0, 1),
                ],
            )
            .await
            .unwrap();
        assert_eq!(second.outcomes.len(), 1);
        assert!(second.pending.is_empty());
        assert_eq!(second.outcomes[0].analysis.article_count, 3);
        assert_eq!(registry.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_run_update_applies_in_time_order() {
        let pipeline = AnalysisPipeline::new(config(2, 1)).unwrap();
        let registry = pipeline.new_registry();

        // Applied as given, "late" would expire the first article before the
        // second could join it
        let report = pipeline
            .run_update(
                &registry,
                vec![
                    article("late", vec![0.0, 1.0], 0.0, 100),
                    article("early1", vec![1.0, 0.0], 0.0, 0),
                    article("early2", vec![0.99, 0.05], 0.0, 1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.pending, vec!["late".to_string()]);
    }

    #[tokio::test]
    async fn test_run_update_rejects_batch_atomically() {
        let pipeline = AnalysisPipeline::new(config(2, 14)).unwrap();
        let registry = pipeline.new_registry();
        pipeline
            .run_update(&registry, vec![article("a1", vec![1.0, 0.0], 0.0, 0)])
            .await
            .unwrap();

        let result = pipeline
            .run_update(
                &registry,
                vec![
                    article("a2", vec![1.0, 0.0], 0.0, 1),
                    article("bad", vec![1.0, 0.0, 0.0], 0.0, 2),
                ],
            )
            .await;
        assert!(matches!(result, Err(PipelineError::Cluster(_))));

        let guard = registry.read().await;
        assert!(guard.is_empty());
        assert!(!guard.is_pending("a2"));
        assert!(guard.is_pending("a1"));
        drop(guard);

        // A zero vector of the wrong length is rejected before a2 can promote
        let result = pipeline
            .run_update(
                &registry,
                vec![
                    article("a2", vec![0.99, 0.05], 0.0, 1),
                    article("z", vec![0.0, 0.0, 0.0], 0.0, 2),
                ],
            )
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Cluster(ClusterError::InvalidEmbeddingDimension { .. }))
        ));

        let guard = registry.read().await;
        assert!(guard.is_empty());
        assert!(!guard.is_pending("a2"));
        assert!(guard.is_pending("a1"));
    }

    #[tokio::test]
    async fn test_run_update_reports_expired_candidates_as_noise() {
        let pipeline = AnalysisPipeline::new(config(2, 1)).unwrap();
        let registry = pipeline.new_registry();

        let first = pipeline
            .run_update(&registry, vec![article("old", vec![1.0, 0.0], 0.0, 0)])
            .await
            .unwrap();
        assert!(first.noise.is_empty());

        // "stray" goes pending and expires within the same batch
        let second = pipeline
            .run_update(
                &registry,
                vec![
                    article("stray", vec![0.0, 1.0], 0.0, 30),
                    article("new", vec![1.0, 0.0], 0.0, 60),
                ],
            )
            .await
            .unwrap();
        assert_eq!(second.noise, vec!["old".to_string(), "stray".to_string()]);
        assert_eq!(second.pending, vec!["new".to_string()]);

        let guard = registry.read().await;
        assert!(!guard.is_pending("old"));
        assert!(guard.event_for_article("old").is_none());
    }

    #[tokio::test]
    async fn test_history_feeds_similar_events() {
        let store = Arc::new(InMemoryPredictionStore::new());
        let pipeline = AnalysisPipeline::with_history(config(2, 14), store.clone()).unwrap();

        let (_, first) = pipeline.run_batch(two_stories()).await.unwrap();
        assert!(first
            .outcomes
            .iter()
            .all(|o| o.prediction.similar_events.is_empty()));
        for prediction in first.predictions() {
            store.insert(prediction.to_record());
        }

        let (_, second) = pipeline.run_batch(two_stories()).await.unwrap();
        for outcome in &second.outcomes {
            assert_eq!(outcome.prediction.similar_events.len(), 1);
            assert_ne!(outcome.prediction.similar_events[0].event_id, outcome.prediction.event_id);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut bad = config(2, 14);
        bad.similarity_threshold = 0.0;
        assert!(matches!(
            AnalysisPipeline::new(bad),
            Err(PipelineError::Config(_))
        ));
    }
}
