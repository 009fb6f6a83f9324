use thiserror::Error;

use crate::article::ArticleId;
use crate::clustering::EventId;

/// Errors raised while grouping articles into events
#[derive(Debug, Error)]
pub enum ClusterError {
    /// All embeddings must share one dimensionality; this is fatal for the batch.
    #[error("embedding dimension mismatch for article {article_id}: expected {expected}, found {found}")]
    InvalidEmbeddingDimension {
        article_id: ArticleId,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while analyzing or predicting a single event
///
/// These never abort a batch; the pipeline records them per event.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("event {0} has no member articles")]
    EmptyEvent(EventId),

    #[error("article {article_id} has sentiment {value} outside [-1, 1]")]
    InvalidSentiment { article_id: ArticleId, value: f32 },
}

/// Provider output the core refuses to build an article from
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("sentiment {value} for article {article_id} is outside [-1, 1]")]
    SentimentOutOfRange { article_id: ArticleId, value: f32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Unparseable { key: String, value: String },

    #[error("similarity threshold {0} must be within (0, 1]")]
    SimilarityThreshold(f32),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Errors that abort a whole pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker pool closed: {0}")]
    WorkerPool(String),
}
