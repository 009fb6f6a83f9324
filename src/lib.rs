pub mod article;
pub mod clustering;
pub mod config;
pub mod db;
pub mod entity;
pub mod environment;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod prediction;
pub mod providers;
pub mod rhetoric;
pub mod text;
pub mod vector;

pub const TARGET_CLUSTER: &str = "cluster";
pub const TARGET_RHETORIC: &str = "rhetoric";
pub const TARGET_PREDICTION: &str = "prediction";
pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_DB: &str = "db_query";

pub use article::{Article, ArticleId};
pub use clustering::{
    cluster, ClusterOutcome, Event, EventId, EventRegistry, EventSnapshot, LifecycleState,
    RegistryPolicy,
};
pub use config::PipelineConfig;
pub use error::{AnalysisError, ClusterError, ConfigError, PipelineError, ProviderError};
pub use pipeline::{AnalysisPipeline, BatchReport, SharedRegistry};
pub use prediction::{EventPrediction, Trajectory, TrajectoryPredictor};
pub use rhetoric::{analyze, RhetoricAnalysis, Trend};
