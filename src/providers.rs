//! Boundaries to the embedding, sentiment and entity models
//!
//! The models themselves live outside this crate. Implementations may block
//! (local inference) or wrap a remote call; the core only sees finished
//! [`Article`]s.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::article::{Article, ArticleId};
use crate::entity::{Entity, EntityType, TARGET_ENTITY};
use crate::error::ProviderError;

pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub trait SentimentScorer: Send + Sync {
    /// Sentiment in [-1, 1]
    fn score(&self, text: &str) -> Result<f32>;
}

pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<Entity>>;
}

/// An article as fetched, before any model has looked at it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub language: String,
}

/// Runs the three providers over a raw article.
///
/// Embedding and sentiment failures are errors. A failed entity extraction
/// only leaves the article without entities, which later reads as "no
/// actors".
pub fn enrich_article(
    raw: RawArticle,
    embedder: &dyn Embedder,
    scorer: &dyn SentimentScorer,
    extractor: &dyn EntityExtractor,
) -> Result<Article> {
    let mut article = Article {
        id: raw.id,
        title: raw.title,
        description: raw.description,
        content: raw.content,
        keywords: raw.keywords,
        published_at: raw.published_at,
        source: raw.source,
        language: raw.language,
        embedding: Vec::new(),
        sentiment: 0.0,
        entities: Vec::new(),
    };
    let text = article.full_text();

    article.embedding = embedder
        .embed(&text)
        .with_context(|| format!("Failed to embed article {}", article.id))?;

    let sentiment = scorer
        .score(&text)
        .with_context(|| format!("Failed to score sentiment for article {}", article.id))?;
    if !sentiment.is_finite() || !(-1.0..=1.0).contains(&sentiment) {
        return Err(ProviderError::SentimentOutOfRange {
            article_id: article.id,
            value: sentiment,
        }
        .into());
    }
    article.sentiment = sentiment;

    article.entities = match extractor.extract(&text) {
        Ok(entities) => entities,
        Err(e) => {
            warn!(
                target: TARGET_ENTITY,
                "Entity extraction failed for article {}: {:#}", article.id, e
            );
            Vec::new()
        }
    };

    debug!(
        target: TARGET_ENTITY,
        "Enriched article {} ({} dims, {} entities)",
        article.id,
        article.embedding.len(),
        article.entities.len()
    );

    Ok(article)
}

/// Parses an extractor's JSON reply of the form
/// `{"entities": [{"name": "...", "type": "..."}]}`.
///
/// Entries without a name or type are skipped.
pub fn parse_entity_json(json_str: &str) -> Result<Vec<Entity>> {
    let json: Value = serde_json::from_str(json_str)
        .context("Invalid JSON format in entity extraction response")?;

    let mut entities = Vec::new();
    if let Some(items) = json.get("entities").and_then(|e| e.as_array()) {
        for item in items {
            if let (Some(name), Some(entity_type)) = (
                item.get("name").and_then(|n| n.as_str()),
                item.get("type").and_then(|t| t.as_str()),
            ) {
                if name.trim().is_empty() {
                    continue;
                }
                entities.push(Entity::new(name.trim(), EntityType::from(entity_type)));
            }
        }
    }

    debug!(target: TARGET_ENTITY, "Parsed {} entities", entities.len());
    Ok(entities)
}
