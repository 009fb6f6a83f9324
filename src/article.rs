use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

pub type ArticleId = String;

/// A news article with its provider outputs attached
///
/// Articles are immutable once built; the registry shares them as `Arc<Article>`
/// and events refer to them only by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Keywords supplied upstream; when empty they are derived from the title
    #[serde(default)]
    pub keywords: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub language: String,
    pub embedding: Vec<f32>,
    pub sentiment: f32,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Article {
    /// Title, description and content joined for lexical analysis
    pub fn full_text(&self) -> String {
        let mut text = self.title.clone();
        for part in [&self.description, &self.content].into_iter().flatten() {
            if !part.is_empty() {
                text.push(' ');
                text.push_str(part);
            }
        }
        text
    }

    /// Title and description only, the text used for key-phrase extraction
    pub fn headline_text(&self) -> String {
        match &self.description {
            Some(description) if !description.is_empty() => {
                format!("{} {}", self.title, description)
            }
            _ => self.title.clone(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::entity::EntityType;

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    /// Builds a test article published `hours` after the base time.
    pub fn article(id: &str, embedding: Vec<f32>, sentiment: f32, hours: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Report {}", id),
            description: None,
            content: None,
            keywords: Vec::new(),
            published_at: base_time() + Duration::hours(hours),
            source: "wire".to_string(),
            language: "en".to_string(),
            embedding,
            sentiment,
            entities: Vec::new(),
        }
    }

    pub fn with_text(mut article: Article, title: &str, description: &str) -> Article {
        article.title = title.to_string();
        article.description = Some(description.to_string());
        article
    }

    pub fn with_entities(mut article: Article, entities: &[(&str, EntityType)]) -> Article {
        article.entities = entities
            .iter()
            .map(|(name, entity_type)| Entity::new(name, *entity_type))
            .collect();
        article
    }
}
