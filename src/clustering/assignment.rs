use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::clustering::registry::{EventRegistry, PendingGroup};
use crate::clustering::temporal::outside_retention;
use crate::clustering::types::{Event, EventId};
use crate::error::ClusterError;
use crate::vector::{cosine_similarity, is_degenerate, update_running_mean};
use crate::TARGET_CLUSTER;

/// Similarities closer than this are treated as equal
pub const SIMILARITY_TIE_EPSILON: f32 = 1e-6;

impl EventRegistry {
    /// Assigns a newly arrived article to an existing event, or parks it in a
    /// candidate group until enough similar articles arrive.
    ///
    /// This function:
    /// 1. Returns early for articles the registry has already seen
    /// 2. Advances the registry clock and expires stale candidate groups
    /// 3. Joins the most similar event at or above `similarity_threshold`
    /// 4. Otherwise joins (or opens) a candidate group, promoting it to an
    ///    event once it reaches `min_members`
    ///
    /// # Returns
    /// * `Ok(Some(event_id))` - The event that now contains the article
    /// * `Ok(None)` - The article is pending, or was skipped for a zero-magnitude embedding
    /// * `Err(ClusterError::InvalidEmbeddingDimension)` - The embedding length does not match the registry
    pub fn merge_or_assign(
        &mut self,
        article: Article,
        similarity_threshold: f32,
    ) -> Result<Option<EventId>, ClusterError> {
        if let Some(existing) = self.membership.get(&article.id) {
            debug!(
                target: TARGET_CLUSTER,
                "Article {} already belongs to {}", article.id, existing
            );
            return Ok(Some(existing.clone()));
        }
        if self.is_pending(&article.id) {
            debug!(target: TARGET_CLUSTER, "Article {} is already pending", article.id);
            return Ok(None);
        }

        if let Some(expected) = self.dimension {
            if article.dimension() != expected {
                return Err(ClusterError::InvalidEmbeddingDimension {
                    article_id: article.id.clone(),
                    expected,
                    found: article.dimension(),
                });
            }
        }

        if is_degenerate(&article.embedding) {
            warn!(
                target: TARGET_CLUSTER,
                "Skipping article {}: zero-magnitude embedding", article.id
            );
            return Ok(None);
        }
        self.dimension.get_or_insert(article.dimension());

        let clock = match self.clock {
            Some(clock) => clock.max(article.published_at),
            None => article.published_at,
        };
        self.clock = Some(clock);
        self.expire_pending();

        let article = Arc::new(article);

        if let Some(event_id) = self.best_event(&article.embedding, similarity_threshold) {
            let revision = self.next_revision();
            if let Some(event) = self.events.get_mut(&event_id) {
                event.absorb(&article, revision);
                debug!(
                    target: TARGET_CLUSTER,
                    "Article {} joined {} ({} members)",
                    article.id,
                    event_id,
                    event.len()
                );
            }
            self.membership.insert(article.id.clone(), event_id.clone());
            self.articles.insert(article.id.clone(), article);
            return Ok(Some(event_id));
        }

        Ok(self.assign_pending(article, similarity_threshold))
    }

    /// Most similar event at or above the threshold
    fn best_event(&self, embedding: &[f32], similarity_threshold: f32) -> Option<EventId> {
        let candidates = self.events.values().filter_map(|event| {
            let similarity = cosine_similarity(event.centroid(), embedding)?;
            meets_threshold(similarity, similarity_threshold).then(|| {
                (event.id().clone(), similarity, event.revision())
            })
        });
        best_match(candidates)
    }

    fn assign_pending(
        &mut self,
        article: Arc<Article>,
        similarity_threshold: f32,
    ) -> Option<EventId> {
        let revision = self.next_revision();
        let candidates = self.pending.iter().enumerate().filter_map(|(idx, group)| {
            let similarity = cosine_similarity(&group.centroid, &article.embedding)?;
            meets_threshold(similarity, similarity_threshold)
                .then_some((idx, similarity, group.revision))
        });

        let idx = match best_match(candidates) {
            Some(idx) => {
                let group = &mut self.pending[idx];
                update_running_mean(&mut group.centroid, &article.embedding, group.members.len());
                group.newest = group.newest.max(article.published_at);
                group.revision = revision;
                group.members.push(article);
                idx
            }
            None => {
                self.pending.push(PendingGroup {
                    centroid: article.embedding.clone(),
                    newest: article.published_at,
                    revision,
                    members: vec![article],
                });
                self.pending.len() - 1
            }
        };

        if self.pending[idx].members.len() < self.policy.min_members.max(1) {
            return None;
        }

        let group = self.pending.remove(idx);
        self.promote(group)
    }

    fn promote(&mut self, group: PendingGroup) -> Option<EventId> {
        let founders: Vec<&Article> = group.members.iter().map(|a| a.as_ref()).collect();
        let event = Event::from_articles(&founders, group.revision)?;
        let event_id = event.id().clone();

        for article in group.members {
            self.membership.insert(article.id.clone(), event_id.clone());
            self.articles.insert(article.id.clone(), article);
        }

        info!(
            target: TARGET_CLUSTER,
            "Promoted candidate group to event {} ({} members)",
            event_id,
            event.len()
        );
        self.events.insert(event_id.clone(), event);
        Some(event_id)
    }

    /// Drops candidate groups with no new article within the retention window
    fn expire_pending(&mut self) {
        let Some(clock) = self.clock else {
            return;
        };
        let retention = self.policy.retention;
        let before = self.pending.len();
        self.pending.retain(|group| {
            let expired = outside_retention(group.newest, clock, retention);
            if expired {
                debug!(
                    target: TARGET_CLUSTER,
                    "Discarding {} pending articles as noise",
                    group.members.len()
                );
            }
            !expired
        });
        if self.pending.len() != before {
            info!(
                target: TARGET_CLUSTER,
                "Expired {} candidate groups",
                before - self.pending.len()
            );
        }
    }
}

fn meets_threshold(similarity: f32, similarity_threshold: f32) -> bool {
    similarity >= similarity_threshold - SIMILARITY_TIE_EPSILON
}

/// Highest similarity wins; near-equal similarities go to the highest revision.
fn best_match<K>(candidates: impl Iterator<Item = (K, f32, u64)>) -> Option<K> {
    let mut best: Option<(K, f32, u64)> = None;
    for (key, similarity, revision) in candidates {
        let replace = match &best {
            None => true,
            Some((_, best_similarity, best_revision)) => {
                if (similarity - best_similarity).abs() <= SIMILARITY_TIE_EPSILON {
                    revision > *best_revision
                } else {
                    similarity > *best_similarity
                }
            }
        };
        if replace {
            best = Some((key, similarity, revision));
        }
    }
    best.map(|(key, _, _)| key)
}
