use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use crate::article::{Article, ArticleId};
use crate::clustering::dbscan::{cluster, validate_dimensions};
use crate::clustering::temporal::event_lifecycle;
use crate::clustering::types::{
    ClusterOutcome, ClusterStatistics, Event, EventId, EventSnapshot, LifecycleState,
};
use crate::config::{DEFAULT_MIN_MEMBERS, DEFAULT_RETENTION_DAYS};
use crate::error::ClusterError;
use crate::TARGET_CLUSTER;

/// Promotion and expiry rules for incremental assignment
///
/// * A pending candidate group is promoted to an event once it holds
///   `min_members` articles.
/// * A pending group whose newest article is older than `retention` (measured
///   against the latest article timestamp the registry has seen) is discarded
///   and its articles are dropped as noise.
/// * An event with no new member within `retention` is reported DORMANT.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryPolicy {
    pub min_members: usize,
    pub retention: Duration,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            min_members: DEFAULT_MIN_MEMBERS,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }
}

/// Unpromoted articles that are similar to each other but not to any event
#[derive(Debug, Clone)]
pub(crate) struct PendingGroup {
    pub(crate) members: Vec<Arc<Article>>,
    pub(crate) centroid: Vec<f32>,
    pub(crate) newest: DateTime<Utc>,
    pub(crate) revision: u64,
}

impl PendingGroup {
    pub(crate) fn contains(&self, article_id: &str) -> bool {
        self.members.iter().any(|a| a.id == article_id)
    }
}

/// Mutable store of events for one pipeline
///
/// Events live in an id-keyed map and refer to articles by id; a side index
/// maps each article to the event that owns it. The registry is passed
/// explicitly, so independent pipelines never share state.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    pub(crate) policy: RegistryPolicy,
    pub(crate) dimension: Option<usize>,
    pub(crate) articles: HashMap<ArticleId, Arc<Article>>,
    pub(crate) events: BTreeMap<EventId, Event>,
    pub(crate) membership: HashMap<ArticleId, EventId>,
    pub(crate) pending: Vec<PendingGroup>,
    pub(crate) revision: u64,
    pub(crate) clock: Option<DateTime<Utc>>,
}

impl EventRegistry {
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Seeds a registry from a batch clustering pass.
    ///
    /// Noise articles are not kept. Revisions follow each event's latest
    /// article, so the most recently active event wins later tie-breaks.
    pub fn from_batch(
        policy: RegistryPolicy,
        articles: Vec<Article>,
        similarity_threshold: f32,
    ) -> Result<(Self, ClusterOutcome), ClusterError> {
        validate_dimensions(&articles)?;
        let outcome = cluster(&articles, similarity_threshold, policy.min_members)?;

        let mut registry = Self::new(policy);
        registry.dimension = articles.first().map(|a| a.dimension());
        registry.clock = articles.iter().map(|a| a.published_at).max();

        let mut by_id: HashMap<ArticleId, Arc<Article>> = articles
            .into_iter()
            .map(|a| (a.id.clone(), Arc::new(a)))
            .collect();

        let mut ordered: Vec<&Event> = outcome.events.iter().collect();
        ordered.sort_by(|a, b| {
            a.last_seen()
                .cmp(&b.last_seen())
                .then_with(|| a.id().cmp(b.id()))
        });

        for event in ordered {
            let mut event = event.clone();
            let revision = registry.next_revision();
            event.set_revision(revision);
            for member in event.members() {
                if let Some(article) = by_id.remove(member) {
                    registry.articles.insert(member.clone(), article);
                }
                registry
                    .membership
                    .insert(member.clone(), event.id().clone());
            }
            registry.events.insert(event.id().clone(), event);
        }

        info!(
            target: TARGET_CLUSTER,
            "Registry seeded with {} events ({} articles)",
            registry.events.len(),
            registry.membership.len()
        );

        Ok((registry, outcome))
    }

    pub fn policy(&self) -> &RegistryPolicy {
        &self.policy
    }

    /// Embedding length fixed by the first accepted article
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Latest article timestamp seen; the reference point for retention
    pub fn clock(&self) -> Option<DateTime<Utc>> {
        self.clock
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event(&self, event_id: &EventId) -> Option<&Event> {
        self.events.get(event_id)
    }

    /// Events in id order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    pub fn event_for_article(&self, article_id: &str) -> Option<&EventId> {
        self.membership.get(article_id)
    }

    pub fn article(&self, article_id: &str) -> Option<&Arc<Article>> {
        self.articles.get(article_id)
    }

    pub fn is_pending(&self, article_id: &str) -> bool {
        self.pending.iter().any(|g| g.contains(article_id))
    }

    /// Member ids of each FORMING candidate group
    pub fn forming_groups(&self) -> Vec<Vec<ArticleId>> {
        self.pending
            .iter()
            .map(|g| g.members.iter().map(|a| a.id.clone()).collect())
            .collect()
    }

    pub fn lifecycle(&self, event_id: &EventId) -> Option<LifecycleState> {
        let event = self.events.get(event_id)?;
        Some(match self.clock {
            Some(clock) => event_lifecycle(event, clock, self.policy.retention),
            None => LifecycleState::Active,
        })
    }

    /// Owned copy of an event and its member articles
    pub fn snapshot(&self, event_id: &EventId) -> Option<EventSnapshot> {
        let event = self.events.get(event_id)?;
        let members = event
            .members()
            .iter()
            .filter_map(|id| self.articles.get(id).cloned())
            .collect();
        Some(EventSnapshot {
            event: event.clone(),
            members,
        })
    }

    pub fn snapshots(&self) -> Vec<EventSnapshot> {
        self.events
            .keys()
            .filter_map(|id| self.snapshot(id))
            .collect()
    }

    pub fn statistics(&self) -> ClusterStatistics {
        let total_articles: usize = self.events.values().map(|e| e.len()).sum();
        let largest = self
            .events
            .values()
            .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| b.id().cmp(a.id())));
        let dormant_events = self
            .events
            .keys()
            .filter(|id| self.lifecycle(id) == Some(LifecycleState::Dormant))
            .count();

        ClusterStatistics {
            total_events: self.events.len(),
            total_articles,
            avg_articles_per_event: if self.events.is_empty() {
                0.0
            } else {
                total_articles as f64 / self.events.len() as f64
            },
            largest_event_size: largest.map_or(0, |e| e.len()),
            largest_event_id: largest.map(|e| e.id().clone()),
            pending_candidates: self.pending.iter().map(|g| g.members.len()).sum(),
            dormant_events,
        }
    }

    pub(crate) fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::fixtures::article;

    #[test]
    fn test_from_batch_indexes_members() {
        let articles = vec![
            article("a1", vec![1.0, 0.0], 0.1, 0),
            article("a2", vec![0.99, 0.05], 0.1, 1),
            article("b1", vec![0.0, 1.0], 0.1, 5),
            article("b2", vec![0.05, 0.99], 0.1, 6),
            article("noise", vec![-1.0, 0.0], 0.1, 7),
        ];
        let (registry, outcome) =
            EventRegistry::from_batch(RegistryPolicy::default(), articles, 0.8).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(outcome.noise, vec!["noise".to_string()]);
        assert!(registry.article("noise").is_none());
        assert!(registry.event_for_article("noise").is_none());

        let a_event = registry.event_for_article("a1").unwrap().clone();
        let b_event = registry.event_for_article("b1").unwrap().clone();
        assert_ne!(a_event, b_event);
        assert_eq!(registry.event_for_article("a2"), Some(&a_event));

        // The event with the latest article carries the highest revision
        assert!(
            registry.event(&b_event).unwrap().revision()
                > registry.event(&a_event).unwrap().revision()
        );

        let snapshot = registry.snapshot(&a_event).unwrap();
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(registry.dimension(), Some(2));
    }

    #[test]
    fn test_statistics() {
        let articles = vec![
            article("a1", vec![1.0, 0.0], 0.0, 0),
            article("a2", vec![0.99, 0.05], 0.0, 1),
            article("a3", vec![0.98, 0.1], 0.0, 2),
            article("b1", vec![0.0, 1.0], 0.0, 3),
            article("b2", vec![0.05, 0.99], 0.0, 4),
        ];
        let (registry, _) =
            EventRegistry::from_batch(RegistryPolicy::default(), articles, 0.8).unwrap();
        let stats = registry.statistics();

        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.total_articles, 5);
        assert_eq!(stats.largest_event_size, 3);
        assert!((stats.avg_articles_per_event - 2.5).abs() < 1e-9);
        assert_eq!(
            stats.largest_event_id.as_ref(),
            registry.event_for_article("a1")
        );
        assert_eq!(stats.pending_candidates, 0);
        assert_eq!(stats.dormant_events, 0);
    }
}
