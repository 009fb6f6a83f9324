use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use crate::article::{Article, ArticleId};
use crate::clustering::naming::derive_name;
use crate::vector::{centroid, update_running_mean};

/// Number of hex characters kept from the membership hash
const EVENT_ID_HASH_LEN: usize = 12;

/// Stable identifier of an event, derived from its founding members
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Hashes the sorted founding member ids, so the same founders always yield the same id.
    pub fn from_members<'a, I>(article_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids: Vec<&str> = article_ids.into_iter().collect();
        ids.sort_unstable();

        let mut hasher = Sha256::new();
        for id in ids {
            hasher.update(id.as_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        EventId(format!("event_{}", &hex[..EVENT_ID_HASH_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an event sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Candidate group still below `min_members`
    Forming,
    /// Promoted and recently updated
    Active,
    /// No new members within the retention window; still kept
    Dormant,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Forming => write!(f, "FORMING"),
            LifecycleState::Active => write!(f, "ACTIVE"),
            LifecycleState::Dormant => write!(f, "DORMANT"),
        }
    }
}

/// A cluster of articles covering one news story
///
/// Membership is append-only. The centroid always equals the mean of the
/// member embeddings; the display name is never stored and is derived from
/// the members on demand (see [`EventSnapshot::name`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    members: Vec<ArticleId>,
    centroid: Vec<f32>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    revision: u64,
}

impl Event {
    /// Builds an event from its founding members, or `None` when there are none.
    pub(crate) fn from_articles(members: &[&Article], revision: u64) -> Option<Self> {
        let first = members.first()?;
        let first_seen = members.iter().map(|a| a.published_at).min()?;
        let last_seen = members.iter().map(|a| a.published_at).max()?;
        let id = EventId::from_members(members.iter().map(|a| a.id.as_str()));

        Some(Event {
            id,
            members: members.iter().map(|a| a.id.clone()).collect(),
            centroid: if members.len() == 1 {
                first.embedding.clone()
            } else {
                centroid(members.iter().copied())
            },
            first_seen,
            last_seen,
            revision,
        })
    }

    /// Appends a member and folds its embedding into the centroid.
    pub(crate) fn absorb(&mut self, article: &Article, revision: u64) {
        update_running_mean(&mut self.centroid, &article.embedding, self.members.len());
        self.members.push(article.id.clone());
        self.first_seen = self.first_seen.min(article.published_at);
        self.last_seen = self.last_seen.max(article.published_at);
        self.revision = revision;
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Member ids in arrival order
    pub fn members(&self) -> &[ArticleId] {
        &self.members
    }

    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Registry sequence number of the last membership change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, article_id: &str) -> bool {
        self.members.iter().any(|m| m == article_id)
    }
}

/// An event together with its member articles, detached from the registry
///
/// Snapshots are owned, so per-event analysis can run on separate tasks once
/// clustering has settled.
#[derive(Debug, Clone)]
pub struct EventSnapshot {
    pub event: Event,
    pub members: Vec<Arc<Article>>,
}

impl EventSnapshot {
    pub fn id(&self) -> &EventId {
        self.event.id()
    }

    /// Derived label of the event's current membership
    pub fn name(&self) -> String {
        derive_name(self.members.iter().map(|a| a.as_ref()))
    }

    /// Members ordered by publication time, then id
    pub fn chronological(&self) -> Vec<Arc<Article>> {
        let mut sorted = self.members.clone();
        sorted.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        sorted
    }
}

/// Result of a batch clustering pass
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    pub events: Vec<Event>,
    /// Articles whose neighborhood was too sparse to join an event
    pub noise: Vec<ArticleId>,
    /// Articles skipped for zero-magnitude embeddings
    pub excluded: Vec<ArticleId>,
}

/// Aggregate figures about the current event set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatistics {
    pub total_events: usize,
    pub total_articles: usize,
    pub avg_articles_per_event: f64,
    pub largest_event_size: usize,
    pub largest_event_id: Option<EventId>,
    pub pending_candidates: usize,
    pub dormant_events: usize,
}
