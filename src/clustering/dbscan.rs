use std::borrow::Borrow;
use std::collections::VecDeque;
use tracing::{debug, info, trace, warn};

use crate::article::Article;
use crate::clustering::types::{ClusterOutcome, Event};
use crate::error::ClusterError;
use crate::vector::{is_degenerate, magnitude};
use crate::TARGET_CLUSTER;

/// Slack on the neighborhood radius to absorb f32 rounding in the dot product
const RADIUS_TOLERANCE: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Groups articles into events with density-based clustering over cosine distance.
///
/// Neighborhood radius is `1 - similarity_threshold` and a point is a core point
/// when its neighborhood (itself included) holds at least `min_members` articles.
/// Points are visited in input order, so a border point reachable from two
/// clusters joins the first one that reaches it. Any cluster left with fewer
/// than `min_members` articles is returned to noise.
///
/// # Returns
/// * `Ok(ClusterOutcome)` - Events sorted by size (largest first), plus noise and excluded ids
/// * `Err(ClusterError::InvalidEmbeddingDimension)` - If embeddings differ in length
pub fn cluster<A>(
    articles: &[A],
    similarity_threshold: f32,
    min_members: usize,
) -> Result<ClusterOutcome, ClusterError>
where
    A: Borrow<Article>,
{
    let min_members = min_members.max(1);
    let mut outcome = ClusterOutcome::default();

    if articles.is_empty() {
        return Ok(outcome);
    }

    validate_dimensions(articles)?;

    let mut usable: Vec<&Article> = Vec::with_capacity(articles.len());
    for article in articles.iter().map(|a| a.borrow()) {
        if is_degenerate(&article.embedding) {
            warn!(
                target: TARGET_CLUSTER,
                "Excluding article {} from clustering: zero-magnitude embedding", article.id
            );
            outcome.excluded.push(article.id.clone());
        } else {
            usable.push(article);
        }
    }

    if usable.len() < min_members {
        info!(
            target: TARGET_CLUSTER,
            "Insufficient data: {} usable articles, {} required for an event",
            usable.len(),
            min_members
        );
        outcome.noise = usable.iter().map(|a| a.id.clone()).collect();
        return Ok(outcome);
    }

    info!(
        target: TARGET_CLUSTER,
        "Clustering {} articles (threshold={:.2}, min_members={})",
        usable.len(),
        similarity_threshold,
        min_members
    );

    let unit_vectors: Vec<Vec<f32>> = usable
        .iter()
        .map(|a| {
            let mag = magnitude(&a.embedding);
            a.embedding.iter().map(|x| x / mag).collect()
        })
        .collect();
    let radius = (1.0 - similarity_threshold).max(0.0) + RADIUS_TOLERANCE;

    let region = |i: usize| -> Vec<usize> {
        (0..unit_vectors.len())
            .filter(|&j| {
                let dot: f32 = unit_vectors[i]
                    .iter()
                    .zip(unit_vectors[j].iter())
                    .map(|(a, b)| a * b)
                    .sum();
                let distance = 1.0 - dot.clamp(-1.0, 1.0);
                trace!(target: TARGET_CLUSTER, "distance({}, {}) = {:.4}", i, j, distance);
                distance <= radius
            })
            .collect()
    };

    let mut labels = vec![Label::Unvisited; usable.len()];
    let mut cluster_count = 0usize;

    for i in 0..usable.len() {
        if labels[i] != Label::Unvisited {
            continue;
        }

        let neighbors = region(i);
        if neighbors.len() < min_members {
            labels[i] = Label::Noise;
            continue;
        }

        let cluster_id = cluster_count;
        cluster_count += 1;
        labels[i] = Label::Cluster(cluster_id);

        let mut queue: VecDeque<usize> = neighbors.into_iter().filter(|&j| j != i).collect();
        while let Some(j) = queue.pop_front() {
            match labels[j] {
                Label::Noise => {
                    // Border point: joins the cluster but is not expanded
                    labels[j] = Label::Cluster(cluster_id);
                    continue;
                }
                Label::Cluster(_) => continue,
                Label::Unvisited => labels[j] = Label::Cluster(cluster_id),
            }

            let expansion = region(j);
            if expansion.len() >= min_members {
                queue.extend(
                    expansion
                        .into_iter()
                        .filter(|&k| matches!(labels[k], Label::Unvisited | Label::Noise)),
                );
            }
        }
    }

    let mut groups: Vec<Vec<&Article>> = vec![Vec::new(); cluster_count];
    for (idx, label) in labels.iter().enumerate() {
        match label {
            Label::Cluster(c) => groups[*c].push(usable[idx]),
            _ => outcome.noise.push(usable[idx].id.clone()),
        }
    }

    for mut members in groups {
        if members.len() < min_members {
            debug!(
                target: TARGET_CLUSTER,
                "Dropping undersized cluster of {} articles to noise",
                members.len()
            );
            outcome.noise.extend(members.iter().map(|a| a.id.clone()));
            continue;
        }
        members.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(event) = Event::from_articles(&members, 0) {
            outcome.events.push(event);
        }
    }

    outcome
        .events
        .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.id().cmp(b.id())));

    info!(
        target: TARGET_CLUSTER,
        "Created {} events; {} noise articles, {} excluded",
        outcome.events.len(),
        outcome.noise.len(),
        outcome.excluded.len()
    );

    Ok(outcome)
}

/// Fails fast unless every article shares the first article's embedding length.
pub(crate) fn validate_dimensions<A>(articles: &[A]) -> Result<(), ClusterError>
where
    A: Borrow<Article>,
{
    let Some(first) = articles.first() else {
        return Ok(());
    };
    let expected = first.borrow().dimension();
    for article in articles.iter().map(|a| a.borrow()) {
        if article.dimension() != expected {
            return Err(ClusterError::InvalidEmbeddingDimension {
                article_id: article.id.clone(),
                expected,
                found: article.dimension(),
            });
        }
    }
    Ok(())
}
