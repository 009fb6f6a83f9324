use std::collections::{BTreeMap, BTreeSet};

use crate::article::Article;
use crate::entity::normalizer::{basic_normalize, display_case};
use crate::entity::EntityType;
use crate::text::{extract_keywords, rank_counts};

pub const NAME_SEPARATOR: &str = " - ";
pub const FALLBACK_EVENT_NAME: &str = "Geopolitical Event";
pub const MAX_NAME_CHARS: usize = 100;

/// Keywords considered per article when the provider supplied none
const TITLE_KEYWORDS_PER_ARTICLE: usize = 5;

/// Derives an event label from its current members.
///
/// The label joins the most mentioned person, the two most mentioned locations
/// and the top keyword shared by at least `max(2, n / 3)` members. Counts are
/// per article and ties resolve alphabetically, so the same member set always
/// produces the same name regardless of arrival order. Falls back to the two
/// most frequent title keywords, then to [`FALLBACK_EVENT_NAME`].
pub fn derive_name<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = &'a Article>,
{
    let members: Vec<&Article> = members.into_iter().collect();
    if members.is_empty() {
        return FALLBACK_EVENT_NAME.to_string();
    }

    let mut people: BTreeMap<String, usize> = BTreeMap::new();
    let mut locations: BTreeMap<String, usize> = BTreeMap::new();
    let mut keywords: BTreeMap<String, usize> = BTreeMap::new();

    for article in &members {
        let mut seen: BTreeSet<(EntityType, String)> = BTreeSet::new();
        for entity in &article.entities {
            let normalized = basic_normalize(&entity.name);
            if normalized.is_empty() {
                continue;
            }
            if !seen.insert((entity.entity_type, normalized.clone())) {
                continue;
            }
            match entity.entity_type {
                EntityType::Person => *people.entry(normalized).or_insert(0) += 1,
                EntityType::Location => *locations.entry(normalized).or_insert(0) += 1,
                _ => {}
            }
        }

        for keyword in article_keywords(article) {
            *keywords.entry(keyword).or_insert(0) += 1;
        }
    }

    let min_shared = 2.max(members.len() / 3);
    let mut parts: Vec<String> = Vec::new();

    if let Some((person, _)) = rank_counts(people, 1).into_iter().next() {
        parts.push(person);
    }
    for (location, _) in rank_counts(locations, 2) {
        parts.push(location);
    }
    let shared_keyword = rank_counts(keywords, usize::MAX)
        .into_iter()
        .take_while(|(_, count)| *count >= min_shared)
        .map(|(keyword, _)| keyword)
        .find(|keyword| !parts.contains(keyword));
    if let Some(keyword) = shared_keyword {
        parts.push(keyword);
    }

    if parts.is_empty() {
        let titles = members
            .iter()
            .map(|a| a.title.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        parts = extract_keywords(&titles, 2);
    }

    if parts.is_empty() {
        return FALLBACK_EVENT_NAME.to_string();
    }

    let name = parts
        .iter()
        .map(|p| display_case(p))
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);

    name.chars().take(MAX_NAME_CHARS).collect()
}

/// Distinct normalized keywords of one article
fn article_keywords(article: &Article) -> BTreeSet<String> {
    if article.keywords.is_empty() {
        extract_keywords(&article.title, TITLE_KEYWORDS_PER_ARTICLE)
            .into_iter()
            .collect()
    } else {
        article
            .keywords
            .iter()
            .map(|k| basic_normalize(k))
            .filter(|k| !k.is_empty())
            .collect()
    }
}
