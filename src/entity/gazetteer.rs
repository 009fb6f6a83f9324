//! Gazetteer of geopolitical actors
//!
//! Resolves extracted entity names to canonical countries, leaders and
//! organizations. Lookups try the alias table first and fall back to
//! Jaro-Winkler matching for longer names, so transliteration variants such as
//! "Zelenskyy" still resolve.

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use strsim::jaro_winkler;
use tracing::debug;

use super::normalizer::basic_normalize;
use super::types::{Actor, ActorKind, Entity, EntityType};
use super::TARGET_ENTITY;

/// Minimum Jaro-Winkler score for a fuzzy gazetteer hit
const FUZZY_THRESHOLD: f64 = 0.93;

/// Names shorter than this only match exactly ("un", "eu", "xi")
const FUZZY_MIN_LENGTH: usize = 5;

// (alias, canonical, kind)
const BUILTIN_ACTORS: &[(&str, &str, ActorKind)] = &[
    ("china", "china", ActorKind::Country),
    ("prc", "china", ActorKind::Country),
    ("russia", "russia", ActorKind::Country),
    ("russian federation", "russia", ActorKind::Country),
    ("united states", "united states", ActorKind::Country),
    ("united states of america", "united states", ActorKind::Country),
    ("usa", "united states", ActorKind::Country),
    ("us", "united states", ActorKind::Country),
    ("america", "united states", ActorKind::Country),
    ("iran", "iran", ActorKind::Country),
    ("israel", "israel", ActorKind::Country),
    ("ukraine", "ukraine", ActorKind::Country),
    ("taiwan", "taiwan", ActorKind::Country),
    ("india", "india", ActorKind::Country),
    ("pakistan", "pakistan", ActorKind::Country),
    ("north korea", "north korea", ActorKind::Country),
    ("dprk", "north korea", ActorKind::Country),
    ("south korea", "south korea", ActorKind::Country),
    ("japan", "japan", ActorKind::Country),
    ("germany", "germany", ActorKind::Country),
    ("france", "france", ActorKind::Country),
    ("britain", "united kingdom", ActorKind::Country),
    ("united kingdom", "united kingdom", ActorKind::Country),
    ("uk", "united kingdom", ActorKind::Country),
    ("turkey", "turkey", ActorKind::Country),
    ("turkiye", "turkey", ActorKind::Country),
    ("syria", "syria", ActorKind::Country),
    ("iraq", "iraq", ActorKind::Country),
    ("afghanistan", "afghanistan", ActorKind::Country),
    ("greenland", "greenland", ActorKind::Country),
    ("palestine", "palestine", ActorKind::Country),
    ("saudi arabia", "saudi arabia", ActorKind::Country),
    ("yemen", "yemen", ActorKind::Country),
    ("venezuela", "venezuela", ActorKind::Country),
    ("philippines", "philippines", ActorKind::Country),
    ("vietnam", "vietnam", ActorKind::Country),
    ("trump", "trump", ActorKind::Leader),
    ("donald trump", "trump", ActorKind::Leader),
    ("biden", "biden", ActorKind::Leader),
    ("joe biden", "biden", ActorKind::Leader),
    ("xi", "xi jinping", ActorKind::Leader),
    ("xi jinping", "xi jinping", ActorKind::Leader),
    ("putin", "putin", ActorKind::Leader),
    ("vladimir putin", "putin", ActorKind::Leader),
    ("modi", "modi", ActorKind::Leader),
    ("narendra modi", "modi", ActorKind::Leader),
    ("macron", "macron", ActorKind::Leader),
    ("emmanuel macron", "macron", ActorKind::Leader),
    ("scholz", "scholz", ActorKind::Leader),
    ("erdogan", "erdogan", ActorKind::Leader),
    ("recep tayyip erdogan", "erdogan", ActorKind::Leader),
    ("netanyahu", "netanyahu", ActorKind::Leader),
    ("benjamin netanyahu", "netanyahu", ActorKind::Leader),
    ("zelensky", "zelensky", ActorKind::Leader),
    ("volodymyr zelensky", "zelensky", ActorKind::Leader),
    ("kim jong un", "kim jong un", ActorKind::Leader),
    ("maduro", "maduro", ActorKind::Leader),
    ("nato", "nato", ActorKind::Organization),
    ("un", "united nations", ActorKind::Organization),
    ("united nations", "united nations", ActorKind::Organization),
    ("eu", "european union", ActorKind::Organization),
    ("european union", "european union", ActorKind::Organization),
    ("brics", "brics", ActorKind::Organization),
    ("who", "who", ActorKind::Organization),
    ("wto", "wto", ActorKind::Organization),
    ("imf", "imf", ActorKind::Organization),
    ("opec", "opec", ActorKind::Organization),
    ("iaea", "iaea", ActorKind::Organization),
    ("hamas", "hamas", ActorKind::Organization),
    ("hezbollah", "hezbollah", ActorKind::Organization),
];

lazy_static! {
    static ref DEFAULT_GAZETTEER: Gazetteer = {
        let mut gazetteer = Gazetteer::empty();
        for (alias, canonical, kind) in BUILTIN_ACTORS {
            gazetteer.insert(alias, canonical, *kind);
        }
        gazetteer
    };
}

#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    // normalized alias -> canonical actor
    entries: BTreeMap<String, Actor>,
}

impl Gazetteer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in table of major countries, leaders and international organizations
    pub fn builtin() -> Self {
        DEFAULT_GAZETTEER.clone()
    }

    pub fn insert(&mut self, alias: &str, canonical: &str, kind: ActorKind) {
        self.entries.insert(
            basic_normalize(alias),
            Actor {
                name: basic_normalize(canonical),
                kind,
            },
        );
    }

    pub fn with_actor(mut self, alias: &str, canonical: &str, kind: ActorKind) -> Self {
        self.insert(alias, canonical, kind);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a raw name to a known actor.
    pub fn lookup(&self, name: &str) -> Option<&Actor> {
        let normalized = basic_normalize(name);
        if normalized.is_empty() {
            return None;
        }

        if let Some(actor) = self.entries.get(&normalized) {
            return Some(actor);
        }

        if normalized.chars().count() < FUZZY_MIN_LENGTH {
            return None;
        }

        // BTreeMap order makes equal scores resolve to the alphabetically first alias
        let mut best: Option<(f64, &Actor)> = None;
        for (alias, actor) in &self.entries {
            if alias.chars().count() < FUZZY_MIN_LENGTH {
                continue;
            }
            let score = jaro_winkler(&normalized, alias);
            if score >= FUZZY_THRESHOLD && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, actor));
            }
        }

        if let Some((score, actor)) = best {
            debug!(
                target: TARGET_ENTITY,
                "Fuzzy gazetteer match '{}' -> '{}' ({:.3})", name, actor.name, score
            );
        }

        best.map(|(_, actor)| actor)
    }

    /// Resolves an extracted entity, ignoring types that can never be actors.
    pub fn resolve(&self, entity: &Entity) -> Option<&Actor> {
        match entity.entity_type {
            EntityType::Date | EntityType::Product | EntityType::Event => None,
            _ => self.lookup(&entity.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lookup() {
        let gazetteer = Gazetteer::builtin();
        let actor = gazetteer.lookup("USA").expect("usa should resolve");
        assert_eq!(actor.name, "united states");
        assert_eq!(actor.kind, ActorKind::Country);

        let actor = gazetteer.lookup("Vladimir Putin").unwrap();
        assert_eq!(actor.name, "putin");
        assert_eq!(actor.kind, ActorKind::Leader);

        assert_eq!(gazetteer.lookup("NATO").unwrap().kind, ActorKind::Organization);
    }

    #[test]
    fn test_fuzzy_lookup() {
        let gazetteer = Gazetteer::builtin();
        assert_eq!(gazetteer.lookup("Zelenskyy").unwrap().name, "zelensky");
        assert_eq!(gazetteer.lookup("Netanyahou").unwrap().name, "netanyahu");
    }

    #[test]
    fn test_short_names_require_exact_match() {
        let gazetteer = Gazetteer::builtin();
        assert!(gazetteer.lookup("ui").is_none());
        assert!(gazetteer.lookup("Acme Widgets").is_none());
        assert!(gazetteer.lookup("").is_none());
    }

    #[test]
    fn test_resolve_skips_non_actor_types() {
        let gazetteer = Gazetteer::builtin();
        assert!(gazetteer
            .resolve(&Entity::new("Russia", EntityType::Location))
            .is_some());
        assert!(gazetteer
            .resolve(&Entity::new("Russia", EntityType::Date))
            .is_none());
    }

    #[test]
    fn test_custom_entries() {
        let gazetteer = Gazetteer::empty().with_actor("ASEAN", "asean", ActorKind::Organization);
        assert_eq!(gazetteer.len(), 1);
        assert_eq!(gazetteer.lookup("asean").unwrap().kind, ActorKind::Organization);
        assert!(gazetteer.lookup("Russia").is_none());
    }
}
