use crate::rhetoric::types::{KeyPhrase, Window};
use crate::text::{bigram_counts, rank_counts};

/// Phrases kept per window
pub const KEY_PHRASE_LIMIT: usize = 10;

/// A current phrase at least this many times as frequent as before counts as new
pub const NEW_PHRASE_GROWTH_RATIO: usize = 3;

/// Top bigrams of each window, initial window first.
///
/// Current-window phrases are compared against the full initial frequency
/// table, not just its top entries, so a phrase that merely fell outside the
/// initial top list is not reported as new.
pub fn key_phrases(initial: &[String], current: &[String]) -> Vec<KeyPhrase> {
    let initial_counts = bigram_counts(initial.iter().map(|s| s.as_str()));
    let current_counts = bigram_counts(current.iter().map(|s| s.as_str()));

    let mut phrases: Vec<KeyPhrase> = rank_counts(initial_counts.clone(), KEY_PHRASE_LIMIT)
        .into_iter()
        .map(|(phrase, frequency)| KeyPhrase {
            phrase,
            frequency,
            window: Window::Initial,
            is_new: false,
        })
        .collect();

    for (phrase, frequency) in rank_counts(current_counts, KEY_PHRASE_LIMIT) {
        let before = initial_counts.get(&phrase).copied().unwrap_or(0);
        let is_new = before == 0 || frequency >= NEW_PHRASE_GROWTH_RATIO * before;
        phrases.push(KeyPhrase {
            phrase,
            frequency,
            window: Window::Current,
            is_new,
        });
    }

    phrases
}
