//! Tokenization helpers shared by naming and rhetoric analysis

use lazy_static::lazy_static;
use std::collections::{BTreeMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Shortest token considered a keyword
const MIN_KEYWORD_LENGTH: usize = 4;

lazy_static! {
    pub static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
        "does", "did", "will", "would", "could", "should", "may", "might", "must", "can",
        "that", "this", "these", "those", "it", "its", "he", "she", "they", "them", "their",
        "his", "her", "after", "over", "into", "about", "says", "said", "new", "more", "than",
        "amid", "also", "while", "what", "when", "which", "who", "not", "no", "up", "out",
    ]
    .into_iter()
    .collect();
}

/// Lowercased word tokens (Unicode word boundaries, punctuation dropped)
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Frequency-ranked keywords: tokens of four or more characters that are not
/// stop words or numbers. Ties are broken alphabetically.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for token in tokenize(text) {
        if token.chars().count() < MIN_KEYWORD_LENGTH
            || is_stop_word(&token)
            || token.chars().all(|c| c.is_numeric())
        {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }
    rank_counts(counts, top_n)
        .into_iter()
        .map(|(word, _)| word)
        .collect()
}

/// Counts bigrams of adjacent tokens, skipping any pair that contains a stop word.
pub fn bigram_counts<'a, I>(texts: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for text in texts {
        let tokens = tokenize(text);
        for pair in tokens.windows(2) {
            if is_stop_word(&pair[0]) || is_stop_word(&pair[1]) {
                continue;
            }
            *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }
    }
    counts
}

/// Sorts a frequency table by count descending, then key ascending, keeping `limit` entries.
pub fn rank_counts(counts: BTreeMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // Stable sort keeps the BTreeMap's alphabetical order among equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_punctuation() {
        assert_eq!(
            tokenize("Troops mass, border tense!"),
            vec!["troops", "mass", "border", "tense"]
        );
    }

    #[test]
    fn test_keywords_ranked_by_frequency() {
        let keywords = extract_keywords(
            "Border talks collapse. Border troops mobilise as talks collapse at the border",
            3,
        );
        assert_eq!(keywords, vec!["border", "collapse", "talks"]);
    }

    #[test]
    fn test_bigrams_skip_stop_words() {
        let counts = bigram_counts(["naval blockade of the strait", "naval blockade tightens"]);
        assert_eq!(counts.get("naval blockade"), Some(&2));
        assert!(!counts.contains_key("of the"));
        assert!(!counts.contains_key("blockade of"));
        assert_eq!(counts.get("blockade tightens"), Some(&1));
    }
}
