use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

/// Urgency lexicon, grouped the way the terms tend to appear in coverage
pub const URGENCY_PATTERNS: &[&str] = &[
    r"(?i)\b(imminent|urgent|immediate|breaking|crisis|emergency)\b",
    r"(?i)\b(threat\w*|warn\w*)\b",
    r"(?i)\b(escalat\w+|intensif\w+)\b",
    r"(?i)\b(deadline|ultimatum)\b",
    r"(?i)\b(critical|crucial|vital)\b",
];

lazy_static! {
    static ref URGENCY_REGEXES: Vec<Regex> = URGENCY_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
}

/// Every urgency term occurrence in `text`, lowercased, in pattern order
pub fn urgency_terms(text: &str) -> Vec<String> {
    URGENCY_REGEXES
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_lowercase()))
        .collect()
}

pub fn urgency_hits(text: &str) -> usize {
    URGENCY_REGEXES
        .iter()
        .map(|re| re.find_iter(text).count())
        .sum()
}

/// Urgency hits per article over a set of texts
pub fn urgency_rate<'a, I>(texts: I) -> f32
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hits = 0usize;
    let mut articles = 0usize;
    for text in texts {
        hits += urgency_hits(text);
        articles += 1;
    }
    if articles == 0 {
        0.0
    } else {
        hits as f32 / articles as f32
    }
}

/// Distinct urgency terms across texts, alphabetically
pub fn distinct_terms<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .flat_map(urgency_terms)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
