use super::iso_index::{IsoIndex, SubdivisionEntry};
use super::normalize::normalize;
use itertools::Itertools;
use strsim::normalized_levenshtein;

pub const DEFAULT_THRESHOLD: i32 = 85;

const FALLBACK_LIMIT: usize = 3;
const BIAS: i32 = 5;
const BROAD_KEYWORDS: [&str; 5] = ["region", "province", "state", "governorate", "metropolitan"];
const FINE_KEYWORDS: [&str; 3] = ["district", "county", "municipality"];

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub iso_code: String,
    pub name: String,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// At least one subdivision cleared the threshold after bias.
    Confident,
    /// Nothing cleared the threshold; top unbiased guesses instead.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionMatches {
    pub kind: MatchKind,
    pub candidates: Vec<MatchCandidate>,
}

impl RegionMatches {
    pub fn best(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }
}

pub fn match_region(index: &IsoIndex, query_name: &str, country_iso2: &str, threshold: i32) -> RegionMatches {
    match_entries(index.entries_for_country(country_iso2), query_name, threshold)
}

pub fn match_entries(entries: &[SubdivisionEntry], query_name: &str, threshold: i32) -> RegionMatches {
    let query = normalize(query_name);
    if query.is_empty() || entries.is_empty() {
        return RegionMatches {
            kind: MatchKind::BestEffort,
            candidates: Vec::new(),
        };
    }

    let mut scored = entries
        .iter()
        .filter_map(|entry| {
            let comparison = comparison_string(entry);
            let score = biased(token_sort_ratio(&query, &comparison), &comparison);
            (score >= threshold).then(|| MatchCandidate {
                iso_code: entry.iso_code.clone(),
                name: entry.primary_name.trim().to_string(),
                score,
            })
        })
        .collect::<Vec<MatchCandidate>>();

    if !scored.is_empty() {
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        return RegionMatches {
            kind: MatchKind::Confident,
            candidates: scored,
        };
    }

    tracing::debug!(
        "No subdivision of {} reached {} for '{}', using best-effort ranking",
        entries[0].iso_code.split('-').next().unwrap_or(""),
        threshold,
        query_name
    );
    let candidates = entries
        .iter()
        .map(|entry| MatchCandidate {
            iso_code: entry.iso_code.clone(),
            name: entry.primary_name.trim().to_string(),
            score: scaled(token_sort_ratio(&query, &normalize(&entry.primary_name))),
        })
        .sorted_by(|a, b| b.score.cmp(&a.score))
        .take(FALLBACK_LIMIT)
        .collect();

    RegionMatches {
        kind: MatchKind::BestEffort,
        candidates,
    }
}

fn comparison_string(entry: &SubdivisionEntry) -> String {
    std::iter::once(&entry.primary_name)
        .chain(entry.alternate_names.iter())
        .map(|name| normalize(name))
        .filter(|name| !name.is_empty())
        .join(" ")
}

fn biased(ratio: f64, comparison: &str) -> i32 {
    let mut bonus = 0;
    if BROAD_KEYWORDS.iter().any(|k| comparison.contains(k)) {
        bonus += BIAS;
    }
    if FINE_KEYWORDS.iter().any(|k| comparison.contains(k)) {
        bonus -= BIAS;
    }

    scaled(ratio + bonus as f64)
}

fn scaled(score: f64) -> i32 {
    (score as i32).clamp(0, 100)
}

/// Similarity in 0..=100 of the two strings with their whitespace tokens
/// sorted, so word order does not matter.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    100.0 * normalized_levenshtein(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(s: &str) -> String {
    s.split_whitespace().sorted().join(" ")
}
