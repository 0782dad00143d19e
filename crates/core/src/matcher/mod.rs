//! Show identity matching.
//!
//! Scores a release title against an expected show name plus alternate
//! names. Release titles of sequels and spin-offs are textually very close to
//! the parent show, so plain substring/fuzzy matching produces dangerous
//! false positives - hence the explicit spinoff-indicator veto on top of the
//! usual containment/edit-distance/word-overlap ladder.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::classifier::extract_bare_name;

/// Accept threshold used when no stricter context applies.
pub const DEFAULT_MATCH_THRESHOLD: u8 = 60;

/// Accept threshold after an identifier-based cross-check was attempted and
/// failed: be more conservative, text is all we have and it already let us
/// down once.
pub const STRICT_MATCH_THRESHOLD: u8 = 75;

/// Trailing words after an otherwise-matching show name that signal a
/// different, related show rather than the requested one.
const SPINOFF_INDICATORS: &[&str] = &[
    "shippuden",
    "kai",
    "brotherhood",
    "gaiden",
    "vigilantes",
    "next generations",
    "super",
    "gt",
    "z",
    "crystal",
    "after story",
    "zero",
    "shin",
];

/// Why a title scored the way it did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    ExactMatch,
    ContainsExactEnd,
    SpinoffDetected,
    ContainsWithExtra,
    ShortenedTitle,
    HighSimilarity,
    FuzzyMatch,
    WordMatch,
    NoMatch,
    EmptyExtraction,
}

/// Result of scoring one release title against a show identity.
///
/// A score of 90+ means the extracted name is a near-verbatim match of an
/// accepted name. A `SpinoffDetected` result is a hard reject regardless of
/// the caller's threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowMatchResult {
    /// Match confidence, 0-100.
    pub score: u8,
    /// Which rule produced the score.
    pub reason: MatchReason,
    /// The bare show name extracted from the release title.
    pub extracted_name: String,
}

/// Score a release title against the expected show name and its alternates.
pub fn score_title(title: &str, expected: &str, alternates: &[String]) -> ShowMatchResult {
    let extracted = extract_bare_name(title);
    if extracted.is_empty() {
        return ShowMatchResult {
            score: 0,
            reason: MatchReason::EmptyExtraction,
            extracted_name: extracted,
        };
    }

    let extracted_norm = normalize_name(&extracted);
    let accepted: Vec<String> = std::iter::once(expected)
        .chain(alternates.iter().map(String::as_str))
        .map(normalize_name)
        .filter(|n| !n.is_empty())
        .collect();

    if accepted.is_empty() {
        return ShowMatchResult {
            score: 0,
            reason: MatchReason::EmptyExtraction,
            extracted_name: extracted,
        };
    }

    // Exact match of normalized names.
    if accepted.iter().any(|a| *a == extracted_norm) {
        return ShowMatchResult {
            score: 100,
            reason: MatchReason::ExactMatch,
            extracted_name: extracted,
        };
    }

    // Containment, with the spinoff veto on whatever trails the match.
    if let Some((score, reason)) = containment_score(&extracted_norm, &accepted) {
        return ShowMatchResult {
            score,
            reason,
            extracted_name: extracted,
        };
    }

    // Edit-distance similarity against every accepted name.
    let best_similarity = accepted
        .iter()
        .map(|a| similarity(&extracted_norm, a))
        .fold(0.0f32, f32::max);

    if best_similarity >= 0.85 {
        return ShowMatchResult {
            score: ((best_similarity * 100.0) as u8).min(88),
            reason: MatchReason::HighSimilarity,
            extracted_name: extracted,
        };
    }
    if best_similarity >= 0.6 {
        return ShowMatchResult {
            score: (best_similarity * 100.0) as u8,
            reason: MatchReason::FuzzyMatch,
            extracted_name: extracted,
        };
    }

    // Last resort: overlap of significant words.
    let best_overlap = accepted
        .iter()
        .map(|a| word_overlap(&extracted_norm, a))
        .fold(0.0f32, f32::max);

    if best_overlap > 0.0 {
        return ShowMatchResult {
            score: ((best_overlap * 70.0) as u8).min(70),
            reason: MatchReason::WordMatch,
            extracted_name: extracted,
        };
    }

    ShowMatchResult {
        score: 0,
        reason: MatchReason::NoMatch,
        extracted_name: extracted,
    }
}

/// Threshold wrapper around [`score_title`].
pub fn validate_title(
    title: &str,
    expected: &str,
    alternates: &[String],
    threshold: u8,
) -> bool {
    let result = score_title(title, expected, alternates);
    if result.reason == MatchReason::SpinoffDetected {
        return false;
    }
    result.score >= threshold
}

fn containment_score(extracted: &str, accepted: &[String]) -> Option<(u8, MatchReason)> {
    let mut best: Option<(u8, MatchReason)> = None;

    for name in accepted {
        if let Some(pos) = extracted.find(name.as_str()) {
            let trailing = extracted[pos + name.len()..].trim();

            let candidate = if trailing.is_empty() {
                (98, MatchReason::ContainsExactEnd)
            } else if starts_with_spinoff_indicator(trailing) {
                (20, MatchReason::SpinoffDetected)
            } else {
                // Penalty grows with the amount of trailing text.
                let penalty = (trailing.len() as u8).saturating_mul(2).min(38);
                (98 - penalty, MatchReason::ContainsWithExtra)
            };

            // A spinoff veto on any accepted name wins over a softer match
            // against another.
            if candidate.1 == MatchReason::SpinoffDetected {
                return Some(candidate);
            }
            if best.map(|(s, _)| candidate.0 > s).unwrap_or(true) {
                best = Some(candidate);
            }
        } else if name.contains(extracted)
            && extracted.len() >= 5
            && extracted.len() * 2 >= name.len()
        {
            // Release uses a shortened form of the accepted name.
            let candidate = (85, MatchReason::ShortenedTitle);
            if best.map(|(s, _)| candidate.0 > s).unwrap_or(true) {
                best = Some(candidate);
            }
        }
    }

    best
}

fn starts_with_spinoff_indicator(trailing: &str) -> bool {
    SPINOFF_INDICATORS.iter().any(|ind| {
        trailing == *ind || trailing.starts_with(&format!("{ind} "))
    })
}

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static SEASON_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:season ?\d{1,2}|\d{1,2}(?:st|nd|rd|th) ?season|part ?\d{1,2}|cour ?\d{1,2})\s*$",
    )
    .unwrap()
});
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Case-fold, drop punctuation, drop leading articles, strip season/ordinal
/// suffixes.
fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let no_punct = NON_ALNUM.replace_all(&lower, " ");
    let no_season = SEASON_SUFFIX.replace(no_punct.trim(), "");
    let collapsed = MULTI_SPACE.replace_all(no_season.trim(), " ");

    let mut out = collapsed.into_owned();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = out.strip_prefix(article) {
            out = rest.to_string();
            break;
        }
    }
    out.trim().to_string()
}

/// Normalized edit-distance similarity in [0, 1].
fn similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein_distance(a, b) as f32 / max_len as f32
}

/// Plain DP Levenshtein over chars.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *val = j;
    }

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if *a_char == *b_char { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[a_len][b_len]
}

/// Fraction of the accepted name's significant words (length > 2) present in
/// the extracted name.
fn word_overlap(extracted: &str, accepted: &str) -> f32 {
    let extracted_words: HashSet<&str> = extracted.split_whitespace().collect();
    let significant: Vec<&str> = accepted
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .collect();

    if significant.is_empty() {
        return 0.0;
    }

    let matched = significant
        .iter()
        .filter(|w| extracted_words.contains(**w))
        .count();

    matched as f32 / significant.len() as f32
}
