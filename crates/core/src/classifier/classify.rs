//! Release-title classification.
//!
//! One free-text release title in, structured [`EpisodeInfo`] out. The rules
//! run in strict priority order and the whole thing is total: a title nobody
//! can make sense of yields an all-absent `EpisodeInfo`, never an error.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use super::patterns::*;
use super::types::{ContentType, EpisodeInfo};

/// Numbers never accepted as episode numbers: common resolution and frame
/// dimension literals. Overridable through
/// [`Classifier::with_excluded_numbers`] since the list is inherently
/// incomplete.
pub const DEFAULT_EXCLUDED_NUMBERS: [u32; 7] = [360, 480, 720, 1080, 1920, 2160, 4320];

static DEFAULT_CLASSIFIER: Lazy<Classifier> = Lazy::new(Classifier::new);

/// Classify a release title with the default numeric exclusion set.
pub fn classify(title: &str) -> EpisodeInfo {
    DEFAULT_CLASSIFIER.classify(title)
}

/// Derive a bare show name from a release title with the default classifier.
pub fn extract_bare_name(title: &str) -> String {
    DEFAULT_CLASSIFIER.extract_bare_name(title)
}

/// Title classifier with a configurable numeric exclusion set.
#[derive(Debug, Clone)]
pub struct Classifier {
    excluded_numbers: HashSet<u32>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            excluded_numbers: DEFAULT_EXCLUDED_NUMBERS.into_iter().collect(),
        }
    }

    /// Build a classifier with a custom exclusion set (resolution/aspect
    /// literals that must never be read as episode numbers).
    pub fn with_excluded_numbers(excluded: impl IntoIterator<Item = u32>) -> Self {
        Self {
            excluded_numbers: excluded.into_iter().collect(),
        }
    }

    /// Classify one release title. Pure and total.
    pub fn classify(&self, title: &str) -> EpisodeInfo {
        let title = preprocess(title);

        // Step 1: preview/trailer markers short-circuit all parsing.
        if PREVIEW_MARKERS.iter().any(|r| r.is_match(&title)) {
            return EpisodeInfo::of_type(ContentType::Preview);
        }

        // Step 2: movie vocabulary.
        if MOVIE_MARKERS.iter().any(|r| r.is_match(&title)) {
            let mut info = EpisodeInfo::of_type(ContentType::Movie);
            info.movie_number = MOVIE_NUMBER
                .captures(&title)
                .and_then(|c| c[1].parse().ok());
            info.year = self.extract_year(&title);
            return info;
        }

        // Step 3: special/OVA vocabulary.
        if SPECIAL_MARKERS.iter().any(|r| r.is_match(&title)) {
            let mut info = EpisodeInfo::of_type(ContentType::Special);
            info.special_number = SPECIAL_NUMBER
                .captures(&title)
                .and_then(|c| c[1].parse().ok());
            return info;
        }

        let mut info = EpisodeInfo::default();

        // Step 4: season extraction, independent of episode extraction.
        info.season = extract_season(&title);

        // Step 5: batch detection.
        if let Some(done) = self.detect_batch(&title, &mut info) {
            return done;
        }

        // Step 6: single-episode extraction. Season-qualified forms win over
        // season-less absolute forms.
        if let Some((season, episode)) = season_qualified_episode(&title) {
            info.season = Some(season);
            info.episode = Some(episode);
        } else if let Some(episode) = self.absolute_episode(&mask_season_tokens(&title)) {
            info.is_absolute = info.season.is_none();
            info.episode = Some(episode);
        }

        // A season token with no per-episode marker is a season pack.
        if info.episode.is_none() && info.season.is_some() {
            info.is_batch = true;
            info.content_type = ContentType::Batch;
        }

        info
    }

    /// Derive a bare show name: strip bracketed metadata, cut at the first
    /// season/episode marker, drop encoding tokens. Used by the show identity
    /// matcher.
    pub fn extract_bare_name(&self, title: &str) -> String {
        let title = preprocess(title);
        let no_brackets = BRACKET_GROUP.replace_all(&title, " ");

        // Cut at the earliest season/episode marker.
        let cut = earliest_marker_offset(&no_brackets)
            .map(|at| no_brackets[..at].to_string())
            .unwrap_or_else(|| no_brackets.into_owned());

        let cleaned = MEDIA_TOKEN.replace_all(&cut, " ");
        let cleaned = MULTI_SPACE.replace_all(&cleaned, " ");
        cleaned.trim_matches([' ', '-', '_', '~', ':', '.']).to_string()
    }

    fn detect_batch(&self, title: &str, info: &mut EpisodeInfo) -> Option<EpisodeInfo> {
        // Multi-season spans are never attributed to one season.
        for re in MULTI_SEASON.iter() {
            if re.is_match(title) {
                let mut out = info.clone();
                out.content_type = ContentType::Batch;
                out.is_batch = true;
                out.is_multi_season = true;
                out.season = None;
                return Some(out);
            }
        }

        // Explicit season + episode range: unambiguous, any ascending span.
        if let Some(caps) = SEASON_EPISODE_RANGE.captures(title) {
            let season: Option<u32> = caps[1].parse().ok();
            let start: Option<u32> = caps[2].parse().ok();
            let end: Option<u32> = caps[3].parse().ok();
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    let mut out = info.clone();
                    out.content_type = ContentType::Batch;
                    out.is_batch = true;
                    out.season = season.or(out.season);
                    out.batch_range = Some((start, end));
                    return Some(out);
                }
            }
        }

        // Bare numeric range: only believable within guarded bounds,
        // otherwise it is a coincidental pair of numbers.
        if let Some(caps) = NUMERIC_RANGE.captures(title) {
            let start: Option<u32> = caps[1].parse().ok();
            let end: Option<u32> = caps[2].parse().ok();
            if let (Some(start), Some(end)) = (start, end) {
                if plausible_batch_range(start, end) {
                    let mut out = info.clone();
                    out.content_type = ContentType::Batch;
                    out.is_batch = true;
                    out.batch_range = Some((start, end));
                    return Some(out);
                }
            }
        }

        if BATCH_VOCAB.iter().any(|r| r.is_match(title)) {
            let mut out = info.clone();
            out.content_type = ContentType::Batch;
            out.is_batch = true;
            return Some(out);
        }

        None
    }

    /// Absolute episode forms in decreasing order of confidence. Every
    /// candidate is guarded against resolution literals and year-looking
    /// numbers.
    fn absolute_episode(&self, title: &str) -> Option<u32> {
        let rules: [&Lazy<regex_lite::Regex>; 7] = [
            &DASH_EPISODE,
            &EPISODE_WORD,
            &EPISODE_CJK,
            &BRACKET_EPISODE,
            &DELIMITED_EPISODE,
            &E_PREFIX_EPISODE,
            &TRAILING_EPISODE,
        ];

        for re in rules {
            if let Some(n) = re.captures(title).and_then(|c| c[1].parse::<u32>().ok()) {
                if !self.is_guarded_number(n) {
                    return Some(n);
                }
            }
        }
        None
    }

    fn is_guarded_number(&self, n: u32) -> bool {
        self.excluded_numbers.contains(&n) || looks_like_year(n)
    }

    fn extract_year(&self, title: &str) -> Option<u32> {
        YEAR_TOKEN
            .captures(title)
            .and_then(|c| c[1].parse::<u32>().ok())
            .filter(|n| !self.excluded_numbers.contains(n))
    }
}

fn looks_like_year(n: u32) -> bool {
    (1900..=2100).contains(&n)
}

/// A bare numeric range is a believable episode range only when ascending,
/// spanning at least 2 and at most 150 episodes, with neither bound being a
/// frame dimension literal.
fn plausible_batch_range(start: u32, end: u32) -> bool {
    start < end
        && (2..=150).contains(&(end - start))
        && start != 1920
        && start != 1080
        && end != 1920
        && end != 1080
}

fn preprocess(raw: &str) -> String {
    let mut title = raw.trim().replace('\n', " ");
    title = title.replace('【', "[").replace('】', "]").replace('～', "~");
    let title = VIDEO_EXTENSION.replace(&title, "");
    TECH_SPECS.replace_all(&title, "").into_owned()
}

fn extract_season(title: &str) -> Option<u32> {
    if let Some(caps) = SEASON_WORD.captures(title) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = SEASON_ORDINAL.captures(title) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = SEASON_SHORT.captures(title) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = SEASON_CJK.captures(title) {
        let token = &caps[1];
        return token
            .parse()
            .ok()
            .or_else(|| CJK_NUMBERS.get(token).copied());
    }
    if let Some(caps) = SEASON_ROMAN.captures(title) {
        return roman_to_u32(&caps[1]);
    }
    None
}

/// Copy of the title with every season token blanked to spaces, so a season
/// number ending the title cannot be re-read as a bare episode number. The
/// season-qualified patterns must keep seeing the original title; only the
/// absolute rules run against the masked copy.
fn mask_season_tokens(title: &str) -> String {
    let rules: [&Lazy<regex_lite::Regex>; 5] = [
        &SEASON_WORD,
        &SEASON_ORDINAL,
        &SEASON_SHORT,
        &SEASON_CJK,
        &SEASON_ROMAN,
    ];

    let mut masked = title.to_string();
    for re in rules {
        let spans: Vec<_> = re.find_iter(&masked).map(|m| m.range()).collect();
        for span in spans {
            let blank = " ".repeat(span.len());
            masked.replace_range(span, &blank);
        }
    }
    masked
}

fn season_qualified_episode(title: &str) -> Option<(u32, u32)> {
    for re in [&SEASON_EP_PAIR, &SEASON_X_EP, &SEASON_WORD_EP, &SEASON_DASH_EP] {
        if let Some(caps) = re.captures(title) {
            let season = caps[1].parse().ok();
            let episode = caps[2].parse().ok();
            if let (Some(season), Some(episode)) = (season, episode) {
                return Some((season, episode));
            }
        }
    }
    None
}

/// Byte offset of the earliest season/episode marker in a title, if any.
fn earliest_marker_offset(title: &str) -> Option<usize> {
    let markers: [&Lazy<regex_lite::Regex>; 10] = [
        &SEASON_EP_PAIR,
        &SEASON_X_EP,
        &SEASON_WORD,
        &SEASON_ORDINAL,
        &SEASON_SHORT,
        &SEASON_CJK,
        &SEASON_EPISODE_RANGE,
        &DASH_EPISODE,
        &EPISODE_WORD,
        &EPISODE_CJK,
    ];

    markers
        .iter()
        .filter_map(|re| re.find(title).map(|m| m.start()))
        .min()
}
