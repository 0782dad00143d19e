//! Compiled pattern tables for release-title classification.
//!
//! The classifier is an ordered rule list; every rule's pattern lives here as
//! a lazily-compiled static so individual rules stay testable and the tables
//! read as data rather than branching logic.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Step 1: preview/trailer markers - short-circuit everything else.
// ---------------------------------------------------------------------------

pub static PREVIEW_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:preview|trailer|teaser)\b").unwrap(),
        Regex::new(r"(?i)\b(?:pv|cm) ?\d+\b").unwrap(),
        // Creditless opening/ending releases.
        Regex::new(r"(?i)\b(?:ncop|nced)\b").unwrap(),
        Regex::new(r"(?i)\b(?:creditless|non-? ?credit)").unwrap(),
    ]
});

// ---------------------------------------------------------------------------
// Step 2: movie vocabulary.
// ---------------------------------------------------------------------------

pub static MOVIE_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:the )?movie\b").unwrap(),
        Regex::new(r"(?i)\bfilm\b").unwrap(),
        Regex::new(r"(?i)\bgekijouban\b").unwrap(),
        Regex::new(r"劇場版").unwrap(),
    ]
});

/// "Movie 2" / "Movie 02" - captures the movie number.
pub static MOVIE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bmovie ?(\d{1,2})\b").unwrap());

/// Standalone 4-digit year token (guarded against resolution literals by the
/// caller - 1920 is both a year and a frame width).
pub static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[ \[(.])((?:19|20)\d{2})(?:$|[ \]).])").unwrap());

// ---------------------------------------------------------------------------
// Step 3: special/OVA vocabulary.
// ---------------------------------------------------------------------------

pub static SPECIAL_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:ova|ona|oav|oad)s?\b").unwrap(),
        Regex::new(r"(?i)\bspecials?\b").unwrap(),
        Regex::new(r"(?i)\bsp ?\d{1,2}\b").unwrap(),
        Regex::new(r"(?i)\b(?:omake|extras?|bonus)\b").unwrap(),
    ]
});

/// "Special 2" / "SP03" - captures the special number.
pub static SPECIAL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:special|sp) ?(\d{1,2})\b").unwrap());

// ---------------------------------------------------------------------------
// Step 4: season markers, first match wins.
// ---------------------------------------------------------------------------

/// "Season 2", "Saison 2", "Temporada 2".
pub static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:season|saison|temporada) ?(\d{1,2})\b").unwrap());

/// "2nd Season", "3rd Part", "2nd Cour".
pub static SEASON_ORDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th) ?(?:season|part|cour)\b").unwrap()
});

/// "S2" not immediately followed by `E` or another digit (that form belongs
/// to the episode rules). regex-lite has no lookahead, so the trailing
/// character is matched explicitly.
pub static SEASON_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})(?:[^E0-9]|$)").unwrap());

/// CJK season marker: 第2期 / 第二季.
pub static SEASON_CJK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第([0-9一二三四五六七八九十]{1,2})[季期]").unwrap());

/// Trailing roman numeral I-X ("Overlord IV"). Longest alternatives first.
pub static SEASON_ROMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[ _])(VIII|VII|III|IX|IV|VI|II|X|V|I)(?:$|[ \-_\[(])").unwrap()
});

pub static CJK_NUMBERS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    [
        ("一", 1),
        ("二", 2),
        ("三", 3),
        ("四", 4),
        ("五", 5),
        ("六", 6),
        ("七", 7),
        ("八", 8),
        ("九", 9),
        ("十", 10),
    ]
    .into_iter()
    .collect()
});

pub fn roman_to_u32(s: &str) -> Option<u32> {
    match s {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        "IV" => Some(4),
        "V" => Some(5),
        "VI" => Some(6),
        "VII" => Some(7),
        "VIII" => Some(8),
        "IX" => Some(9),
        "X" => Some(10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Step 5: batch markers.
// ---------------------------------------------------------------------------

/// Two season numbers joined by a range/plus: "S1-S3", "Seasons 1-2", "S1+S2".
pub static MULTI_SEASON: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bS(\d{1,2}) ?[-~+] ?S(\d{1,2})\b").unwrap(),
        Regex::new(r"(?i)\bseasons? (\d{1,2}) ?[-~+] ?(\d{1,2})\b").unwrap(),
    ]
});

/// Season plus an explicit episode range: "S1E01-12", "S2 E01-E24".
pub static SEASON_EPISODE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2}) ?E(\d{1,3}) ?[-~] ?E?(\d{1,3})\b").unwrap()
});

/// Bracketed or free-standing numeric range: "[01-12]", "(1-24)", " 01-26 ".
pub static NUMERIC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[ \[(])(\d{1,4}) ?[-~] ?(\d{1,4})(?:$|[ \])(])").unwrap()
});

pub static BATCH_VOCAB: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bbatch\b").unwrap(),
        Regex::new(r"(?i)\bcomplete\b").unwrap(),
        Regex::new(r"(?i)\bbox ?set\b").unwrap(),
        Regex::new(r"(?i)\bfull series\b").unwrap(),
        Regex::new(r"合集").unwrap(),
    ]
});

// ---------------------------------------------------------------------------
// Step 6: single-episode extraction. Season-qualified forms first, then
// absolute forms in decreasing order of confidence.
// ---------------------------------------------------------------------------

/// "S02E05" (the plain pair; ranges were consumed by the batch rules).
pub static SEASON_EP_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2}) ?E(\d{1,3})\b").unwrap());

/// "1x05".
pub static SEASON_X_EP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{1,3})\b").unwrap());

/// "Season 2 Episode 5", "Season 2 Ep 5", "Season 2 - 5".
pub static SEASON_WORD_EP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseason ?(\d{1,2}) ?(?:episode|ep\.?|-) ?(\d{1,3})\b").unwrap()
});

/// "S1 - 04".
pub static SEASON_DASH_EP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2}) - (\d{1,3})\b").unwrap());

/// " - 05" with optional version suffix: the dominant fansub convention.
pub static DASH_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i) - (\d{1,4})(?:v\d+)?(?:$|[ .\[(])").unwrap());

/// "Episode 5", "Ep. 5", "Ep5".
pub static EPISODE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:episode|ep\.?) ?(\d{1,4})\b").unwrap());

/// CJK episode marker: 第5話 / 05话 / 12集.
pub static EPISODE_CJK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第?(\d{1,4})[話话集]").unwrap());

/// Bracketed bare number: "[05]", "[05v2]".
pub static BRACKET_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[(](\d{1,4})(?:v\d+)?[\])]").unwrap());

/// Underscore/dot-delimited number: "_05_", ".05.".
pub static DELIMITED_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_.](\d{2,4})[_.]").unwrap());

/// "E05" not preceded by a digit (which would make it part of SxEy).
/// regex-lite has no lookbehind; the left context is matched explicitly.
pub static E_PREFIX_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^0-9A-Z])E(\d{1,3})(?:$|[^0-9])").unwrap());

/// Bare trailing number, optionally tagged END/完.
pub static TRAILING_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[ _.](\d{1,4})(?:v\d+)? ?(?:end|完)?[ .]*$").unwrap()
});

// ---------------------------------------------------------------------------
// Pre-processing and name extraction.
// ---------------------------------------------------------------------------

/// Technical spec tokens that confuse numeric extraction (10bit, 60fps...).
pub static TECH_SPECS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+ ?-?(?:bits?|fps|khz|hz)").unwrap());

/// Known video container extensions, stripped before classification.
pub static VIDEO_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:mkv|mp4|avi|mov|wmv|m4v|webm|ts|m2ts)$").unwrap());

/// Any bracketed or parenthesized group (release group, checksum, quality).
pub static BRACKET_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap());

/// Encoding/container/audio tokens stripped during bare-name extraction.
pub static MEDIA_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:x26[45]|h\.?26[45]|hevc|avc|av1|aac|ac3|eac3|flac|opus|dual.?audio|multi.?sub|\d{3,4}p|4k|uhd|hdr1?0?|bd(?:rip)?|bluray|blu-ray|web-?dl|web-?rip|hdtv|dvd(?:rip)?|remux|raw|uncensored|subbed|dubbed|vostfr|eng|ita|jpn?)\b",
    )
    .unwrap()
});

pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
