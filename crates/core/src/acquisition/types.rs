//! Types for torrent acquisition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::EpisodeInfo;

/// A show identity as the caller knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowRequest {
    /// Primary show name.
    pub name: String,
    /// Stable external identifier usable for id-based indexer lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Alternate names (localizations, romanizations).
    #[serde(default)]
    pub alternate_names: Vec<String>,
}

/// Video quality tier, best first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    #[serde(rename = "4k")]
    FourK,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Quality {
    /// Detect the quality tier from a release title.
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        if lower.contains("2160p") || lower.contains("4k") || lower.contains("uhd") {
            Quality::FourK
        } else if lower.contains("1080") {
            Quality::P1080
        } else if lower.contains("720") {
            Quality::P720
        } else if lower.contains("480") {
            Quality::P480
        } else {
            Quality::Unknown
        }
    }
}

/// Where the video was sourced from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Bd,
    WebDl,
    WebRip,
    Tv,
    Unknown,
}

impl SourceType {
    pub fn from_title(title: &str) -> Self {
        let lower = title.to_lowercase();
        // "webdl" contains "bd", so web sources must be checked first.
        if lower.contains("web-dl") || lower.contains("webdl") {
            SourceType::WebDl
        } else if lower.contains("webrip") || lower.contains("web-rip") || lower.contains("web") {
            SourceType::WebRip
        } else if lower.contains("bd") || lower.contains("bluray") || lower.contains("blu-ray") {
            SourceType::Bd
        } else if lower.contains("hdtv") || lower.contains("tvrip") {
            SourceType::Tv
        } else {
            SourceType::Unknown
        }
    }
}

static RELEASE_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]]+)\]").unwrap());
static RAW_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\braws?\b").unwrap());

/// Leading bracketed token, the dominant release-group convention.
pub fn release_group_from_title(title: &str) -> String {
    RELEASE_GROUP
        .captures(title.trim())
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Whether a title advertises a raw (no subtitles) release.
pub fn is_raw_release(title: &str) -> bool {
    RAW_MARKER.is_match(title)
}

/// Raw record returned by one indexer adapter, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRelease {
    pub title: String,
    /// Stable content hash (40-hex infohash typically). Empty if unknown.
    pub info_hash: String,
    /// Magnet URI or provider-specific reference usable for debrid submit.
    pub magnet: String,
    pub seeders: u32,
    /// Size as reported by the indexer ("1.4 GiB").
    pub size_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A normalized, validated torrent candidate. Held only for the duration of
/// one request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentCandidate {
    pub title: String,
    /// Unique content hash (lowercase hex) - dedup and cache key.
    pub info_hash: String,
    pub magnet: String,
    pub quality: Quality,
    pub source_type: SourceType,
    pub is_raw: bool,
    pub release_group: String,
    pub seeders: u32,
    pub size_label: String,
    /// Which indexer produced this candidate.
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Candidate came from id-based lookup: show identity is already proven.
    #[serde(default)]
    pub via_id_lookup: bool,
    /// Classifier output attached by the episode validator on acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_info: Option<EpisodeInfo>,
    /// Why the validator accepted this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_reason: Option<String>,
}

impl TorrentCandidate {
    /// Normalize one raw indexer record into a candidate.
    pub fn from_raw(raw: RawRelease, provider: &str, via_id_lookup: bool) -> Self {
        Self {
            quality: Quality::from_title(&raw.title),
            source_type: SourceType::from_title(&raw.title),
            is_raw: is_raw_release(&raw.title),
            release_group: release_group_from_title(&raw.title),
            info_hash: raw.info_hash.to_lowercase(),
            title: raw.title,
            magnet: raw.magnet,
            seeders: raw.seeders,
            size_label: raw.size_label,
            provider: provider.to_string(),
            published_at: raw.published_at,
            via_id_lookup,
            matched_info: None,
            acceptance_reason: None,
        }
    }
}

/// Errors from one indexer adapter. Adapter failures never abort siblings.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Indexer connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Indexer API error: {0}")]
    ApiError(String),

    #[error("Malformed indexer response: {0}")]
    Malformed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Id-based lookup not supported by this indexer")]
    IdLookupUnsupported,
}

/// One torrent indexer adapter: free-text search and, for aggregators that
/// index by a stable external id, id-based lookup.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Indexer name for logging/metrics/cache keys.
    fn name(&self) -> &str;

    /// Free-text search.
    async fn search(&self, query: &str) -> Result<Vec<RawRelease>, IndexerError>;

    /// Whether [`lookup_by_id`](Self::lookup_by_id) is implemented.
    fn supports_id_lookup(&self) -> bool {
        false
    }

    /// Lookup by stable external id, scoped to one episode.
    async fn lookup_by_id(
        &self,
        _external_id: &str,
        _episode: u32,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        Err(IndexerError::IdLookupUnsupported)
    }
}
