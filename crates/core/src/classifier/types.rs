//! Types produced by release-title classification.

use serde::{Deserialize, Serialize};

/// What kind of content a release title describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// A single numbered episode.
    Episode,
    /// A theatrical movie or film release.
    Movie,
    /// OVA/ONA/special/extra content.
    Special,
    /// Trailer, PV, CM, creditless opening/ending - never playable as an episode.
    Preview,
    /// A multi-episode package (season pack, range, box set).
    Batch,
}

/// Structured episode metadata extracted from one free-text release title.
///
/// Produced by [`classify`](super::classify); absence of a field is the
/// signal, never an error. If `content_type` is `Preview` all numeric fields
/// are absent. If `is_batch` is set, `episode` is never set - episode
/// identity for batches is resolved through `batch_range` or season match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeInfo {
    /// Detected content type.
    pub content_type: ContentType,
    /// Season number, when a season marker was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number, when exactly one episode is identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Whether the title is a multi-episode package.
    #[serde(default)]
    pub is_batch: bool,
    /// Inclusive episode range for a batch, when one was stated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_range: Option<(u32, u32)>,
    /// Episode number uses continuous numbering with no season qualifier.
    #[serde(default)]
    pub is_absolute: bool,
    /// Batch spans more than one season (always too coarse to match a
    /// specific requested episode).
    #[serde(default)]
    pub is_multi_season: bool,
    /// Movie number for numbered film series ("Movie 2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_number: Option<u32>,
    /// Special/OVA number ("SP3", "Special 2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_number: Option<u32>,
    /// Release year, when one was stated (movies mostly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

impl Default for EpisodeInfo {
    fn default() -> Self {
        Self {
            content_type: ContentType::Episode,
            season: None,
            episode: None,
            is_batch: false,
            batch_range: None,
            is_absolute: false,
            is_multi_season: false,
            movie_number: None,
            special_number: None,
            year: None,
        }
    }
}

impl EpisodeInfo {
    /// An all-absent result with the given content type.
    pub fn of_type(content_type: ContentType) -> Self {
        Self {
            content_type,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_episode_with_nothing_set() {
        let info = EpisodeInfo::default();
        assert_eq!(info.content_type, ContentType::Episode);
        assert!(info.season.is_none());
        assert!(info.episode.is_none());
        assert!(!info.is_batch);
        assert!(info.batch_range.is_none());
    }

    #[test]
    fn test_content_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ContentType::Preview).unwrap(),
            "\"preview\""
        );
        assert_eq!(
            serde_json::to_string(&ContentType::Batch).unwrap(),
            "\"batch\""
        );
    }

    #[test]
    fn test_episode_info_roundtrip() {
        let info = EpisodeInfo {
            content_type: ContentType::Batch,
            season: Some(3),
            is_batch: true,
            batch_range: Some((1, 12)),
            ..EpisodeInfo::default()
        };

        let json = serde_json::to_string(&info).unwrap();
        let parsed: EpisodeInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
