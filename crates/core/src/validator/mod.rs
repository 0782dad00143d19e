//! Episode validation.
//!
//! Combines classifier output with a concrete (season, episode) request and
//! decides accept/reject with a reason code. The decision table is strict:
//! previews never match, multi-season batches are always too coarse to prove
//! correctness, and a wrong content type is a hard reject.

use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ContentType, EpisodeInfo};

/// What kind of content the caller is actually asking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentTypeHint {
    #[default]
    Episode,
    Movie,
    Special,
}

/// Why a candidate was accepted or rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    /// Trailers/PVs/creditless content never satisfy any request.
    PreviewRejected,
    /// Found a movie/special when an episode was requested, or vice versa.
    ContentTypeMismatch,
    MovieMatch,
    MovieNumberMismatch,
    SpecialMatch,
    SpecialNumberMismatch,
    /// Batch spans multiple seasons: rejected regardless of request.
    MultiSeasonBatch,
    SeasonMismatch,
    /// Requested episode falls inside the batch's stated range.
    BatchRangeMatch,
    BatchRangeMismatch,
    /// Batch has no stated range; accepted, exact file selection is deferred
    /// to the file-listing stage.
    BatchUnknownRange,
    /// Season and episode both match.
    ExactMatch,
    /// Episode matches under season-less absolute numbering.
    AbsoluteMatch,
    EpisodeMismatch,
    MissingEpisodeNumber,
}

impl ValidationReason {
    /// Stable snake_case label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::PreviewRejected => "preview_rejected",
            ValidationReason::ContentTypeMismatch => "content_type_mismatch",
            ValidationReason::MovieMatch => "movie_match",
            ValidationReason::MovieNumberMismatch => "movie_number_mismatch",
            ValidationReason::SpecialMatch => "special_match",
            ValidationReason::SpecialNumberMismatch => "special_number_mismatch",
            ValidationReason::MultiSeasonBatch => "multi_season_batch",
            ValidationReason::SeasonMismatch => "season_mismatch",
            ValidationReason::BatchRangeMatch => "batch_range_match",
            ValidationReason::BatchRangeMismatch => "batch_range_mismatch",
            ValidationReason::BatchUnknownRange => "batch_unknown_range",
            ValidationReason::ExactMatch => "exact_match",
            ValidationReason::AbsoluteMatch => "absolute_match",
            ValidationReason::EpisodeMismatch => "episode_mismatch",
            ValidationReason::MissingEpisodeNumber => "missing_episode_number",
        }
    }
}

/// Outcome of validating one release title against a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeValidation {
    pub matches: bool,
    pub reason: ValidationReason,
    pub info: EpisodeInfo,
}

impl EpisodeValidation {
    fn accept(reason: ValidationReason, info: EpisodeInfo) -> Self {
        Self {
            matches: true,
            reason,
            info,
        }
    }

    fn reject(reason: ValidationReason, info: EpisodeInfo) -> Self {
        Self {
            matches: false,
            reason,
            info,
        }
    }
}

/// Validate a release title with the default classifier.
pub fn validate_episode(
    title: &str,
    requested_episode: u32,
    requested_season: u32,
    hint: ContentTypeHint,
) -> EpisodeValidation {
    validate_episode_with(
        &Classifier::new(),
        title,
        requested_episode,
        requested_season,
        hint,
    )
}

/// Validate a release title against a (season, episode) request.
pub fn validate_episode_with(
    classifier: &Classifier,
    title: &str,
    requested_episode: u32,
    requested_season: u32,
    hint: ContentTypeHint,
) -> EpisodeValidation {
    let info = classifier.classify(title);

    if info.content_type == ContentType::Preview {
        return EpisodeValidation::reject(ValidationReason::PreviewRejected, info);
    }

    if hint == ContentTypeHint::Movie {
        return validate_movie(info, requested_episode);
    }

    // Season 0 is the conventional encoding for specials.
    if hint == ContentTypeHint::Special || requested_season == 0 {
        return validate_special(info, requested_episode);
    }

    // A movie/special we did not ask for never satisfies an episode request.
    if matches!(info.content_type, ContentType::Movie | ContentType::Special) {
        return EpisodeValidation::reject(ValidationReason::ContentTypeMismatch, info);
    }

    if info.is_batch {
        return validate_batch(info, requested_episode, requested_season);
    }

    let Some(episode) = info.episode else {
        return EpisodeValidation::reject(ValidationReason::MissingEpisodeNumber, info);
    };

    match info.season {
        Some(season) if season != requested_season => {
            EpisodeValidation::reject(ValidationReason::SeasonMismatch, info)
        }
        Some(_) => {
            if episode == requested_episode {
                EpisodeValidation::accept(ValidationReason::ExactMatch, info)
            } else {
                EpisodeValidation::reject(ValidationReason::EpisodeMismatch, info)
            }
        }
        None => {
            if episode == requested_episode {
                EpisodeValidation::accept(ValidationReason::AbsoluteMatch, info)
            } else {
                EpisodeValidation::reject(ValidationReason::EpisodeMismatch, info)
            }
        }
    }
}

fn validate_movie(info: EpisodeInfo, requested_number: u32) -> EpisodeValidation {
    if info.content_type != ContentType::Movie {
        return EpisodeValidation::reject(ValidationReason::ContentTypeMismatch, info);
    }
    match info.movie_number {
        // Number on both sides: they must agree.
        Some(n) if n != requested_number => {
            EpisodeValidation::reject(ValidationReason::MovieNumberMismatch, info)
        }
        _ => EpisodeValidation::accept(ValidationReason::MovieMatch, info),
    }
}

fn validate_special(info: EpisodeInfo, requested_number: u32) -> EpisodeValidation {
    if info.content_type == ContentType::Special {
        return match info.special_number {
            Some(n) if n != requested_number => {
                EpisodeValidation::reject(ValidationReason::SpecialNumberMismatch, info)
            }
            _ => EpisodeValidation::accept(ValidationReason::SpecialMatch, info),
        };
    }
    // An explicit season-0 episode also counts as a special.
    if info.season == Some(0) && info.episode == Some(requested_number) {
        return EpisodeValidation::accept(ValidationReason::SpecialMatch, info);
    }
    EpisodeValidation::reject(ValidationReason::ContentTypeMismatch, info)
}

fn validate_batch(
    info: EpisodeInfo,
    requested_episode: u32,
    requested_season: u32,
) -> EpisodeValidation {
    if info.is_multi_season {
        return EpisodeValidation::reject(ValidationReason::MultiSeasonBatch, info);
    }
    if let Some(season) = info.season {
        if season != requested_season {
            return EpisodeValidation::reject(ValidationReason::SeasonMismatch, info);
        }
    }
    if let Some((start, end)) = info.batch_range {
        return if (start..=end).contains(&requested_episode) {
            EpisodeValidation::accept(ValidationReason::BatchRangeMatch, info)
        } else {
            EpisodeValidation::reject(ValidationReason::BatchRangeMismatch, info)
        };
    }
    EpisodeValidation::accept(ValidationReason::BatchUnknownRange, info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint() -> ContentTypeHint {
        ContentTypeHint::Episode
    }

    #[test]
    fn test_preview_always_rejected() {
        let v = validate_episode("[Group] Show - PV2", 2, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::PreviewRejected);
    }

    #[test]
    fn test_absolute_episode_accepted() {
        let v = validate_episode("[Group] Frieren - 05 (1080p).mkv", 5, 1, hint());
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::AbsoluteMatch);
        assert!(v.info.is_absolute);
    }

    #[test]
    fn test_exact_season_episode_accepted() {
        let v = validate_episode("Show S02E07", 7, 2, hint());
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::ExactMatch);
    }

    #[test]
    fn test_season_mismatch_rejected() {
        let v = validate_episode("Solo Leveling S02E02", 2, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::SeasonMismatch);
    }

    #[test]
    fn test_episode_mismatch_rejected() {
        let v = validate_episode("Show - 06", 5, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::EpisodeMismatch);
    }

    #[test]
    fn test_batch_unknown_range_accepted() {
        let v = validate_episode("[Group] My Hero Academia S3 [BD 1080p]", 4, 3, hint());
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::BatchUnknownRange);
    }

    #[test]
    fn test_batch_wrong_season_rejected() {
        let v = validate_episode("[Group] My Hero Academia S3 [BD 1080p]", 4, 2, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::SeasonMismatch);
    }

    #[test]
    fn test_batch_range_contains_episode() {
        let v = validate_episode("[Group] Show [01-12]", 7, 1, hint());
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::BatchRangeMatch);
    }

    #[test]
    fn test_batch_range_excludes_episode() {
        let v = validate_episode("[Group] Show [01-12]", 13, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::BatchRangeMismatch);
    }

    #[test]
    fn test_multi_season_batch_always_rejected() {
        for (season, episode) in [(1u32, 1u32), (2, 5), (3, 12)] {
            let v = validate_episode("Show S1-S3 Complete", episode, season, hint());
            assert!(!v.matches);
            assert_eq!(v.reason, ValidationReason::MultiSeasonBatch);
        }
    }

    #[test]
    fn test_movie_when_episode_requested_rejected() {
        let v = validate_episode("Show The Movie (2019)", 1, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::ContentTypeMismatch);
    }

    #[test]
    fn test_movie_hint_accepts_movie() {
        let v = validate_episode("Show Movie 2 (2019)", 2, 1, ContentTypeHint::Movie);
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::MovieMatch);
    }

    #[test]
    fn test_movie_hint_number_mismatch() {
        let v = validate_episode("Show Movie 2", 3, 1, ContentTypeHint::Movie);
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::MovieNumberMismatch);
    }

    #[test]
    fn test_movie_hint_accepts_unnumbered_movie() {
        let v = validate_episode("Show The Movie [1080p]", 1, 1, ContentTypeHint::Movie);
        assert!(v.matches);
    }

    #[test]
    fn test_movie_hint_rejects_episode() {
        let v = validate_episode("Show - 05", 5, 1, ContentTypeHint::Movie);
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::ContentTypeMismatch);
    }

    #[test]
    fn test_season_zero_means_special() {
        let v = validate_episode("Show OVA 2", 2, 0, hint());
        assert!(v.matches);
        assert_eq!(v.reason, ValidationReason::SpecialMatch);
    }

    #[test]
    fn test_special_hint_number_mismatch() {
        let v = validate_episode("Show Special 2", 3, 0, ContentTypeHint::Special);
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::SpecialNumberMismatch);
    }

    #[test]
    fn test_special_hint_rejects_regular_episode() {
        let v = validate_episode("Show - 05", 5, 0, ContentTypeHint::Special);
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::ContentTypeMismatch);
    }

    #[test]
    fn test_no_episode_number_rejected() {
        let v = validate_episode("Show Without Numbers", 5, 1, hint());
        assert!(!v.matches);
        assert_eq!(v.reason, ValidationReason::MissingEpisodeNumber);
    }

    #[test]
    fn test_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&ValidationReason::BatchUnknownRange).unwrap(),
            "\"batch_unknown_range\""
        );
        assert_eq!(
            serde_json::to_string(&ValidationReason::SeasonMismatch).unwrap(),
            "\"season_mismatch\""
        );
    }
}
