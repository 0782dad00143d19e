//! Candidate-to-stream resolution.
//!
//! Drives one candidate through the provider: submit the magnet, poll the
//! transfer within a fixed time budget, pick the episode's file out of the
//! payload, verify the payload is the show it claims to be, and unlock a
//! direct URL. Only a [`Ready`](ResolutionOutcome::Ready) outcome is cached;
//! pending and failed resolutions are always re-derived.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, warn};

use crate::cache::{cache_key, TtlCache};
use crate::classifier::Classifier;
use crate::config::ResolverSettings;
use crate::metrics;

use super::types::{DebridProvider, ProviderFile, ResolutionOutcome, TransferStatus};

const VIDEO_EXTENSIONS: [&str; 6] = ["mkv", "mp4", "avi", "ts", "m2ts", "webm"];

/// Minimum significant-word overlap for the payload to count as the show.
const PAYLOAD_OVERLAP_THRESHOLD: f64 = 0.3;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

pub struct DebridResolver {
    provider: Arc<dyn DebridProvider>,
    classifier: Classifier,
    settings: ResolverSettings,
    ready_cache: TtlCache<String>,
}

impl DebridResolver {
    pub fn new(provider: Arc<dyn DebridProvider>, settings: ResolverSettings) -> Self {
        let ready_cache = TtlCache::new(
            "debrid_ready",
            settings.ready_cache_entries,
            Duration::from_secs(settings.ready_cache_ttl_secs),
        );
        Self {
            provider,
            classifier: Classifier::new(),
            settings,
            ready_cache,
        }
    }

    /// Resolve one candidate (by magnet and info hash) to a playable URL for
    /// the requested episode.
    pub async fn resolve(
        &self,
        magnet: &str,
        info_hash: &str,
        show_name: &str,
        episode: u32,
        season: u32,
    ) -> ResolutionOutcome {
        let key = cache_key(&[self.provider.name(), info_hash, &episode.to_string()]);
        if let Some(url) = self.ready_cache.get(&key) {
            debug!(info_hash = %info_hash, episode = episode, "Resolution cache hit");
            return ResolutionOutcome::ready(url);
        }

        let outcome = self.resolve_uncached(magnet, show_name, episode, season).await;

        metrics::RESOLUTIONS
            .with_label_values(&[self.provider.name(), outcome_label(&outcome)])
            .inc();
        if let ResolutionOutcome::Ready { url } = &outcome {
            self.ready_cache.insert(key, url.clone());
        }
        outcome
    }

    async fn resolve_uncached(
        &self,
        magnet: &str,
        show_name: &str,
        episode: u32,
        season: u32,
    ) -> ResolutionOutcome {
        let transfer_id = match self.provider.submit_magnet(magnet).await {
            Ok(id) => id,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Magnet submission failed");
                return ResolutionOutcome::error(format!("submit failed: {e}"));
            }
        };

        if let Some(outcome) = self.await_downloaded(&transfer_id).await {
            return outcome;
        }

        let files = match self.provider.list_files(&transfer_id).await {
            Ok(files) => files,
            Err(e) => return ResolutionOutcome::error(format!("file listing failed: {e}")),
        };

        let Some(selection) = self.select_episode_file(&files, episode, season) else {
            return ResolutionOutcome::error("transfer contains no video files");
        };
        if selection.fallback {
            warn!(
                transfer_id = %transfer_id,
                file = %selection.file.path,
                episode = episode,
                "No file matched the episode number, using largest video file"
            );
        }

        if !payload_matches_show(show_name, &selection.file.path) {
            debug!(
                expected = %show_name,
                actual = %selection.file.path,
                "Payload does not match requested show"
            );
            return ResolutionOutcome::Mislabeled {
                expected: show_name.to_string(),
                actual: selection.file.path.clone(),
            };
        }

        match self.provider.unlock_file(selection.file).await {
            Ok(url) => ResolutionOutcome::ready(url),
            Err(e) => ResolutionOutcome::error(format!("unlock failed: {e}")),
        }
    }

    /// Poll the transfer with a fixed interval until it is downloaded or the
    /// budget runs out. `None` means downloaded; `Some` is a terminal
    /// pending/error outcome.
    async fn await_downloaded(&self, transfer_id: &str) -> Option<ResolutionOutcome> {
        let mut polls = 0u32;
        let outcome = self.poll_transfer(transfer_id, &mut polls).await;
        metrics::RESOLUTION_POLLS
            .with_label_values(&[self.provider.name()])
            .observe(polls as f64);
        outcome
    }

    async fn poll_transfer(
        &self,
        transfer_id: &str,
        polls: &mut u32,
    ) -> Option<ResolutionOutcome> {
        let interval = Duration::from_secs(self.settings.poll_interval_secs.max(1));
        let max_polls =
            (self.settings.poll_budget_secs / self.settings.poll_interval_secs.max(1)).max(1);

        let mut last_progress = 0.0;
        for poll in 0..max_polls {
            *polls += 1;
            match self.provider.poll_status(transfer_id).await {
                Ok(TransferStatus::Downloaded) => return None,
                Ok(TransferStatus::Failed(reason)) => {
                    return Some(ResolutionOutcome::error(format!(
                        "transfer failed: {reason}"
                    )));
                }
                Ok(TransferStatus::Downloading(progress)) => last_progress = progress,
                Ok(TransferStatus::Queued) => {}
                Err(e) => {
                    return Some(ResolutionOutcome::error(format!("status poll failed: {e}")));
                }
            }
            debug!(transfer_id = %transfer_id, poll = poll, progress = last_progress, "Transfer not ready yet");
            if poll + 1 < max_polls {
                tokio::time::sleep(interval).await;
            }
        }

        Some(ResolutionOutcome::pending(format!(
            "provider still fetching ({last_progress:.0}%), retry later"
        )))
    }

    /// Pick the file for the requested episode: video files whose names
    /// classify to that episode, largest first. Falls back to the largest
    /// video file when nothing matches (single-file payloads with cryptic
    /// names are common).
    fn select_episode_file<'a>(
        &self,
        files: &'a [ProviderFile],
        episode: u32,
        season: u32,
    ) -> Option<FileSelection<'a>> {
        let videos: Vec<&ProviderFile> = files.iter().filter(|f| is_video_file(&f.path)).collect();

        let matching = videos
            .iter()
            .copied()
            .filter(|f| {
                let info = self.classifier.classify(file_stem(&f.path));
                if info.content_type != crate::classifier::ContentType::Episode {
                    return false;
                }
                if let Some(file_season) = info.season {
                    if file_season != season {
                        return false;
                    }
                }
                info.episode == Some(episode)
            })
            .max_by_key(|f| f.bytes);
        if let Some(file) = matching {
            return Some(FileSelection {
                file,
                fallback: false,
            });
        }

        videos
            .into_iter()
            .max_by_key(|f| f.bytes)
            .map(|file| FileSelection {
                file,
                fallback: true,
            })
    }
}

struct FileSelection<'a> {
    file: &'a ProviderFile,
    fallback: bool,
}

fn outcome_label(outcome: &ResolutionOutcome) -> &'static str {
    match outcome {
        ResolutionOutcome::Ready { .. } => "ready",
        ResolutionOutcome::Pending { .. } => "pending",
        ResolutionOutcome::Mislabeled { .. } => "mislabeled",
        ResolutionOutcome::Error { .. } => "error",
    }
}

fn is_video_file(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Whether the payload file plausibly belongs to the requested show.
///
/// Condensed containment in either direction, else significant-word overlap.
/// A name with no significant words (e.g. "ep05.mkv") carries no identity
/// signal and passes.
fn payload_matches_show(expected: &str, actual_path: &str) -> bool {
    let expected_norm = normalize(expected);
    let actual_norm = normalize(file_stem(actual_path));

    let expected_condensed = expected_norm.replace(' ', "");
    let actual_condensed = actual_norm.replace(' ', "");
    if !expected_condensed.is_empty()
        && (actual_condensed.contains(&expected_condensed)
            || expected_condensed.contains(&actual_condensed) && !actual_condensed.is_empty())
    {
        return true;
    }

    let expected_words: Vec<&str> = significant_words(&expected_norm);
    let actual_words: Vec<&str> = significant_words(&actual_norm);
    if actual_words.is_empty() || expected_words.is_empty() {
        return true;
    }
    let overlap = expected_words
        .iter()
        .filter(|w| actual_words.contains(w))
        .count();
    (overlap as f64 / expected_words.len() as f64) >= PAYLOAD_OVERLAP_THRESHOLD
}

fn normalize(s: &str) -> String {
    NON_ALNUM
        .replace_all(&s.to_lowercase(), " ")
        .trim()
        .to_string()
}

// Tokens with digits ("ep05", "1080p") are numbering or tech specs, not
// identity.
fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|w| w.len() > 2 && w.chars().all(|c| c.is_alphabetic()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDebridProvider;

    fn settings() -> ResolverSettings {
        ResolverSettings {
            poll_interval_secs: 1,
            poll_budget_secs: 5,
            ready_cache_ttl_secs: 3600,
            ready_cache_entries: 100,
        }
    }

    fn video(path: &str, bytes: u64) -> ProviderFile {
        ProviderFile {
            id: format!("link-{path}"),
            path: path.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("Show - 05.mkv"));
        assert!(is_video_file("Show/Show - 05.MP4"));
        assert!(!is_video_file("readme.txt"));
        assert!(!is_video_file("noextension"));
    }

    #[test]
    fn test_payload_matches_show_condensed() {
        assert!(payload_matches_show(
            "My Show",
            "MyShow.S01E05.1080p.mkv"
        ));
    }

    #[test]
    fn test_payload_matches_show_word_overlap() {
        assert!(payload_matches_show(
            "The Grand Long Story",
            "Grand Story - 05.mkv"
        ));
        assert!(!payload_matches_show(
            "My Show",
            "Completely Different Series - 05.mkv"
        ));
    }

    #[test]
    fn test_payload_with_no_identity_signal_passes() {
        assert!(payload_matches_show("My Show", "ep05.mkv"));
    }

    #[test]
    fn test_select_episode_file_prefers_matching_episode() {
        let resolver = DebridResolver::new(Arc::new(MockDebridProvider::ready("u")), settings());
        let files = vec![
            video("Show - 04.mkv", 900),
            video("Show - 05.mkv", 800),
            ProviderFile {
                id: "x".to_string(),
                path: "Show - 05.txt".to_string(),
                bytes: 9999,
            },
        ];
        let selection = resolver.select_episode_file(&files, 5, 1).unwrap();
        assert_eq!(selection.file.path, "Show - 05.mkv");
        assert!(!selection.fallback);
    }

    #[test]
    fn test_select_episode_file_skips_previews() {
        let resolver = DebridResolver::new(Arc::new(MockDebridProvider::ready("u")), settings());
        let files = vec![
            video("Show - NCOP.mkv", 500),
            video("Show - 05.mkv", 400),
        ];
        let selection = resolver.select_episode_file(&files, 5, 1).unwrap();
        assert_eq!(selection.file.path, "Show - 05.mkv");
    }

    #[test]
    fn test_select_episode_file_fallback_largest_video() {
        let resolver = DebridResolver::new(Arc::new(MockDebridProvider::ready("u")), settings());
        let files = vec![video("payload_a.mkv", 100), video("payload_b.mkv", 900)];
        let selection = resolver.select_episode_file(&files, 5, 1).unwrap();
        assert_eq!(selection.file.path, "payload_b.mkv");
        assert!(selection.fallback);
    }

    #[test]
    fn test_select_episode_file_rejects_wrong_season() {
        let resolver = DebridResolver::new(Arc::new(MockDebridProvider::ready("u")), settings());
        let files = vec![
            video("Show S02E05.mkv", 500),
            video("Show S03E05.mkv", 400),
        ];
        let selection = resolver.select_episode_file(&files, 5, 3).unwrap();
        assert_eq!(selection.file.path, "Show S03E05.mkv");
        assert!(!selection.fallback);
    }

    #[tokio::test]
    async fn test_resolve_ready_and_cached() {
        let provider = Arc::new(
            MockDebridProvider::ready("https://host/direct.mkv")
                .with_files(vec![video("My Show - 05.mkv", 1000)]),
        );
        let resolver = DebridResolver::new(provider.clone(), settings());

        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert_eq!(
            outcome,
            ResolutionOutcome::ready("https://host/direct.mkv")
        );
        assert_eq!(provider.submit_count(), 1);

        // Second request is served from cache without touching the provider.
        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert!(outcome.is_ready());
        assert_eq!(provider.submit_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_pending_on_budget_exhaustion_not_cached() {
        let provider = Arc::new(
            MockDebridProvider::always_downloading(35.0)
                .with_files(vec![video("My Show - 05.mkv", 1000)]),
        );
        let resolver = DebridResolver::new(provider.clone(), settings());

        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert!(matches!(outcome, ResolutionOutcome::Pending { .. }));

        // Still pending: the outcome was not cached.
        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert!(matches!(outcome, ResolutionOutcome::Pending { .. }));
        assert_eq!(provider.submit_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_waits_through_downloading_states() {
        let provider = Arc::new(
            MockDebridProvider::with_status_sequence(vec![
                TransferStatus::Queued,
                TransferStatus::Downloading(40.0),
                TransferStatus::Downloaded,
            ])
            .with_files(vec![video("My Show - 05.mkv", 1000)])
            .with_unlock_url("https://host/direct.mkv"),
        );
        let resolver = DebridResolver::new(provider, settings());

        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert!(outcome.is_ready());
    }

    #[tokio::test]
    async fn test_resolve_mislabeled_payload() {
        let provider = Arc::new(
            MockDebridProvider::ready("https://host/direct.mkv")
                .with_files(vec![video("Completely Different Series - 05.mkv", 1000)]),
        );
        let resolver = DebridResolver::new(provider, settings());

        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert_eq!(
            outcome,
            ResolutionOutcome::Mislabeled {
                expected: "My Show".to_string(),
                actual: "Completely Different Series - 05.mkv".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_failed_transfer() {
        let provider = Arc::new(MockDebridProvider::with_status_sequence(vec![
            TransferStatus::Failed("dead".to_string()),
        ]));
        let resolver = DebridResolver::new(provider, settings());

        let outcome = resolver
            .resolve("magnet:?xt=a", "hash-a", "My Show", 5, 1)
            .await;
        assert!(matches!(outcome, ResolutionOutcome::Error { .. }));
    }
}
