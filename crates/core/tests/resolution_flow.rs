//! End-to-end flow: acquire candidates for an episode, then resolve one to a
//! direct stream URL through a mock debrid provider.

use std::sync::Arc;

use miru_core::config::{MatchingConfig, ResolverSettings};
use miru_core::debrid::{ProviderFile, ResolutionOutcome, TransferStatus};
use miru_core::testing::{MockDebridProvider, MockIndexer};
use miru_core::validator::ContentTypeHint;
use miru_core::{AcquisitionEngine, DebridResolver, Indexer, RawRelease, ShowRequest};

fn release(title: &str, hash: &str, seeders: u32) -> RawRelease {
    RawRelease {
        title: title.to_string(),
        info_hash: hash.to_string(),
        magnet: format!("magnet:?xt=urn:btih:{hash}"),
        seeders,
        size_label: "1.4 GiB".to_string(),
        published_at: None,
    }
}

fn video(path: &str, bytes: u64) -> ProviderFile {
    ProviderFile {
        id: format!("link-{path}"),
        path: path.to_string(),
        bytes,
    }
}

fn show(name: &str) -> ShowRequest {
    ShowRequest {
        name: name.to_string(),
        external_id: None,
        alternate_names: Vec::new(),
    }
}

fn settings() -> ResolverSettings {
    ResolverSettings {
        poll_interval_secs: 1,
        poll_budget_secs: 5,
        ready_cache_ttl_secs: 3600,
        ready_cache_entries: 100,
    }
}

/// Fansub-style absolute numbering, no season token anywhere.
#[tokio::test]
async fn absolute_numbered_release_streams_end_to_end() {
    let indexer: Arc<dyn Indexer> = Arc::new(MockIndexer::new("feed").with_search_results(vec![
        release("[Group] My Show - 05 [1080p]", "aa01", 120),
        release("[Group] My Show - 06 [1080p]", "aa02", 80),
    ]));
    let engine = AcquisitionEngine::new(vec![indexer], MatchingConfig::default());

    let candidates = engine
        .acquire(&show("My Show"), 5, 1, ContentTypeHint::Episode)
        .await;
    assert_eq!(candidates.len(), 1);
    let candidate = &candidates[0];
    assert_eq!(candidate.acceptance_reason.as_deref(), Some("absolute_match"));

    let provider = Arc::new(
        MockDebridProvider::ready("https://host/my-show-05.mkv")
            .with_files(vec![video("My Show - 05.mkv", 1_000_000)]),
    );
    let resolver = DebridResolver::new(provider, settings());

    let outcome = resolver
        .resolve(&candidate.magnet, &candidate.info_hash, "My Show", 5, 1)
        .await;
    assert_eq!(
        outcome,
        ResolutionOutcome::ready("https://host/my-show-05.mkv")
    );
}

/// A season batch with no per-episode marker is accepted, and the right file
/// is picked out of the payload.
#[tokio::test]
async fn season_batch_resolves_to_requested_episode_file() {
    let indexer: Arc<dyn Indexer> = Arc::new(MockIndexer::new("feed").with_search_results(vec![
        release("[Group] My Show Season 2 [1080p]", "bb01", 300),
    ]));
    let engine = AcquisitionEngine::new(vec![indexer], MatchingConfig::default());

    let candidates = engine
        .acquire(&show("My Show"), 5, 2, ContentTypeHint::Episode)
        .await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(
        candidates[0].acceptance_reason.as_deref(),
        Some("batch_unknown_range")
    );

    let provider = Arc::new(
        MockDebridProvider::ready("https://host/s02e05.mkv").with_files(vec![
            video("My Show S02E04.mkv", 900_000),
            video("My Show S02E05.mkv", 910_000),
            video("My Show S02E06.mkv", 920_000),
        ]),
    );
    let resolver = DebridResolver::new(provider, settings());

    let outcome = resolver
        .resolve(
            &candidates[0].magnet,
            &candidates[0].info_hash,
            "My Show",
            5,
            2,
        )
        .await;
    assert!(outcome.is_ready());
}

/// Releases carrying the wrong season never make it past acquisition.
#[tokio::test]
async fn wrong_season_release_is_rejected() {
    let indexer: Arc<dyn Indexer> = Arc::new(MockIndexer::new("feed").with_search_results(vec![
        release("[Group] My Show S01E05 [1080p]", "cc01", 50),
        release("[Group] My Show S03E05 [1080p]", "cc02", 50),
    ]));
    let engine = AcquisitionEngine::new(vec![indexer], MatchingConfig::default());

    let candidates = engine
        .acquire(&show("My Show"), 5, 3, ContentTypeHint::Episode)
        .await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].info_hash, "cc02");
}

/// A transfer the provider is still fetching answers pending, and nothing is
/// cached: the next request drives the state machine again.
#[tokio::test(start_paused = true)]
async fn pending_transfer_is_not_cached() {
    let provider = Arc::new(
        MockDebridProvider::always_downloading(12.0)
            .with_files(vec![video("My Show - 05.mkv", 1_000_000)]),
    );
    let resolver = DebridResolver::new(provider.clone(), settings());

    let first = resolver
        .resolve("magnet:?xt=urn:btih:dd01", "dd01", "My Show", 5, 1)
        .await;
    assert!(matches!(first, ResolutionOutcome::Pending { .. }));

    let second = resolver
        .resolve("magnet:?xt=urn:btih:dd01", "dd01", "My Show", 5, 1)
        .await;
    assert!(matches!(second, ResolutionOutcome::Pending { .. }));
    assert_eq!(provider.submit_count(), 2);
}

/// A transfer that completes within the poll budget resolves on the first
/// request, and the second request is answered from cache.
#[tokio::test(start_paused = true)]
async fn completed_transfer_is_cached_for_reuse() {
    let provider = Arc::new(
        MockDebridProvider::with_status_sequence(vec![
            TransferStatus::Queued,
            TransferStatus::Downloading(60.0),
            TransferStatus::Downloaded,
        ])
        .with_files(vec![video("My Show - 05.mkv", 1_000_000)])
        .with_unlock_url("https://host/my-show-05.mkv"),
    );
    let resolver = DebridResolver::new(provider.clone(), settings());

    let first = resolver
        .resolve("magnet:?xt=urn:btih:ee01", "ee01", "My Show", 5, 1)
        .await;
    assert!(first.is_ready());

    let second = resolver
        .resolve("magnet:?xt=urn:btih:ee01", "ee01", "My Show", 5, 1)
        .await;
    assert_eq!(second, first);
    assert_eq!(provider.submit_count(), 1);
}

/// Repeating the same acquisition yields the same candidates, served from
/// the search cache without requerying the indexer.
#[tokio::test]
async fn repeated_acquisition_is_idempotent() {
    let indexer = Arc::new(MockIndexer::new("feed").with_search_results(vec![release(
        "[Group] My Show - 05 [1080p]",
        "ff01",
        10,
    )]));
    let engine = AcquisitionEngine::new(vec![indexer.clone()], MatchingConfig::default());

    let first = engine
        .acquire(&show("My Show"), 5, 1, ContentTypeHint::Episode)
        .await;
    let queries_after_first = indexer.recorded_queries().len();
    let second = engine
        .acquire(&show("My Show"), 5, 1, ContentTypeHint::Episode)
        .await;

    assert_eq!(
        first.iter().map(|c| &c.info_hash).collect::<Vec<_>>(),
        second.iter().map(|c| &c.info_hash).collect::<Vec<_>>()
    );
    assert_eq!(indexer.recorded_queries().len(), queries_after_first);
}
