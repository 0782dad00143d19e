//! Candidate acquisition pipeline.
//!
//! Fans a request out to every configured indexer, normalizes and
//! deduplicates what comes back, then runs each release title through the
//! show-identity gate and the episode validator. An indexer failing never
//! aborts the request: surviving indexers still produce partial results.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::{cache_key, TtlCache};
use crate::classifier::Classifier;
use crate::config::MatchingConfig;
use crate::matcher::{score_title, MatchReason};
use crate::metrics;
use crate::validator::{validate_episode_with, ContentTypeHint};

use super::dedup::{dedup_candidates, sort_candidates};
use super::types::{Indexer, IndexerError, RawRelease, ShowRequest, TorrentCandidate};

const SEARCH_CACHE_TTL: Duration = Duration::from_secs(10 * 60);
const SEARCH_CACHE_ENTRIES: usize = 500;

/// Finds and validates torrent candidates for one requested episode.
pub struct AcquisitionEngine {
    indexers: Vec<Arc<dyn Indexer>>,
    classifier: Classifier,
    matching: MatchingConfig,
    search_cache: TtlCache<Vec<RawRelease>>,
}

impl AcquisitionEngine {
    pub fn new(indexers: Vec<Arc<dyn Indexer>>, matching: MatchingConfig) -> Self {
        Self {
            indexers,
            classifier: Classifier::new(),
            matching,
            search_cache: TtlCache::new("indexer_search", SEARCH_CACHE_ENTRIES, SEARCH_CACHE_TTL),
        }
    }

    /// Acquire validated candidates for `episode` of `show`, best-first.
    ///
    /// Id-based lookup is attempted wherever an indexer supports it and the
    /// show carries an external id; those candidates skip the identity gate.
    /// When id lookup was possible but produced nothing, text-search results
    /// are held to the strict identity threshold instead of the default one.
    pub async fn acquire(
        &self,
        show: &ShowRequest,
        episode: u32,
        season: u32,
        hint: ContentTypeHint,
    ) -> Vec<TorrentCandidate> {
        let queries = build_queries(&show.name, season);
        debug!(
            show = %show.name,
            episode = episode,
            season = season,
            queries = ?queries,
            "Starting acquisition"
        );

        let (mut candidates, id_lookup_failed) = self.fan_out(show, episode, &queries).await;

        candidates = dedup_candidates(candidates);
        let threshold = if id_lookup_failed {
            self.matching.strict_threshold
        } else {
            self.matching.match_threshold
        };

        let mut accepted = self.filter_candidates(candidates, show, episode, season, hint, threshold);

        // Alternate-name fallback: the primary name found nothing usable, so
        // requery with localized/romanized names, first hit wins.
        if accepted.is_empty() {
            for alternate in show
                .alternate_names
                .iter()
                .take(self.matching.max_alternate_retries)
            {
                debug!(show = %show.name, alternate = %alternate, "Retrying with alternate name");
                let alt_queries = build_queries(alternate, season);
                let (raw, _) = self.fan_out_text(&alt_queries).await;
                let deduped = dedup_candidates(raw);
                accepted =
                    self.filter_candidates(deduped, show, episode, season, hint, threshold);
                if !accepted.is_empty() {
                    break;
                }
            }
        }

        sort_candidates(&mut accepted);
        metrics::CANDIDATES_FOUND.observe(accepted.len() as f64);
        debug!(
            show = %show.name,
            episode = episode,
            accepted = accepted.len(),
            "Acquisition complete"
        );
        accepted
    }

    /// Run id lookups and text searches across all indexers concurrently.
    ///
    /// Returns the merged candidates and whether id lookup was attempted
    /// without ever producing a result.
    async fn fan_out(
        &self,
        show: &ShowRequest,
        episode: u32,
        queries: &[String],
    ) -> (Vec<TorrentCandidate>, bool) {
        let id_futures: Vec<_> = match &show.external_id {
            Some(external_id) => self
                .indexers
                .iter()
                .filter(|i| i.supports_id_lookup())
                .map(|indexer| {
                    let external_id = external_id.clone();
                    async move {
                        let result = self
                            .cached_id_lookup(indexer.as_ref(), &external_id, episode)
                            .await;
                        (indexer.clone(), result)
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        let id_attempted = !id_futures.is_empty();
        let id_results = join_all(id_futures).await;

        let mut candidates = Vec::new();
        let mut id_hit = false;
        for (indexer, result) in id_results {
            match result {
                Ok(raw) => {
                    if !raw.is_empty() {
                        id_hit = true;
                    }
                    candidates.extend(
                        raw.into_iter()
                            .map(|r| TorrentCandidate::from_raw(r, indexer.name(), true)),
                    );
                }
                Err(e) => {
                    warn!(indexer = indexer.name(), error = %e, "Id-based lookup failed");
                }
            }
        }

        let (text_candidates, _) = self.fan_out_text(queries).await;
        candidates.extend(text_candidates);

        (candidates, id_attempted && !id_hit)
    }

    /// Text-search every indexer, trying query templates in order until one
    /// yields results for that indexer.
    async fn fan_out_text(&self, queries: &[String]) -> (Vec<TorrentCandidate>, usize) {
        let search_futures: Vec<_> = self
            .indexers
            .iter()
            .map(|indexer| async move {
                for query in queries {
                    match self.cached_search(indexer.as_ref(), query).await {
                        Ok(raw) if raw.is_empty() => continue,
                        Ok(raw) => return (indexer.clone(), Some(raw)),
                        Err(e) => {
                            warn!(indexer = indexer.name(), query = %query, error = %e, "Indexer search failed");
                            return (indexer.clone(), None);
                        }
                    }
                }
                (indexer.clone(), Some(Vec::new()))
            })
            .collect();

        let results = join_all(search_futures).await;

        let mut candidates = Vec::new();
        let mut failures = 0;
        for (indexer, result) in results {
            match result {
                Some(raw) => candidates.extend(
                    raw.into_iter()
                        .map(|r| TorrentCandidate::from_raw(r, indexer.name(), false)),
                ),
                None => failures += 1,
            }
        }
        (candidates, failures)
    }

    async fn cached_id_lookup(
        &self,
        indexer: &dyn Indexer,
        external_id: &str,
        episode: u32,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        let key = cache_key(&[indexer.name(), external_id, &episode.to_string()]);
        if let Some(cached) = self.search_cache.get(&key) {
            return Ok(cached);
        }
        match indexer.lookup_by_id(external_id, episode).await {
            Ok(raw) => {
                metrics::INDEXER_QUERIES
                    .with_label_values(&[indexer.name(), "ok"])
                    .inc();
                self.search_cache.insert(key, raw.clone());
                Ok(raw)
            }
            Err(e) => {
                metrics::INDEXER_QUERIES
                    .with_label_values(&[indexer.name(), "error"])
                    .inc();
                Err(e)
            }
        }
    }

    async fn cached_search(
        &self,
        indexer: &dyn Indexer,
        query: &str,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        let key = cache_key(&[indexer.name(), query]);
        if let Some(cached) = self.search_cache.get(&key) {
            return Ok(cached);
        }
        match indexer.search(query).await {
            Ok(raw) => {
                metrics::INDEXER_QUERIES
                    .with_label_values(&[indexer.name(), "ok"])
                    .inc();
                self.search_cache.insert(key, raw.clone());
                Ok(raw)
            }
            Err(e) => {
                metrics::INDEXER_QUERIES
                    .with_label_values(&[indexer.name(), "error"])
                    .inc();
                Err(e)
            }
        }
    }

    /// Identity gate plus episode validation, decorating accepted candidates.
    fn filter_candidates(
        &self,
        candidates: Vec<TorrentCandidate>,
        show: &ShowRequest,
        episode: u32,
        season: u32,
        hint: ContentTypeHint,
        threshold: u8,
    ) -> Vec<TorrentCandidate> {
        candidates
            .into_iter()
            .filter_map(|mut candidate| {
                if !candidate.via_id_lookup {
                    let identity =
                        score_title(&candidate.title, &show.name, &show.alternate_names);
                    if identity.reason == MatchReason::SpinoffDetected
                        || identity.score < threshold
                    {
                        debug!(
                            title = %candidate.title,
                            score = identity.score,
                            reason = ?identity.reason,
                            "Rejected: show identity"
                        );
                        metrics::CANDIDATES_REJECTED
                            .with_label_values(&["identity"])
                            .inc();
                        return None;
                    }
                }

                let validation = validate_episode_with(
                    &self.classifier,
                    &candidate.title,
                    episode,
                    season,
                    hint,
                );
                if !validation.matches {
                    debug!(
                        title = %candidate.title,
                        reason = validation.reason.as_str(),
                        "Rejected: episode validation"
                    );
                    metrics::CANDIDATES_REJECTED
                        .with_label_values(&[validation.reason.as_str()])
                        .inc();
                    return None;
                }

                candidate.acceptance_reason = Some(validation.reason.as_str().to_string());
                candidate.matched_info = Some(validation.info);
                Some(candidate)
            })
            .collect()
    }
}

/// Query templates, cheapest first: a shortened name casts the widest net,
/// the full name disambiguates, and a season suffix catches later seasons
/// released under season-qualified titles.
fn build_queries(name: &str, season: u32) -> Vec<String> {
    let mut queries = Vec::new();
    let short = short_name(name);
    if short.len() >= 4 && short != name {
        queries.push(short);
    }
    queries.push(name.to_string());
    if season > 1 {
        queries.push(format!("{} S{}", name, season));
    }
    queries
}

/// The part of the name before the first subtitle separator.
fn short_name(name: &str) -> String {
    let cut = name
        .find(':')
        .or_else(|| name.find(" - "))
        .unwrap_or(name.len());
    name[..cut].trim().to_string()
}
