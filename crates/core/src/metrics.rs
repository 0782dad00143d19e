//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Torrent acquisition (indexer queries, candidate filtering)
//! - Debrid resolution (outcomes, poll attempts)
//! - Resolution caches (hits, misses, evictions)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Acquisition metrics
// =============================================================================

/// Indexer queries total by indexer and result.
pub static INDEXER_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("miru_indexer_queries_total", "Total indexer queries"),
        &["indexer", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Candidates accepted per acquisition, after identity and episode filtering.
pub static CANDIDATES_FOUND: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "miru_candidates_found",
            "Number of candidates accepted per acquisition, after filtering",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

/// Candidates rejected during filtering, by reason.
pub static CANDIDATES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "miru_candidates_rejected_total",
            "Candidates rejected during episode/identity filtering",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Debrid resolution metrics
// =============================================================================

/// Resolution attempts by provider and outcome.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("miru_resolutions_total", "Total debrid resolution attempts"),
        &["provider", "outcome"], // outcome: "ready", "pending", "mislabeled", "error"
    )
    .unwrap()
});

/// Poll attempts spent per resolution.
pub static RESOLUTION_POLLS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "miru_resolution_polls",
            "Status poll attempts spent per resolution",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0]),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Cache metrics
// =============================================================================

pub static CACHE_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("miru_cache_hits_total", "Cache hits"), &["cache"]).unwrap()
});

pub static CACHE_MISSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("miru_cache_misses_total", "Cache misses"),
        &["cache"],
    )
    .unwrap()
});

pub static CACHE_EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("miru_cache_evictions_total", "Cache entries evicted"),
        &["cache"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(INDEXER_QUERIES.clone()),
        Box::new(CANDIDATES_FOUND.clone()),
        Box::new(CANDIDATES_REJECTED.clone()),
        Box::new(RESOLUTIONS.clone()),
        Box::new(RESOLUTION_POLLS.clone()),
        Box::new(CACHE_HITS.clone()),
        Box::new(CACHE_MISSES.clone()),
        Box::new(CACHE_EVICTIONS.clone()),
    ]
}
