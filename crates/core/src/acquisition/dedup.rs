//! Candidate deduplication and ordering.
//!
//! Different indexers routinely surface the same underlying torrent. The
//! info hash is the identity: collisions are merged, and the id-lookup
//! sourced copy wins because its show identity is already proven.

use std::collections::HashMap;

use super::types::TorrentCandidate;

/// Merge candidates sharing an info hash, keeping the preferable copy.
pub fn dedup_candidates(candidates: Vec<TorrentCandidate>) -> Vec<TorrentCandidate> {
    let mut by_hash: HashMap<String, TorrentCandidate> = HashMap::new();
    let mut hashless = Vec::new();

    for candidate in candidates {
        if candidate.info_hash.is_empty() {
            hashless.push(candidate);
            continue;
        }
        match by_hash.get_mut(&candidate.info_hash) {
            None => {
                by_hash.insert(candidate.info_hash.clone(), candidate);
            }
            Some(existing) => {
                if prefer_replacement(existing, &candidate) {
                    *existing = candidate;
                }
            }
        }
    }

    let mut merged: Vec<TorrentCandidate> = by_hash.into_values().collect();
    merged.extend(hashless);
    merged
}

fn prefer_replacement(existing: &TorrentCandidate, replacement: &TorrentCandidate) -> bool {
    if existing.via_id_lookup != replacement.via_id_lookup {
        return replacement.via_id_lookup;
    }
    replacement.seeders > existing.seeders
}

/// Sort best-first: quality tier, then seeders descending.
pub fn sort_candidates(candidates: &mut [TorrentCandidate]) {
    candidates.sort_by(|a, b| {
        a.quality
            .cmp(&b.quality)
            .then_with(|| b.seeders.cmp(&a.seeders))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::types::{Quality, RawRelease};

    fn make_candidate(hash: &str, seeders: u32, via_id: bool) -> TorrentCandidate {
        TorrentCandidate::from_raw(
            RawRelease {
                title: format!("Show - 05 seed{seeders}"),
                info_hash: hash.to_string(),
                magnet: format!("magnet:?xt=urn:btih:{hash}"),
                seeders,
                size_label: "1.4 GiB".to_string(),
                published_at: None,
            },
            "test",
            via_id,
        )
    }

    #[test]
    fn test_dedup_merges_same_hash() {
        let result = dedup_candidates(vec![
            make_candidate("aa", 10, false),
            make_candidate("aa", 50, false),
            make_candidate("bb", 5, false),
        ]);
        assert_eq!(result.len(), 2);
        let aa = result.iter().find(|c| c.info_hash == "aa").unwrap();
        assert_eq!(aa.seeders, 50);
    }

    #[test]
    fn test_dedup_id_lookup_wins_over_seeders() {
        let result = dedup_candidates(vec![
            make_candidate("aa", 100, false),
            make_candidate("aa", 1, true),
        ]);
        assert_eq!(result.len(), 1);
        assert!(result[0].via_id_lookup);
        assert_eq!(result[0].seeders, 1);
    }

    #[test]
    fn test_dedup_keeps_hashless_entries() {
        let result = dedup_candidates(vec![
            make_candidate("", 10, false),
            make_candidate("", 20, false),
        ]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_sort_quality_then_seeders() {
        let mut candidates = vec![
            make_candidate("aa", 100, false),
            make_candidate("bb", 5, false),
            make_candidate("cc", 50, false),
        ];
        candidates[0].quality = Quality::P720;
        candidates[1].quality = Quality::P1080;
        candidates[2].quality = Quality::P1080;
        sort_candidates(&mut candidates);
        assert_eq!(candidates[0].info_hash, "cc");
        assert_eq!(candidates[1].info_hash, "bb");
        assert_eq!(candidates[2].info_hash, "aa");
    }
}
