// ABOUTME: Merge policy for the structured and link-grouping matchers.
// ABOUTME: Picks a primary strategy by group count and fills gaps from the other.

use std::collections::BTreeMap;

use tracing::debug;

use super::ListingCandidate;
use crate::models::Record;

/// Which matcher supplied the primary candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary {
    Structured,
    Linked,
}

/// Link grouping leads only when it found strictly more groups.
///
/// This is a count heuristic: a larger set full of junk groups still wins.
pub fn choose_primary(structured: usize, linked: usize) -> Primary {
    if linked > structured {
        Primary::Linked
    } else {
        Primary::Structured
    }
}

/// Merges both candidate sets by rank, sorted ascending.
///
/// Within one set the first candidate for a rank wins. On a collision
/// between sets the primary is kept unless only the fallback carries a
/// country. Candidates without a rank or name are dropped.
pub fn merge_candidates(
    structured: Vec<ListingCandidate>,
    linked: Vec<ListingCandidate>,
) -> Vec<ListingCandidate> {
    let primary_kind = choose_primary(structured.len(), linked.len());
    let (primary, fallback) = match primary_kind {
        Primary::Linked => (linked, structured),
        Primary::Structured => (structured, linked),
    };
    debug!(?primary_kind, "merging list candidates");

    let mut by_rank = index_by_rank(primary);
    for (rank, candidate) in index_by_rank(fallback) {
        match by_rank.get_mut(&rank) {
            None => {
                by_rank.insert(rank, candidate);
            }
            Some(existing) if existing.country.is_empty() && !candidate.country.is_empty() => {
                *existing = candidate;
            }
            Some(_) => {}
        }
    }

    by_rank.into_values().collect()
}

/// Converts candidates to records, dropping incomplete ones and sorting by rank.
pub fn finalize(candidates: Vec<ListingCandidate>, category: &str) -> Vec<Record> {
    let mut records: Vec<Record> = index_by_rank(candidates)
        .into_values()
        .filter_map(|candidate| candidate.into_record(category))
        .collect();
    records.sort_by_key(|record| record.rank);
    records
}

fn index_by_rank(candidates: Vec<ListingCandidate>) -> BTreeMap<u32, ListingCandidate> {
    let mut by_rank = BTreeMap::new();
    for candidate in candidates {
        let Some(rank) = candidate.rank.filter(|rank| *rank > 0) else {
            continue;
        };
        if candidate.name.is_empty() {
            continue;
        }
        by_rank.entry(rank).or_insert(candidate);
    }
    by_rank
}
