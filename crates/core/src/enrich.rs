// ABOUTME: Sequential detail-page enrichment with bounded retries and a fixed inter-record delay.
// ABOUTME: Fetching and sleeping are injected so the policy is testable without a network.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::detail::extract_detail;
use crate::models::Record;

/// Retry and rate-limit policy for detail fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Pause after every record, fetched or not.
    pub delay: Duration,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Pause between failed attempts for the same record.
    pub retry_interval: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            retries: 2,
            retry_interval: Duration::from_millis(500),
        }
    }
}

/// Stats returned from enrichment to aid diagnostics/tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Records that had a detail URL.
    pub attempted: usize,
    /// Records without a detail URL.
    pub skipped: usize,
    /// Records whose detail page could not be fetched after every retry.
    pub failed: usize,
    /// Records that received a city or an address.
    pub updated: usize,
    /// Total fetch calls, including retries.
    pub fetch_calls: usize,
}

/// Enriches a copy of `records` from their detail pages, sleeping with `thread::sleep`.
pub fn enrich<F, E>(
    records: &[Record],
    fetch: F,
    options: EnrichOptions,
) -> (Vec<Record>, EnrichmentStats)
where
    F: FnMut(&str) -> Result<String, E>,
    E: Display,
{
    enrich_with_sleep(records, fetch, options, thread::sleep)
}

/// Like [`enrich`] with an injectable sleep.
///
/// Every error is retried the same way. When all attempts fail the record
/// keeps its list-page values.
pub fn enrich_with_sleep<F, E, S>(
    records: &[Record],
    mut fetch: F,
    options: EnrichOptions,
    mut sleep: S,
) -> (Vec<Record>, EnrichmentStats)
where
    F: FnMut(&str) -> Result<String, E>,
    E: Display,
    S: FnMut(Duration),
{
    let mut stats = EnrichmentStats::default();
    let mut out = Vec::with_capacity(records.len());

    for original in records {
        let mut record = original.clone();

        if let Some(url) = original.detail_url() {
            stats.attempted += 1;
            match fetch_with_retries(url, &mut fetch, &options, &mut sleep, &mut stats) {
                Some(document) => {
                    if apply_detail(&mut record, &document) {
                        stats.updated += 1;
                    }
                }
                None => stats.failed += 1,
            }
        } else {
            debug!(rank = record.rank, name = %record.name, "no detail url, skipping");
            stats.skipped += 1;
        }

        out.push(record);
        sleep(options.delay);
    }

    info!(
        attempted = stats.attempted,
        updated = stats.updated,
        failed = stats.failed,
        skipped = stats.skipped,
        "detail enrichment finished"
    );
    (out, stats)
}

fn fetch_with_retries<F, E, S>(
    url: &str,
    fetch: &mut F,
    options: &EnrichOptions,
    sleep: &mut S,
    stats: &mut EnrichmentStats,
) -> Option<String>
where
    F: FnMut(&str) -> Result<String, E>,
    E: Display,
    S: FnMut(Duration),
{
    let attempts = options.retries.saturating_add(1);
    for attempt in 1..=attempts {
        stats.fetch_calls += 1;
        match fetch(url) {
            Ok(document) => return Some(document),
            Err(err) => {
                warn!(%url, attempt, attempts, error = %err, "detail fetch failed");
                if attempt < attempts {
                    sleep(options.retry_interval);
                }
            }
        }
    }
    None
}

/// Writes non-empty detail values onto the record; true when anything changed.
fn apply_detail(record: &mut Record, document: &str) -> bool {
    let info = extract_detail(document, &record.country);
    let mut changed = false;

    if let Some(city) = info.city.filter(|city| !city.is_empty()) {
        record.city = city;
        changed = true;
    }
    if let Some(address) = info.address.filter(|address| !address.is_empty()) {
        record.address = Some(address);
        changed = true;
    }
    changed
}
