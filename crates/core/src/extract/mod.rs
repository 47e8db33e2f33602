// ABOUTME: List-page record extraction built from independent pattern matchers.
// ABOUTME: Each matcher yields ListingCandidates; the merge policy reconciles them.

//! List-page extraction.
//!
//! Submodules:
//! - `legacy`: single-line `<li>` entries from the older markup.
//! - `structured`: rank/name/country anchor triples matched positionally.
//! - `links`: detail-link grouping over every anchor in the document.
//! - `merge`: strategy selection and rank-collision policy.

pub mod legacy;
pub mod links;
pub mod merge;
pub mod structured;

use tracing::debug;
use url::Url;

use crate::category::normalize_category;
use crate::models::Record;

pub const DEFAULT_BASE_URL: &str = "https://theworlds100bestcoffeeshops.com";
pub const TOP_100_LIST_URL: &str = "https://theworlds100bestcoffeeshops.com/top-100-coffee-shops/";
pub const SOUTH_AMERICA_LIST_URL: &str =
    "https://theworlds100bestcoffeeshops.com/top-100-coffee-shops-south/";

/// Uniform intermediate shape produced by every matcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingCandidate {
    pub rank: Option<u32>,
    pub name: String,
    pub city: String,
    pub country: String,
    pub detail_url: Option<String>,
}

impl ListingCandidate {
    /// Converts into a record; candidates missing a name or rank yield `None`.
    pub fn into_record(self, category: &str) -> Option<Record> {
        let rank = self.rank.filter(|rank| *rank > 0)?;
        if self.name.is_empty() {
            return None;
        }
        Some(Record {
            name: self.name,
            city: self.city,
            country: self.country,
            rank,
            category: category.to_string(),
            source_url: self.detail_url,
            ..Default::default()
        })
    }
}

/// Where detail links live and which URLs must never be treated as one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub base_url: String,
    /// Path fragments that mark a venue detail URL.
    pub detail_markers: Vec<String>,
    /// Absolute URLs that contain a marker but are list pages.
    pub excluded_urls: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            detail_markers: vec!["/locales/".to_string(), "/locales-south/".to_string()],
            excluded_urls: vec![
                TOP_100_LIST_URL.to_string(),
                SOUTH_AMERICA_LIST_URL.to_string(),
            ],
        }
    }
}

impl ExtractorConfig {
    /// Resolves an href against `base_url`; absolute hrefs pass through.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let base = Url::parse(&self.base_url).ok()?;
        base.join(href).ok().map(String::from)
    }

    pub fn is_detail_url(&self, url: &str) -> bool {
        self.detail_markers
            .iter()
            .any(|marker| url.contains(marker.as_str()))
            && !self.excluded_urls.iter().any(|excluded| excluded == url)
    }

    /// Resolved URL when the href points at a venue detail page.
    pub fn detail_target(&self, href: &str) -> Option<String> {
        self.resolve(href).filter(|url| self.is_detail_url(url))
    }
}

/// Extracts ranked records from one list document.
#[derive(Debug, Clone, Default)]
pub struct ListExtractor {
    config: ExtractorConfig,
}

impl ListExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Runs every matcher and returns records sorted by rank.
    ///
    /// Legacy `<li>` entries short-circuit the other matchers when present.
    pub fn extract(&self, document: &str, category: &str) -> Vec<Record> {
        let category = normalize_category(Some(category));

        let legacy = legacy::match_list_items(document, &self.config);
        if !legacy.is_empty() {
            debug!(count = legacy.len(), %category, "legacy list items matched");
            return merge::finalize(legacy, &category);
        }

        let structured = structured::match_heading_groups(document, &self.config);
        let linked = links::match_link_groups(document, &self.config);
        debug!(
            structured = structured.len(),
            linked = linked.len(),
            %category,
            "list strategies matched"
        );

        let merged = merge::merge_candidates(structured, linked);
        merge::finalize(merged, &category)
    }
}

/// Extracts records with the default configuration.
pub fn extract(document: &str, category: &str) -> Vec<Record> {
    ListExtractor::default().extract(document, category)
}
