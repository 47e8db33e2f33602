// ABOUTME: Core pipeline for venuemap: list extraction, enrichment, geo normalization and reports.
// ABOUTME: No network I/O here; fetchers and geocoders are injected by the caller.

pub mod addresses;
pub mod aggregate;
pub mod category;
pub mod change;
pub mod city;
pub mod country;
pub mod detail;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod geocode;
pub mod html_utils;
pub mod map_query;
pub mod models;
pub mod snapshot;
pub mod tables;
pub mod text;

pub use addresses::{
    apply_addresses, collect_addresses, default_report_name, missing_report_path,
    write_address_csv, write_missing_csv,
};
pub use aggregate::{aggregate_countries, build_overview, presentation_rows, rank_band, Overview};
pub use category::{category_matches, normalize_category, SOUTH_AMERICA, TOP_100};
pub use change::changed;
pub use city::CityInferer;
pub use country::CountryResolver;
pub use detail::{extract_contact_address, extract_detail, DetailInfo};
pub use enrich::{enrich, enrich_with_sleep, EnrichOptions, EnrichmentStats};
pub use error::{GeocodeError, ReportError, SnapshotError};
pub use extract::{
    extract, ExtractorConfig, ListExtractor, ListingCandidate, SOUTH_AMERICA_LIST_URL,
    TOP_100_LIST_URL,
};
pub use geocode::{geocode_records, Geocoder, GeocodeResult, GeocodeStats};
pub use html_utils::{clean_text, decode_entities, strip_html};
pub use map_query::{build_query, map_url, sanitize_query, MapQueryBuilder};
pub use models::{
    AddressResult, AddressStatus, CountryAggregate, DataQuality, PresentationRow, Record,
};
pub use snapshot::{load_snapshot, read_snapshot, save_snapshot};
pub use tables::{GeoTables, UNKNOWN_COUNTRY};

/// Default list sources as `(category, url)` pairs.
pub fn default_sources() -> Vec<(String, String)> {
    vec![
        (TOP_100.to_string(), TOP_100_LIST_URL.to_string()),
        (SOUTH_AMERICA.to_string(), SOUTH_AMERICA_LIST_URL.to_string()),
    ]
}
