// ABOUTME: Builds the map search text and URL for a record.
// ABOUTME: Address text is sanitized and comma segments are deduplicated before use.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

use crate::country::CountryResolver;
use crate::html_utils::clean_text;
use crate::models::Record;
use crate::tables::GeoTables;
use crate::text::normalize_label;

pub const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const FALLBACK_QUERY: &str = "Venue";

static WAY_BUILDING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bway number:\s*\d+\s*building number:\s*\d+\s*,?\s*").unwrap()
});
static BUILDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbuilding number:\s*\d+\s*,?\s*").unwrap());
static UNKNOWN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bunknown\b").unwrap());
static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());
static REPEATED_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(,\s*){2,}").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Cleans address-like text for use as a map search.
///
/// When `country` has a comparable label, comma segments are deduplicated
/// (ASCII-folded, case-insensitive, first occurrence and casing kept) and
/// segments without letters are dropped. Otherwise segments are left alone.
pub fn sanitize_query(text: &str, country: &str) -> String {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return String::new();
    }

    let cleaned = WAY_BUILDING_RE.replace_all(&cleaned, "");
    let cleaned = BUILDING_RE.replace_all(&cleaned, "");
    let cleaned = UNKNOWN_RE.replace_all(&cleaned, "");
    let cleaned = COMMA_RE.replace_all(&cleaned, ", ");
    let cleaned = REPEATED_COMMA_RE.replace_all(&cleaned, ", ");
    let cleaned = MULTI_SPACE_RE.replace_all(&cleaned, " ");
    let cleaned = trim_separators(&cleaned);

    if normalize_label(country).is_empty() {
        return cleaned.to_string();
    }

    let mut seen = HashSet::new();
    let segments: Vec<&str> = cleaned
        .split(',')
        .map(str::trim)
        .filter(|segment| {
            let label = normalize_label(segment);
            !label.is_empty() && seen.insert(label)
        })
        .collect();

    trim_separators(&segments.join(", ")).to_string()
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == ',')
}

/// Produces search text and URLs for records.
#[derive(Debug, Clone, Copy)]
pub struct MapQueryBuilder<'a> {
    countries: CountryResolver<'a>,
}

impl<'a> MapQueryBuilder<'a> {
    pub fn new(tables: &'a GeoTables) -> Self {
        Self {
            countries: CountryResolver::new(tables),
        }
    }

    /// Best search text: formatted address, then address, then `name, city, country`.
    pub fn query(&self, record: &Record) -> String {
        for text in [&record.formatted_address, &record.address] {
            let sanitized =
                sanitize_query(text.as_deref().unwrap_or_default().trim(), &record.country);
            if !sanitized.is_empty() {
                return sanitized;
            }
        }

        let name = clean_text(&record.name);
        let city = clean_text(&record.city);
        let country = self.countries.display(&record.country);

        let parts: Vec<&str> = if !city.is_empty() {
            vec![name.as_str(), city.as_str(), country.as_str()]
        } else if !country.is_empty() {
            vec![name.as_str(), country.as_str()]
        } else {
            vec![name.as_str()]
        };
        let query = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let sanitized = sanitize_query(&query, &country);
        if !sanitized.is_empty() {
            sanitized
        } else if !name.is_empty() {
            name
        } else {
            FALLBACK_QUERY.to_string()
        }
    }

    /// Map search URL with a fixed parameter order.
    pub fn url(&self, record: &Record) -> String {
        let query = self.query(record);
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("api", "1");
        params.append_pair("query", &query);
        if let Some(place_id) = record
            .place_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            params.append_pair("query_place_id", place_id);
        }
        format!("{MAPS_SEARCH_URL}?{}", params.finish())
    }
}

/// Search text for a record using the builtin tables.
pub fn build_query(record: &Record) -> String {
    MapQueryBuilder::new(GeoTables::builtin()).query(record)
}

/// Map search URL for a record using the builtin tables.
pub fn map_url(record: &Record) -> String {
    MapQueryBuilder::new(GeoTables::builtin()).url(record)
}
