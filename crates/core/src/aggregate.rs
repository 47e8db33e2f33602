// ABOUTME: Presentation rows, data-quality counters and per-country aggregation.
// ABOUTME: Everything here is derived from records; nothing is persisted.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::category::normalize_category;
use crate::city::CityInferer;
use crate::country::CountryResolver;
use crate::html_utils::clean_text;
use crate::map_query::MapQueryBuilder;
use crate::models::{CountryAggregate, DataQuality, PresentationRow, Record};
use crate::tables::{GeoTables, UNKNOWN_COUNTRY};

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

const RANK_BANDS: &[(u32, u32, &str)] = &[
    (1, 10, "1-10"),
    (11, 25, "11-25"),
    (26, 50, "26-50"),
    (51, 100, "51-100"),
];

const MIN_MARKER_PX: f64 = 16.0;
const MARKER_RANGE_PX: f64 = 40.0;

/// Everything an overview renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub rows: Vec<PresentationRow>,
    pub countries: Vec<CountryAggregate>,
    pub data_quality: DataQuality,
}

pub fn rank_band(rank: u32) -> &'static str {
    RANK_BANDS
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&rank))
        .map(|(_, _, band)| *band)
        .unwrap_or("Other")
}

/// Stable slug of `category-rank-name`.
pub fn row_id(record: &Record) -> String {
    let base = format!(
        "{}-{}-{}",
        normalize_category(Some(&record.category)),
        record.rank,
        record.name
    )
    .to_lowercase();
    let slug = SLUG_RE.replace_all(&base, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("venue-{}", record.rank)
    } else {
        slug.to_string()
    }
}

/// Canonical country with invalid input folded into `Unknown`.
fn canonical_country(countries: &CountryResolver<'_>, raw: &str) -> (String, bool) {
    let (canonical, invalid) = countries.normalize(Some(raw));
    if invalid {
        (UNKNOWN_COUNTRY.to_string(), true)
    } else {
        (canonical, false)
    }
}

/// Builds one row per record plus counters for degraded values.
pub fn presentation_rows(
    records: &[Record],
    tables: &GeoTables,
) -> (Vec<PresentationRow>, DataQuality) {
    let countries = CountryResolver::new(tables);
    let cities = CityInferer::new(tables);
    let maps = MapQueryBuilder::new(tables);

    let mut quality = DataQuality::default();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let (country, invalid) = canonical_country(&countries, &record.country);
        let city = cities.infer_for_record(record, &country);
        let id = row_id(record);

        if invalid {
            quality.invalid_country_count += 1;
            quality.flagged_ids.push(id.clone());
        }
        if country == UNKNOWN_COUNTRY {
            quality.unknown_country_count += 1;
        }
        if city.is_empty() {
            quality.missing_city_count += 1;
        }

        rows.push(PresentationRow {
            id,
            name: clean_text(&record.name),
            rank: record.rank,
            category: normalize_category(Some(&record.category)),
            country_raw: clean_text(&record.country),
            country,
            city,
            address: clean_optional(&record.address),
            source_url: clean_optional(&record.source_url),
            map_url: maps.url(record),
            rank_band: rank_band(record.rank).to_string(),
            formatted_address: clean_optional(&record.formatted_address),
            place_id: clean_optional(&record.place_id),
            lat: record.lat,
            lng: record.lng,
        });
    }

    (rows, quality)
}

fn clean_optional(value: &Option<String>) -> String {
    clean_text(value.as_deref().unwrap_or_default())
}

#[derive(Default)]
struct CountryBucket {
    count: usize,
    category_counts: BTreeMap<String, usize>,
    lat_sum: f64,
    lng_sum: f64,
    located: usize,
    primary: Option<(u32, String)>,
}

/// Groups records by canonical country, sorted by count desc then country asc.
///
/// The centroid is the mean of member coordinates, or the table centroid
/// when no member has any.
pub fn aggregate_countries(records: &[Record], tables: &GeoTables) -> Vec<CountryAggregate> {
    let countries = CountryResolver::new(tables);
    let mut buckets: BTreeMap<String, CountryBucket> = BTreeMap::new();

    for record in records {
        let (country, _) = canonical_country(&countries, &record.country);
        let bucket = buckets.entry(country).or_default();

        bucket.count += 1;
        *bucket
            .category_counts
            .entry(normalize_category(Some(&record.category)))
            .or_default() += 1;

        if let Some((lat, lng)) = record.coordinates() {
            bucket.lat_sum += lat;
            bucket.lng_sum += lng;
            bucket.located += 1;
        }

        let better = bucket
            .primary
            .as_ref()
            .map_or(true, |(rank, _)| record.rank < *rank);
        if better {
            bucket.primary = Some((record.rank, row_id(record)));
        }
    }

    let max_count = buckets.values().map(|b| b.count).max().unwrap_or(1).max(1);

    let mut out: Vec<CountryAggregate> = buckets
        .into_iter()
        .map(|(country, bucket)| {
            let (lat, lng) = if bucket.located > 0 {
                (
                    bucket.lat_sum / bucket.located as f64,
                    bucket.lng_sum / bucket.located as f64,
                )
            } else {
                tables.centroid(&country)
            };
            let ratio = bucket.count as f64 / max_count as f64;

            CountryAggregate {
                color: tables.color(&country).to_string(),
                country,
                count: bucket.count,
                category_counts: bucket.category_counts,
                lat,
                lng,
                marker_size_px: round2(MIN_MARKER_PX + ratio * MARKER_RANGE_PX),
                primary: bucket.primary.map(|(_, id)| id),
            }
        })
        .collect();

    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.country.cmp(&b.country)));
    out
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rows, country aggregates and data quality in one pass over the records.
pub fn build_overview(records: &[Record], tables: &GeoTables) -> Overview {
    let (rows, data_quality) = presentation_rows(records, tables);
    Overview {
        rows,
        countries: aggregate_countries(records, tables),
        data_quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(rank: u32, name: &str, country: &str, category: &str) -> Record {
        Record {
            name: name.into(),
            country: country.into(),
            rank,
            category: category.into(),
            ..Default::default()
        }
    }

    #[test]
    fn rank_bands_cover_the_list() {
        assert_eq!(rank_band(1), "1-10");
        assert_eq!(rank_band(25), "11-25");
        assert_eq!(rank_band(26), "26-50");
        assert_eq!(rank_band(100), "51-100");
        assert_eq!(rank_band(101), "Other");
        assert_eq!(rank_band(0), "Other");
    }

    #[test]
    fn row_ids_are_slugs() {
        assert_eq!(
            row_id(&record(3, "Toby's Estate", "Australia", "main")),
            "top-100-3-toby-s-estate"
        );
        assert_eq!(row_id(&record(7, "", "", "")), "7");
    }

    #[test]
    fn aggregates_group_sort_and_size() {
        let mut located = record(4, "D", "USA", "Top 100");
        located.lat = Some(10.0);
        located.lng = Some(20.0);
        let mut located_too = record(2, "B", "eeuu", "Top 100");
        located_too.lat = Some(20.0);
        located_too.lng = Some(40.0);

        let records = vec![
            located,
            located_too,
            record(1, "A", "Peru", "South"),
            record(9, "Z", "Chile", "South America"),
            record(5, "E", "123", "Top 100"),
        ];
        let aggregates = aggregate_countries(&records, GeoTables::builtin());

        let order: Vec<&str> = aggregates.iter().map(|a| a.country.as_str()).collect();
        assert_eq!(order, vec!["USA", "Chile", "Peru", "Unknown"]);

        let usa = &aggregates[0];
        assert_eq!(usa.count, 2);
        assert_eq!((usa.lat, usa.lng), (15.0, 30.0));
        assert_eq!(usa.marker_size_px, 56.0);
        assert_eq!(usa.primary.as_deref(), Some("top-100-2-b"));
        assert_eq!(usa.color, "#E2ACB7");

        let peru = &aggregates[2];
        assert_eq!((peru.lat, peru.lng), (-9.19, -75.0152));
        assert_eq!(peru.marker_size_px, 36.0);
        assert_eq!(peru.category_counts.get("South America"), Some(&1));

        assert_eq!((aggregates[3].lat, aggregates[3].lng), (8.0, 0.0));
    }

    #[test]
    fn rows_track_data_quality() {
        let mut with_address = record(1, "Onyx", "EEUU", "Top 100");
        with_address.address = Some("101 E Walnut Ave, Rogers, AR 72756, USA".into());
        let records = vec![with_address, record(2, "Mystery", "4000", "Top 100")];

        let (rows, quality) = presentation_rows(&records, GeoTables::builtin());
        assert_eq!(rows[0].country, "USA");
        assert_eq!(rows[0].country_raw, "EEUU");
        assert_eq!(rows[0].city, "Rogers");
        assert_eq!(rows[0].rank_band, "1-10");
        assert!(rows[0].map_url.starts_with("https://www.google.com/maps/search/?api=1&query="));
        assert_eq!(rows[1].country, "Unknown");
        assert_eq!(
            quality,
            DataQuality {
                invalid_country_count: 1,
                unknown_country_count: 1,
                missing_city_count: 1,
                flagged_ids: vec!["top-100-2-mystery".into()],
            }
        );
    }
}
