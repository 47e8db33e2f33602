// ABOUTME: Rust models for extracted venue data and its derived presentation shapes.
// ABOUTME: Record is the snapshot entity; the rest are produced from records per run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single ranked venue as extracted, enriched and persisted.
///
/// Field names are part of the snapshot format and must stay stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub rank: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

impl Record {
    /// Returns the coordinate pair when both halves are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Trimmed source URL, or `None` when absent or blank.
    pub fn detail_url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Outcome of fetching one record's contact address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    Ok,
    MissingSourceUrl,
    MissingContactAddress,
    FetchError,
}

impl AddressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressStatus::Ok => "ok",
            AddressStatus::MissingSourceUrl => "missing_source_url",
            AddressStatus::MissingContactAddress => "missing_contact_address",
            AddressStatus::FetchError => "fetch_error",
        }
    }
}

/// Intermediate row produced by the contact-address report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressResult {
    pub rank: u32,
    pub venue: String,
    pub country: String,
    pub category: String,
    pub address: String,
    pub source_url: String,
    pub status: AddressStatus,
    pub error: String,
}

/// Per-country marker summary for the overview map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryAggregate {
    pub country: String,
    pub count: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub lat: f64,
    pub lng: f64,
    pub color: String,
    pub marker_size_px: f64,
    /// Id of the best-ranked row in this country.
    pub primary: Option<String>,
}

/// Flat, render-ready view of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationRow {
    pub id: String,
    pub name: String,
    pub rank: u32,
    pub category: String,
    pub country_raw: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub source_url: String,
    pub map_url: String,
    pub rank_band: String,
    pub formatted_address: String,
    pub place_id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Counters describing how much of the record set needed degrading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub invalid_country_count: usize,
    pub unknown_country_count: usize,
    pub missing_city_count: usize,
    pub flagged_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_older_snapshot_rows() {
        let json = r#"{"name":"A","city":"X","country":"Y","rank":1,"category":"Top 100",
            "lat":null,"lng":null,"place_id":null,"formatted_address":null}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "A");
        assert_eq!(record.source_url, None);
        assert_eq!(record.address, None);
        assert_eq!(record.coordinates(), None);
    }

    #[test]
    fn blank_source_url_is_not_a_detail_url() {
        let record = Record {
            source_url: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(record.detail_url(), None);
    }

    #[test]
    fn address_status_serializes_snake_case() {
        let json = serde_json::to_string(&AddressStatus::MissingContactAddress).unwrap();
        assert_eq!(json, "\"missing_contact_address\"");
        assert_eq!(AddressStatus::FetchError.as_str(), "fetch_error");
    }
}
