// ABOUTME: Geocoding collaborator interface and the record-level geocoding pass.
// ABOUTME: Not-found falls back to a text query; transient failures leave the record as-is.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GeocodeError;
use crate::map_query::build_query;
use crate::models::Record;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub place_id: String,
    pub formatted_address: String,
}

/// Looks up coordinates for venues.
///
/// `Ok(None)` means the provider had no match; `Err` means the lookup
/// itself failed.
pub trait Geocoder {
    fn lookup(
        &self,
        name: &str,
        city: &str,
        country: &str,
    ) -> Result<Option<GeocodeResult>, GeocodeError>;

    fn lookup_text(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError>;
}

/// `name, city, country` with blank parts left out.
pub fn venue_query(name: &str, city: &str, country: &str) -> String {
    [name, city, country]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeStats {
    pub resolved: usize,
    /// Resolved only by the text-query fallback.
    pub resolved_by_fallback: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Geocodes every record in place.
pub fn geocode_records<G>(records: &mut [Record], geocoder: &G) -> GeocodeStats
where
    G: Geocoder + ?Sized,
{
    let mut stats = GeocodeStats::default();

    for record in records.iter_mut() {
        match geocode_one(record, geocoder) {
            Ok(Some((result, used_fallback))) => {
                record.lat = Some(result.lat);
                record.lng = Some(result.lng);
                record.place_id = Some(result.place_id).filter(|id| !id.is_empty());
                if !result.formatted_address.is_empty() {
                    record.formatted_address = Some(result.formatted_address);
                }
                stats.resolved += 1;
                if used_fallback {
                    stats.resolved_by_fallback += 1;
                }
            }
            Ok(None) => {
                debug!(rank = record.rank, name = %record.name, "no geocoding match");
                stats.not_found += 1;
            }
            Err(err) => {
                warn!(rank = record.rank, name = %record.name, error = %err, "geocoding failed");
                stats.failed += 1;
            }
        }
    }

    info!(
        resolved = stats.resolved,
        fallback = stats.resolved_by_fallback,
        not_found = stats.not_found,
        failed = stats.failed,
        "geocoding finished"
    );
    stats
}

fn geocode_one<G>(
    record: &Record,
    geocoder: &G,
) -> Result<Option<(GeocodeResult, bool)>, GeocodeError>
where
    G: Geocoder + ?Sized,
{
    if let Some(found) = geocoder.lookup(&record.name, &record.city, &record.country)? {
        return Ok(Some((found, false)));
    }

    let primary = venue_query(&record.name, &record.city, &record.country);
    let fallback = build_query(record);
    if fallback.eq_ignore_ascii_case(&primary) {
        return Ok(None);
    }
    Ok(geocoder.lookup_text(&fallback)?.map(|found| (found, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedGeocoder {
        venue: Result<Option<GeocodeResult>, ()>,
        text: Option<GeocodeResult>,
        text_queries: RefCell<Vec<String>>,
    }

    impl Geocoder for ScriptedGeocoder {
        fn lookup(&self, _: &str, _: &str, _: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
            self.venue
                .clone()
                .map_err(|_| GeocodeError::transient("connection reset"))
        }

        fn lookup_text(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
            self.text_queries.borrow_mut().push(query.to_string());
            Ok(self.text.clone())
        }
    }

    fn place(id: &str) -> GeocodeResult {
        GeocodeResult {
            lat: -12.12,
            lng: -77.03,
            place_id: id.into(),
            formatted_address: "Av. Larco 123, Miraflores, Peru".into(),
        }
    }

    fn record() -> Record {
        Record {
            name: "Puku Puku".into(),
            city: "Lima".into(),
            country: "Peru".into(),
            rank: 1,
            category: "South America".into(),
            address: Some("Av. Larco 123, Miraflores 15074, Peru".into()),
            ..Default::default()
        }
    }

    #[test]
    fn direct_hit_updates_the_record() {
        let geocoder = ScriptedGeocoder {
            venue: Ok(Some(place("p1"))),
            text: None,
            text_queries: RefCell::default(),
        };
        let mut records = vec![record()];
        let stats = geocode_records(&mut records, &geocoder);

        assert_eq!(stats.resolved, 1);
        assert_eq!(records[0].coordinates(), Some((-12.12, -77.03)));
        assert_eq!(records[0].place_id.as_deref(), Some("p1"));
        assert!(geocoder.text_queries.borrow().is_empty());
    }

    #[test]
    fn not_found_falls_back_to_the_address_query() {
        let geocoder = ScriptedGeocoder {
            venue: Ok(None),
            text: Some(place("p2")),
            text_queries: RefCell::default(),
        };
        let mut records = vec![record()];
        let stats = geocode_records(&mut records, &geocoder);

        assert_eq!(stats.resolved_by_fallback, 1);
        assert_eq!(
            geocoder.text_queries.borrow().as_slice(),
            ["Av. Larco 123, Miraflores 15074, Peru".to_string()]
        );
        assert_eq!(records[0].place_id.as_deref(), Some("p2"));
    }

    #[test]
    fn transient_failure_leaves_the_record_untouched() {
        let geocoder = ScriptedGeocoder {
            venue: Err(()),
            text: Some(place("never")),
            text_queries: RefCell::default(),
        };
        let mut records = vec![record()];
        let stats = geocode_records(&mut records, &geocoder);

        assert_eq!(stats.failed, 1);
        assert_eq!(records[0], record());
        assert!(geocoder.text_queries.borrow().is_empty());
    }

    #[test]
    fn venue_query_skips_blank_parts() {
        assert_eq!(venue_query("Onyx", " ", "USA"), "Onyx, USA");
    }
}
