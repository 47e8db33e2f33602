// ABOUTME: Places "find place from text" geocoder implementing the core Geocoder trait.
// ABOUTME: Retries network and decode failures; refused requests and empty results are not retried.

use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;
use venuemap_core::geocode::venue_query;
use venuemap_core::{GeocodeError, GeocodeResult, Geocoder};

use crate::client::Fetcher;

pub const FIND_PLACE_URL: &str =
    "https://maps.googleapis.com/maps/api/place/findplacefromtext/json";

static FIND_PLACE_ENDPOINT: Lazy<Url> = Lazy::new(|| Url::parse(FIND_PLACE_URL).unwrap());

/// Statuses that mean the provider refused the request outright.
const REJECTED_STATUSES: &[&str] = &["REQUEST_DENIED", "INVALID_REQUEST", "OVER_QUERY_LIMIT"];

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    place_id: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl FindPlaceResponse {
    fn into_result(self) -> Result<Option<GeocodeResult>, GeocodeError> {
        if REJECTED_STATUSES.contains(&self.status.as_str()) {
            let message = self.error_message.unwrap_or_default();
            return Err(GeocodeError::rejected(
                format!("{} {}", self.status, message).trim_end().to_string(),
            ));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(None);
        };
        let location = candidate.geometry.and_then(|g| g.location);
        let Some((lat, lng)) = location.and_then(|l| Some((l.lat?, l.lng?))) else {
            return Ok(None);
        };

        Ok(Some(GeocodeResult {
            lat,
            lng,
            place_id: candidate.place_id,
            formatted_address: candidate.formatted_address,
        }))
    }
}

pub struct PlacesGeocoder {
    fetcher: Fetcher,
    api_key: SecretString,
    endpoint: Url,
    max_retries: u32,
    retry_delay: Duration,
    rate_limit: Duration,
}

impl PlacesGeocoder {
    pub fn new(fetcher: Fetcher, api_key: SecretString) -> Self {
        Self {
            fetcher,
            api_key,
            endpoint: FIND_PLACE_ENDPOINT.clone(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            rate_limit: Duration::ZERO,
        }
    }

    /// Point at a different endpoint (a proxy or a test server).
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Total attempts per query; zero behaves like one.
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Pause before every request.
    pub fn rate_limit(mut self, pause: Duration) -> Self {
        self.rate_limit = pause;
        self
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("input", query)
            .append_pair("inputtype", "textquery")
            .append_pair("fields", "place_id,formatted_address,geometry")
            .append_pair("key", self.api_key.expose_secret());
        url
    }

    fn find_place(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        let url = self.request_url(query);
        let attempts = self.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if !self.rate_limit.is_zero() {
                thread::sleep(self.rate_limit);
            }

            // errors are reported without the URL; it carries the key
            let outcome = self
                .fetcher
                .get(&url, "Geocode")
                .map_err(|e| e.detail())
                .and_then(|body| {
                    serde_json::from_str::<FindPlaceResponse>(&body)
                        .map_err(|e| format!("invalid response: {e}"))
                });

            match outcome {
                Ok(response) => {
                    debug!(query, status = %response.status, "places lookup");
                    return response.into_result();
                }
                Err(err) => {
                    warn!(query, attempt, attempts, error = %err, "places lookup failed");
                    last_error = err;
                }
            }

            if attempt < attempts {
                thread::sleep(self.retry_delay);
            }
        }

        Err(GeocodeError::transient(last_error))
    }
}

impl Geocoder for PlacesGeocoder {
    fn lookup(
        &self,
        name: &str,
        city: &str,
        country: &str,
    ) -> Result<Option<GeocodeResult>, GeocodeError> {
        self.find_place(&venue_query(name, city, country))
    }

    fn lookup_text(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        self.find_place(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        serde_json::from_str::<FindPlaceResponse>(body)
            .unwrap()
            .into_result()
    }

    #[test]
    fn first_candidate_wins() {
        let found = parse(
            r#"{"status":"OK","candidates":[
                {"place_id":"abc123","formatted_address":"Godthabsvej 34B, 2000 Frederiksberg, Denmark",
                 "geometry":{"location":{"lat":55.686,"lng":12.532}}},
                {"place_id":"other","geometry":{"location":{"lat":1.0,"lng":2.0}}}
            ]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.place_id, "abc123");
        assert_eq!((found.lat, found.lng), (55.686, 12.532));
    }

    #[test]
    fn zero_results_and_missing_location_are_not_found() {
        assert_eq!(parse(r#"{"status":"ZERO_RESULTS","candidates":[]}"#).unwrap(), None);
        assert_eq!(
            parse(r#"{"status":"OK","candidates":[{"place_id":"x","geometry":{"location":{"lat":1.0}}}]}"#)
                .unwrap(),
            None
        );
    }

    #[test]
    fn denied_requests_are_rejected() {
        let err = parse(r#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#)
            .unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[test]
    fn request_url_carries_all_parameters() {
        let geocoder = PlacesGeocoder::new(
            Fetcher::builder().build().unwrap(),
            SecretString::from("k3y".to_string()),
        );
        let url = geocoder.request_url("Onyx Coffee LAB, Rogers, USA");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("input".to_string(), "Onyx Coffee LAB, Rogers, USA".to_string()),
                ("inputtype".to_string(), "textquery".to_string()),
                ("fields".to_string(), "place_id,formatted_address,geometry".to_string()),
                ("key".to_string(), "k3y".to_string()),
            ]
        );
        assert!(url.as_str().starts_with(FIND_PLACE_URL));
    }
}
