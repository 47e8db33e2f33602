// ABOUTME: Integration tests for PlacesGeocoder against a local mock of the Places endpoint.
// ABOUTME: Covers hits, not-found, rejection, retry-then-recover and retry exhaustion.

use std::time::Duration;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use venuemap_core::{geocode_records, Geocoder, Record};
use venuemap_net::{Fetcher, PlacesGeocoder};

fn geocoder(server: &MockServer, attempts: u32) -> PlacesGeocoder {
    let fetcher = Fetcher::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    PlacesGeocoder::new(fetcher, SecretString::from("test-key".to_string()))
        .endpoint(Url::parse(&server.url("/place/json")).unwrap())
        .max_retries(attempts)
        .retry_delay(Duration::ZERO)
}

fn collective() -> serde_json::Value {
    json!({
        "status": "OK",
        "candidates": [{
            "place_id": "abc123",
            "formatted_address": "Godthabsvej 34B, 2000 Frederiksberg, Denmark",
            "geometry": {"location": {"lat": 55.686, "lng": 12.532}}
        }]
    })
}

#[test]
fn venue_lookup_sends_the_joined_query() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/place/json")
            .query_param("input", "Coffee Collective, Copenhagen, Denmark")
            .query_param("inputtype", "textquery")
            .query_param("key", "test-key");
        then.status(200).json_body(collective());
    });

    let found = geocoder(&server, 3)
        .lookup("Coffee Collective", "Copenhagen", "Denmark")
        .unwrap()
        .unwrap();
    mock.assert();
    assert_eq!(found.place_id, "abc123");
    assert_eq!((found.lat, found.lng), (55.686, 12.532));
}

#[test]
fn zero_results_is_not_found() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/place/json");
        then.status(200)
            .json_body(json!({"status": "ZERO_RESULTS", "candidates": []}));
    });

    let found = geocoder(&server, 3).lookup("Unknown", "Nowhere", "Noland").unwrap();
    assert_eq!(found, None);
    // not-found is an answer, so no retries
    mock.assert_calls(1);
}

#[test]
fn denied_key_is_rejected_without_retry() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/place/json");
        then.status(200).json_body(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }));
    });

    let err = geocoder(&server, 3).lookup_text("Onyx Coffee LAB").unwrap_err();
    assert!(!err.is_transient());
    mock.assert_calls(1);
}

#[test]
fn server_errors_are_retried_then_transient() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/place/json");
        then.status(503).body("unavailable");
    });

    let err = geocoder(&server, 2).lookup_text("Onyx Coffee LAB").unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("HTTP 503"));
    assert!(!err.to_string().contains("test-key"));
    mock.assert_calls(2);
}

#[test]
fn malformed_json_is_transient() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/place/json");
        then.status(200).body("{not json");
    });

    let err = geocoder(&server, 1).lookup_text("x").unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn records_fall_back_to_the_address_query() {
    let server = MockServer::start();
    let venue = server.mock(|when, then| {
        when.method(GET)
            .path("/place/json")
            .query_param("input", "Puku Puku, Lima, Peru");
        then.status(200)
            .json_body(json!({"status": "ZERO_RESULTS", "candidates": []}));
    });
    let text = server.mock(|when, then| {
        when.method(GET)
            .path("/place/json")
            .query_param("input", "Av. Larco 123, Miraflores 15074, Peru");
        then.status(200).json_body(json!({
            "status": "OK",
            "candidates": [{
                "place_id": "p2",
                "formatted_address": "Av. Larco 123, Miraflores, Peru",
                "geometry": {"location": {"lat": -12.12, "lng": -77.03}}
            }]
        }));
    });

    let mut records = vec![Record {
        name: "Puku Puku".into(),
        city: "Lima".into(),
        country: "Peru".into(),
        rank: 1,
        category: "South America".into(),
        address: Some("Av. Larco 123, Miraflores 15074, Peru".into()),
        ..Default::default()
    }];
    let stats = geocode_records(&mut records, &geocoder(&server, 1));

    venue.assert();
    text.assert();
    assert_eq!(stats.resolved_by_fallback, 1);
    assert_eq!(records[0].place_id.as_deref(), Some("p2"));
    assert_eq!(records[0].lat, Some(-12.12));
}
