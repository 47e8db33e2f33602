// ABOUTME: Contact-address report: per-record fetch status, CSV output and snapshot write-back.
// ABOUTME: Fetching is injected; a failed fetch becomes a fetch_error row, never an abort.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::category::{category_matches, normalize_category};
use crate::detail::extract_contact_address;
use crate::error::ReportError;
use crate::models::{AddressResult, AddressStatus, Record};

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").unwrap());

#[derive(Serialize)]
struct AddressRow<'a> {
    #[serde(rename = "Rank")]
    rank: u32,
    #[serde(rename = "Venue")]
    venue: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Address")]
    address: &'a str,
}

#[derive(Serialize)]
struct MissingRow<'a> {
    #[serde(rename = "Rank")]
    rank: u32,
    #[serde(rename = "Venue")]
    venue: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
    #[serde(rename = "Source URL")]
    source_url: &'a str,
    #[serde(rename = "Reason")]
    reason: &'a str,
    #[serde(rename = "Error")]
    error: &'a str,
}

/// Fetches each matching record's detail page and pulls its contact address.
///
/// Records are visited in (rank, name) order; `filter` is a category or
/// `all`; `limit` caps the number of rows produced.
pub fn collect_addresses<F, E>(
    records: &[Record],
    filter: &str,
    mut fetch: F,
    limit: Option<usize>,
) -> Vec<AddressResult>
where
    F: FnMut(&str) -> Result<String, E>,
    E: Display,
{
    let mut ordered: Vec<&Record> = records
        .iter()
        .filter(|record| category_matches(filter, &record.category))
        .collect();
    ordered.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.name.cmp(&b.name)));

    let limit = limit.unwrap_or(usize::MAX);
    let mut results = Vec::new();

    for record in ordered.into_iter().take(limit) {
        let source_url = record.detail_url().unwrap_or_default().to_string();
        let mut result = AddressResult {
            rank: record.rank,
            venue: record.name.clone(),
            country: record.country.clone(),
            category: normalize_category(Some(&record.category)),
            address: String::new(),
            source_url: source_url.clone(),
            status: AddressStatus::Ok,
            error: String::new(),
        };

        if source_url.is_empty() {
            result.status = AddressStatus::MissingSourceUrl;
        } else {
            match fetch(&source_url) {
                Ok(document) => match extract_contact_address(&document) {
                    Some(address) => result.address = address,
                    None => result.status = AddressStatus::MissingContactAddress,
                },
                Err(err) => {
                    warn!(url = %source_url, error = %err, "contact page fetch failed");
                    result.status = AddressStatus::FetchError;
                    result.error = err.to_string();
                }
            }
        }

        debug!(rank = result.rank, status = result.status.as_str(), "address row");
        results.push(result);
    }

    results
}

fn create_parent(path: &Path) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes `Rank, Venue, Country, Address` for every row.
pub fn write_address_csv(results: &[AddressResult], path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(AddressRow {
            rank: result.rank,
            venue: &result.venue,
            country: &result.country,
            address: &result.address,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `Rank, Venue, Country, Source URL, Reason, Error` for rows that are not ok.
pub fn write_missing_csv(results: &[AddressResult], path: &Path) -> Result<(), ReportError> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    let mut wrote_any = false;
    for result in results.iter().filter(|r| r.status != AddressStatus::Ok) {
        writer.serialize(MissingRow {
            rank: result.rank,
            venue: &result.venue,
            country: &result.country,
            source_url: &result.source_url,
            reason: result.status.as_str(),
            error: &result.error,
        })?;
        wrote_any = true;
    }
    if !wrote_any {
        // serialize() emits headers lazily; an empty report still gets one
        writer.write_record(["Rank", "Venue", "Country", "Source URL", "Reason", "Error"])?;
    }
    writer.flush()?;
    Ok(())
}

/// Default report file name for a category filter.
pub fn default_report_name(filter: &str) -> String {
    if filter.trim().eq_ignore_ascii_case("all") {
        return "all venues address.csv".to_string();
    }
    format!(
        "{} venues address.csv",
        normalize_category(Some(filter)).to_lowercase()
    )
}

/// `<stem> missing.csv` next to the address report.
pub fn missing_report_path(report: &Path) -> PathBuf {
    let stem = report
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "addresses".to_string());
    report.with_file_name(format!("{stem} missing.csv"))
}

fn record_key(category: &str, rank: u32, name: &str) -> String {
    let name = NON_WORD_RE.replace_all(&name.to_lowercase(), "").into_owned();
    format!("{}::{}::{}", normalize_category(Some(category)), rank, name)
}

/// Copies ok addresses into `formatted_address`; returns how many records changed.
pub fn apply_addresses(records: &mut [Record], results: &[AddressResult]) -> usize {
    let by_key: HashMap<String, &str> = results
        .iter()
        .filter(|r| r.status == AddressStatus::Ok && !r.address.is_empty())
        .map(|r| (record_key(&r.category, r.rank, &r.venue), r.address.as_str()))
        .collect();

    let mut updated = 0;
    for record in records.iter_mut() {
        let key = record_key(&record.category, record.rank, &record.name);
        let Some(address) = by_key.get(&key) else {
            continue;
        };
        let current = record.formatted_address.as_deref().unwrap_or_default().trim();
        if current == *address {
            continue;
        }
        record.formatted_address = Some(address.to_string());
        updated += 1;
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const CONTACT: &str = r#"<h2>Contact</h2><p class="elementor-heading-title">Cl. 81a #8-23, Bogota, Colombia</p>"#;

    fn record(rank: u32, name: &str, category: &str, url: Option<&str>) -> Record {
        Record {
            name: name.into(),
            country: "Colombia".into(),
            rank,
            category: category.into(),
            source_url: url.map(String::from),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(3, "Broken", "South", Some("https://x/locales-south/broken/")),
            record(1, "Tropicalia", "South America", Some("https://x/locales-south/tropicalia/")),
            record(2, "No Url", "South America", None),
            record(4, "Bare", "South America", Some("https://x/locales-south/bare/")),
            record(1, "Onyx", "Top 100", Some("https://x/locales/onyx/")),
        ]
    }

    fn fetch(url: &str) -> Result<String, String> {
        if url.contains("broken") {
            Err("HTTP 503".to_string())
        } else if url.contains("bare") {
            Ok("<h2>About</h2>".to_string())
        } else {
            Ok(CONTACT.to_string())
        }
    }

    #[test]
    fn classifies_each_row() {
        let results = collect_addresses(&sample(), "South America", fetch, None);
        let summary: Vec<(u32, &str)> =
            results.iter().map(|r| (r.rank, r.status.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (1, "ok"),
                (2, "missing_source_url"),
                (3, "fetch_error"),
                (4, "missing_contact_address"),
            ]
        );
        assert_eq!(results[0].address, "Cl. 81a #8-23, Bogota, Colombia");
        assert_eq!(results[2].error, "HTTP 503");
        assert_eq!(results[2].category, "South America");
    }

    #[test]
    fn limit_and_all_filter() {
        let results = collect_addresses(&sample(), "all", fetch, Some(2));
        let names: Vec<&str> = results.iter().map(|r| r.venue.as_str()).collect();
        assert_eq!(names, vec!["Onyx", "Tropicalia"]);
    }

    #[test]
    fn writes_both_reports() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("out").join("south america venues address.csv");
        let missing = missing_report_path(&report);
        let results = collect_addresses(&sample(), "south", fetch, None);

        write_address_csv(&results, &report).unwrap();
        write_missing_csv(&results, &missing).unwrap();

        let report_text = fs::read_to_string(&report).unwrap();
        assert!(report_text.starts_with("Rank,Venue,Country,Address\n"));
        assert!(report_text.contains("1,Tropicalia,Colombia,\"Cl. 81a #8-23, Bogota, Colombia\""));

        let missing_text = fs::read_to_string(&missing).unwrap();
        assert_eq!(missing_text.lines().count(), 4);
        assert!(missing_text.contains("3,Broken,Colombia,https://x/locales-south/broken/,fetch_error,HTTP 503"));
        assert!(missing.ends_with("south america venues address missing.csv"));
    }

    #[test]
    fn empty_missing_report_has_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        write_missing_csv(&[], &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Rank,Venue,Country,Source URL,Reason,Error\n"
        );
    }

    #[test]
    fn apply_counts_only_real_changes() {
        let mut records = sample();
        records[1].name = "TROPICALIA!".into();
        let results = collect_addresses(&sample(), "all", fetch, None);

        assert_eq!(apply_addresses(&mut records, &results), 2);
        assert_eq!(
            records[1].formatted_address.as_deref(),
            Some("Cl. 81a #8-23, Bogota, Colombia")
        );
        assert_eq!(apply_addresses(&mut records, &results), 0);
    }

    #[test]
    fn report_names_follow_the_filter() {
        assert_eq!(default_report_name("ALL"), "all venues address.csv");
        assert_eq!(default_report_name("main"), "top 100 venues address.csv");
    }
}
