// ABOUTME: Order-independent comparison of two record sets.
// ABOUTME: Only category, rank, name, city and country participate.

use crate::category::normalize_category;
use crate::models::Record;

type Fingerprint = (String, u32, String, String, String);

fn fingerprint(record: &Record) -> Fingerprint {
    (
        normalize_category(Some(&record.category)),
        record.rank,
        record.name.trim().to_lowercase(),
        record.city.trim().to_lowercase(),
        record.country.trim().to_lowercase(),
    )
}

fn canonical(records: &[Record]) -> Vec<Fingerprint> {
    let mut out: Vec<Fingerprint> = records.iter().map(fingerprint).collect();
    out.sort();
    out
}

/// True when the two sets differ in any record's rank or listing text.
///
/// Order, surrounding whitespace and letter case are ignored, as are
/// coordinates and addresses.
pub fn changed(previous: &[Record], current: &[Record]) -> bool {
    canonical(previous) != canonical(current)
}
