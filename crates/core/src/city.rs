// ABOUTME: Address-to-city inference as an ordered list of selection rules.
// ABOUTME: Returns an empty string when no rule produces a plausible city.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::html_utils::{collapse_whitespace, decode_entities};
use crate::models::Record;
use crate::tables::GeoTables;
use crate::text::{has_digit, is_all_upper, normalize_label, words};

static TOKEN_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",| - ").unwrap());

/// Noise removed from an address token before it can be a city, applied in order.
static CLEANERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // plus code
        r"(?i)^[A-Z0-9]{4,8}\+[A-Z0-9]{2,4}\s*",
        // UK postcode
        r"(?i)\b[A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2}\b",
        // Eircode
        r"(?i)\bD\d{1,2}\s*[A-Z0-9]{2,5}\b",
        // house number or postal prefix
        r"^[A-Za-z]?\d{3,6}(?:-\d{2,6})?\s+",
        // "NY 10001" style region suffix
        r"\s+[A-Z]{2,4}\s+\d{3,6}$",
        // Canadian postcode
        r"(?i)\s+[A-Z]\d[A-Z]\s?\d[A-Z]\d$",
        r"\b\d{3,6}(?:-\d{2,6})?\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-zÀ-ÿ]").unwrap());
static CITY_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bcity\b|\bciudad\b|\bcidade\b").unwrap());
static SUBREGION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bregion\b|\bprovince\b|\bstate\b|\bdistrict\b|\bcounty\b|\bdepartamento\b|\bdepartment\b|\bprefecture\b|\bautonoma\b|\bmetropolitana\b|\bterritory\b|\bgovernorate\b",
    )
    .unwrap()
});
static ACRONYM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3,5}$").unwrap());

const BANNED_CANDIDATES: &[&str] = &["st", "rd", "ave", "unit", "local", "warehouse", "building"];
const MAX_EXPLICIT_CITY_CHARS: usize = 34;
const MAX_EXPLICIT_CITY_SPACES: usize = 3;

/// An address token and the city name cleaned out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub raw: String,
    pub city: String,
}

/// Decides whether a candidate is acceptable at a given priority level.
pub type SelectionRule = fn(&GeoTables, &Candidate) -> bool;

/// Candidate selection rules in priority order; the first rule with any match wins.
pub const SELECTION_RULES: &[(&str, SelectionRule)] = &[
    ("explicit-city-label", rule_explicit_city_label),
    ("plain-locality", rule_plain_locality),
    ("non-street", rule_non_street),
    ("first-candidate", rule_any),
];

fn rule_explicit_city_label(tables: &GeoTables, candidate: &Candidate) -> bool {
    !looks_street_like(tables, &candidate.raw)
        && CITY_MARKER_RE.is_match(&normalize_label(&candidate.city))
}

fn rule_plain_locality(tables: &GeoTables, candidate: &Candidate) -> bool {
    !looks_street_like(tables, &candidate.raw) && !looks_subregion_like(tables, &candidate.city)
}

fn rule_non_street(tables: &GeoTables, candidate: &Candidate) -> bool {
    !looks_street_like(tables, &candidate.raw)
}

fn rule_any(_: &GeoTables, _: &Candidate) -> bool {
    true
}

/// Infers a city name from address text or an explicit city field.
#[derive(Debug, Clone, Copy)]
pub struct CityInferer<'a> {
    tables: &'a GeoTables,
}

impl<'a> CityInferer<'a> {
    pub fn new(tables: &'a GeoTables) -> Self {
        Self { tables }
    }

    /// Address-based inference first, then the explicit city when it looks plausible.
    pub fn infer(
        &self,
        address: Option<&str>,
        explicit_city: Option<&str>,
        country_canonical: &str,
    ) -> String {
        let from_address = self.from_address(address, country_canonical);
        if !from_address.is_empty() {
            return from_address;
        }
        self.from_explicit_city(explicit_city.unwrap_or_default())
    }

    /// Tries `formatted_address`, then `address`, then the record's own `city`.
    pub fn infer_for_record(&self, record: &Record, country_canonical: &str) -> String {
        for address in [&record.formatted_address, &record.address] {
            let city = self.from_address(address.as_deref(), country_canonical);
            if !city.is_empty() {
                return city;
            }
        }
        self.from_explicit_city(&record.city)
    }

    /// Runs the selection rules over the cleaned tokens of one address.
    pub fn from_address(&self, address: Option<&str>, country_canonical: &str) -> String {
        let raw = decode_entities(address.unwrap_or_default().trim());
        if raw.is_empty() {
            return String::new();
        }

        let mut tokens: Vec<String> = TOKEN_SPLIT_RE
            .split(&raw)
            .map(collapse_whitespace)
            .filter(|token| !token.is_empty())
            .collect();

        while tokens
            .last()
            .is_some_and(|token| self.looks_like_country(token, country_canonical))
        {
            tokens.pop();
        }

        let candidates = self.candidates(&tokens);
        for (name, rule) in SELECTION_RULES {
            if let Some(hit) = candidates.iter().find(|c| rule(self.tables, c)) {
                trace!(rule = *name, city = %hit.city, "city inferred from address");
                return hit.city.clone();
            }
        }
        String::new()
    }

    /// Cleaned candidates from tail to head; tokens that clean to nothing are skipped.
    pub fn candidates(&self, tokens: &[String]) -> Vec<Candidate> {
        tokens
            .iter()
            .rev()
            .filter_map(|raw| {
                let city = self.clean_candidate(raw);
                (!city.is_empty()).then(|| Candidate {
                    raw: raw.clone(),
                    city,
                })
            })
            .collect()
    }

    /// Accepts the explicit city field only when it passes every plausibility check.
    pub fn from_explicit_city(&self, explicit_city: &str) -> String {
        let raw = explicit_city.trim();
        let cleaned = self.clean_candidate(raw);
        if !cleaned.is_empty() && self.is_valid_explicit_city(raw, &cleaned) {
            return cleaned;
        }
        String::new()
    }

    /// Strips postcodes, house numbers and street prefixes from one address token.
    pub fn clean_candidate(&self, token: &str) -> String {
        let mut value = trim_dashes(token).to_string();
        if value.is_empty() {
            return String::new();
        }

        for cleaner in CLEANERS.iter() {
            value = cleaner.replace_all(&value, "").into_owned();
        }
        value = MULTI_SPACE_RE
            .replace_all(trim_dashes(&value), " ")
            .trim()
            .to_string();
        if value.is_empty() {
            return String::new();
        }

        let found = words(&value);
        let last_street = found
            .iter()
            .rposition(|word| self.is_street_word(word));
        if let Some(index) = last_street {
            let tail: Vec<&str> = found[index + 1..]
                .iter()
                .copied()
                .filter(|word| word.chars().count() > 1)
                .collect();
            if !tail.is_empty() {
                value = tail[tail.len().saturating_sub(3)..].join(" ");
            }
        }

        if has_digit(&value) {
            let found = words(&value);
            if found.is_empty() {
                return String::new();
            }
            value = found[found.len().saturating_sub(2)..].join(" ");
        }

        if !LETTER_RE.is_match(&value) {
            return String::new();
        }
        if BANNED_CANDIDATES.contains(&value.to_lowercase().as_str()) {
            return String::new();
        }
        if value.chars().count() <= 2 && is_all_upper(&value) {
            return String::new();
        }

        self.canonical_city(value)
    }

    /// Maps alternate administrative renderings to the common city name.
    pub fn canonical_city(&self, value: String) -> String {
        match self.tables.city_aliases.get(&normalize_label(&value)) {
            Some(alias) => alias.clone(),
            None => value,
        }
    }

    fn looks_like_country(&self, token: &str, country_canonical: &str) -> bool {
        let label = normalize_label(token);
        !label.is_empty()
            && (self.tables.is_country_label(&label)
                || label == normalize_label(country_canonical))
    }

    fn is_street_word(&self, word: &str) -> bool {
        is_street_word(self.tables, word)
    }

    fn is_valid_explicit_city(&self, raw: &str, cleaned: &str) -> bool {
        if raw.contains(['[', ']', '<', '>', '{', '}']) {
            return false;
        }
        if looks_street_like(self.tables, raw) || looks_subregion_like(self.tables, cleaned) {
            return false;
        }
        if cleaned.chars().count() > MAX_EXPLICIT_CITY_CHARS
            || cleaned.matches(' ').count() > MAX_EXPLICIT_CITY_SPACES
        {
            return false;
        }
        looks_city_like(cleaned) || looks_city_acronym(cleaned)
    }
}

fn trim_dashes(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '-')
}

fn is_street_word(tables: &GeoTables, word: &str) -> bool {
    let lowered = word.to_lowercase();
    tables.street_words.contains(lowered.trim_matches('.'))
}

/// True when any word is a street-type word ("st", "ave", "calle", ...).
pub fn looks_street_like(tables: &GeoTables, value: &str) -> bool {
    words(value).iter().any(|word| is_street_word(tables, word))
}

/// True for province, department, prefecture and similar sub-national labels.
pub fn looks_subregion_like(tables: &GeoTables, value: &str) -> bool {
    let label = normalize_label(value);
    tables.subregion_labels.contains(&label) || SUBREGION_RE.is_match(&label)
}

/// Has a lowercase-bearing word of three or more letters and is not all short capitals.
pub fn looks_city_like(value: &str) -> bool {
    let found = words(value);
    if found.is_empty() {
        return false;
    }
    if !found.iter().any(|word| word.chars().any(char::is_lowercase)) {
        return false;
    }
    if found
        .iter()
        .all(|word| is_all_upper(word) && word.chars().count() <= 4)
    {
        return false;
    }
    if let [only] = found.as_slice() {
        return only.chars().count() >= 3;
    }
    found.iter().any(|word| word.chars().count() >= 3)
}

pub fn looks_city_acronym(value: &str) -> bool {
    ACRONYM_RE.is_match(value.trim())
}
