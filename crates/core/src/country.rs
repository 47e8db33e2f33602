// ABOUTME: Country text normalization against the alias table.
// ABOUTME: Total over all inputs; corrupted values map to the Unknown sentinel.

use crate::tables::{GeoTables, UNKNOWN_COUNTRY};
use crate::text::has_digit;

/// Resolves scraped country text to a canonical label.
#[derive(Debug, Clone, Copy)]
pub struct CountryResolver<'a> {
    tables: &'a GeoTables,
}

impl<'a> CountryResolver<'a> {
    pub fn new(tables: &'a GeoTables) -> Self {
        Self { tables }
    }

    /// Returns `(canonical, was_invalid)`.
    ///
    /// Empty input and anything containing a digit is invalid and becomes
    /// `Unknown`. Aliases are matched trimmed and case-insensitively.
    pub fn normalize(&self, raw: Option<&str>) -> (String, bool) {
        let cleaned = raw.map(str::trim).unwrap_or_default();
        if cleaned.is_empty() {
            return (UNKNOWN_COUNTRY.to_string(), true);
        }

        if let Some(target) = self.tables.country_aliases.get(&cleaned.to_lowercase()) {
            return (target.clone(), false);
        }

        if has_digit(cleaned) {
            return (UNKNOWN_COUNTRY.to_string(), true);
        }

        (cleaned.to_string(), false)
    }

    /// Canonical country, with invalid input folded into `Unknown`.
    pub fn canonical(&self, raw: &str) -> String {
        self.normalize(Some(raw)).0
    }

    /// Canonical country when resolvable, otherwise the collapsed raw text.
    pub fn display(&self, raw: &str) -> String {
        let (canonical, invalid) = self.normalize(Some(raw));
        if invalid || canonical == UNKNOWN_COUNTRY {
            crate::html_utils::clean_text(raw)
        } else {
            canonical
        }
    }

    pub fn centroid(&self, country: &str) -> (f64, f64) {
        self.tables.centroid(country)
    }

    pub fn color(&self, country: &str) -> &'a str {
        self.tables.color(country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CountryResolver<'static> {
        CountryResolver::new(GeoTables::builtin())
    }

    #[test]
    fn resolves_aliases_case_insensitively() {
        let r = resolver();
        assert_eq!(r.normalize(Some("EEUU")), ("USA".to_string(), false));
        assert_eq!(r.normalize(Some("  méxico ")), ("Mexico".to_string(), false));
        assert_eq!(r.normalize(Some("MÃ©xico")), ("Mexico".to_string(), false));
        assert_eq!(
            r.normalize(Some("United States of America")),
            ("USA".to_string(), false)
        );
    }

    #[test]
    fn empty_and_numeric_input_is_invalid() {
        let r = resolver();
        assert_eq!(r.normalize(None), ("Unknown".to_string(), true));
        assert_eq!(r.normalize(Some("")), ("Unknown".to_string(), true));
        assert_eq!(r.normalize(Some("   ")), ("Unknown".to_string(), true));
        assert_eq!(r.normalize(Some("123")), ("Unknown".to_string(), true));
        assert_eq!(r.normalize(Some("Lima 15074")), ("Unknown".to_string(), true));
    }

    #[test]
    fn other_input_is_trimmed_verbatim() {
        let r = resolver();
        assert_eq!(r.normalize(Some(" Portugal ")), ("Portugal".to_string(), false));
        assert_eq!(r.normalize(Some("Atlantis")), ("Atlantis".to_string(), false));
    }

    #[test]
    fn normalization_is_idempotent() {
        let r = resolver();
        for raw in ["EEUU", "", "123", " Peru ", "méxico", "Unknown", "São Tomé"] {
            let once = r.canonical(raw);
            assert_eq!(r.canonical(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn display_falls_back_to_raw_text() {
        let r = resolver();
        assert_eq!(r.display("eeuu"), "USA");
        assert_eq!(r.display("Lima  15074"), "Lima 15074");
    }
}
