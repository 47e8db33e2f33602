// ABOUTME: Read-only geographic lookup tables (aliases, centroids, colours, label sets).
// ABOUTME: Built once and passed by reference to the resolvers that need them.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::text::normalize_label;

pub const UNKNOWN_COUNTRY: &str = "Unknown";
pub const DEFAULT_COLOR: &str = "#888899";

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("eeuu", "USA"),
    ("méxico", "Mexico"),
    ("mã©xico", "Mexico"),
    ("mexico", "Mexico"),
    ("united states", "USA"),
    ("united states of america", "USA"),
];

const COUNTRY_CENTROIDS: &[(&str, f64, f64)] = &[
    ("Argentina", -38.4161, -63.6167),
    ("Australia", -25.2744, 133.7751),
    ("Austria", 47.5162, 14.5501),
    ("Belgium", 50.5039, 4.4699),
    ("Bolivia", -16.2902, -63.5887),
    ("Brazil", -14.2350, -51.9253),
    ("Bulgaria", 42.7339, 25.4858),
    ("Canada", 56.1304, -106.3468),
    ("Chile", -35.6751, -71.5430),
    ("China", 35.8617, 104.1954),
    ("Colombia", 4.5709, -74.2973),
    ("Costa Rica", 9.7489, -83.7534),
    ("Czech Republic", 49.8175, 15.4730),
    ("Denmark", 56.2639, 9.5018),
    ("Dominican Republic", 18.7357, -70.1627),
    ("Ecuador", -1.8312, -78.1834),
    ("Egypt", 26.8206, 30.8025),
    ("El Salvador", 13.7942, -88.8965),
    ("England", 52.3555, -1.1743),
    ("Ethiopia", 9.1450, 40.4897),
    ("France", 46.2276, 2.2137),
    ("Greece", 39.0742, 21.8243),
    ("Guatemala", 15.7835, -90.2308),
    ("Honduras", 15.2000, -86.2419),
    ("Ireland", 53.4129, -8.2439),
    ("Italy", 41.8719, 12.5674),
    ("Japan", 36.2048, 138.2529),
    ("Macedonia", 41.6086, 21.7453),
    ("Malaysia", 4.2105, 101.9758),
    ("Mexico", 23.6345, -102.5528),
    ("Netherlands", 52.1326, 5.2913),
    ("Nicaragua", 12.8654, -85.2072),
    ("Norway", 60.4720, 8.4689),
    ("Paraguay", -23.4425, -58.4438),
    ("Peru", -9.1900, -75.0152),
    ("Portugal", 39.3999, -8.2245),
    ("Qatar", 25.3548, 51.1839),
    ("Republic of Korea", 35.9078, 127.7669),
    ("Romania", 45.9432, 24.9668),
    ("Rwanda", -1.9403, 29.8739),
    ("Scotland", 56.4907, -4.2026),
    ("Singapore", 1.3521, 103.8198),
    ("South Africa", -30.5595, 22.9375),
    ("Spain", 40.4637, -3.7492),
    ("Switzerland", 46.8182, 8.2275),
    ("Taiwan", 23.6978, 120.9605),
    ("Thailand", 15.8700, 100.9925),
    ("The Philippines", 12.8797, 121.7740),
    ("Turkey", 38.9637, 35.2433),
    ("UAE", 23.4241, 53.8478),
    ("USA", 37.0902, -95.7129),
    ("Uruguay", -32.5228, -55.7658),
    ("Venezuela", 6.4238, -66.5897),
    (UNKNOWN_COUNTRY, 8.0, 0.0),
];

const COUNTRY_COLORS: &[(&str, &str)] = &[
    ("Argentina", "#6EC1FF"),
    ("Australia", "#2F4B9C"),
    ("Brazil", "#45B649"),
    ("Colombia", "#FFD030"),
    ("Japan", "#E24B5B"),
    ("Peru", "#FF7600"),
    ("USA", "#E2ACB7"),
    ("Mexico", "#3B8C4A"),
    ("Venezuela", "#F5D547"),
    ("Chile", "#D64545"),
];

/// Country names that appear at the tail of addresses but are not centroid keys.
const EXTRA_COUNTRY_LABELS: &[&str] = &[
    "united kingdom",
    "uk",
    "u k",
    "united arab emirates",
    "uae",
    "south korea",
    "north macedonia",
];

const STREET_WORDS: &[&str] = &[
    "st", "street", "rd", "road", "ave", "avenue", "av", "calle", "carrer", "r", "jr", "lane",
    "ln", "highway", "hwy", "shop", "unit", "local", "bldg", "building", "warehouse", "edificio",
    "cll", "cra",
];

const SUBREGION_LABELS: &[&str] = &["magallanes y la antartica chilena"];

const CITY_ALIASES: &[(&str, &str)] = &[
    ("cdad autonoma de buenos aires", "Buenos Aires"),
    ("ciudad autonoma de buenos aires", "Buenos Aires"),
    ("ciudad de buenos aires", "Buenos Aires"),
    ("capital federal", "Buenos Aires"),
];

static BUILTIN: Lazy<GeoTables> = Lazy::new(GeoTables::default);

/// Immutable lookup tables consulted by the country and city resolvers.
#[derive(Debug, Clone)]
pub struct GeoTables {
    /// Lowercased alias -> canonical country.
    pub country_aliases: HashMap<String, String>,
    pub centroids: HashMap<String, (f64, f64)>,
    pub colors: HashMap<String, String>,
    /// Folded labels recognised as a country when trailing an address.
    pub country_labels: HashSet<String>,
    pub street_words: HashSet<String>,
    /// Folded labels that are always a sub-region, never a city.
    pub subregion_labels: HashSet<String>,
    /// Folded alternate city rendering -> common name.
    pub city_aliases: HashMap<String, String>,
}

impl GeoTables {
    /// Shared instance of the builtin tables.
    pub fn builtin() -> &'static GeoTables {
        &BUILTIN
    }

    pub fn centroid(&self, country: &str) -> (f64, f64) {
        self.centroids
            .get(country)
            .or_else(|| self.centroids.get(UNKNOWN_COUNTRY))
            .copied()
            .unwrap_or((8.0, 0.0))
    }

    pub fn color(&self, country: &str) -> &str {
        self.colors
            .get(country)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }

    pub fn is_country_label(&self, folded: &str) -> bool {
        self.country_labels.contains(folded)
    }
}

impl Default for GeoTables {
    fn default() -> Self {
        let country_aliases: HashMap<String, String> = COUNTRY_ALIASES
            .iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect();

        let centroids = COUNTRY_CENTROIDS
            .iter()
            .map(|(country, lat, lng)| (country.to_string(), (*lat, *lng)))
            .collect();

        let colors = COUNTRY_COLORS
            .iter()
            .map(|(country, color)| (country.to_string(), color.to_string()))
            .collect();

        let mut country_labels: HashSet<String> = COUNTRY_CENTROIDS
            .iter()
            .map(|(country, _, _)| normalize_label(country))
            .collect();
        country_labels.extend(country_aliases.keys().map(|alias| normalize_label(alias)));
        country_labels.extend(EXTRA_COUNTRY_LABELS.iter().map(|label| label.to_string()));
        country_labels.retain(|label| !label.is_empty());

        Self {
            country_aliases,
            centroids,
            colors,
            country_labels,
            street_words: STREET_WORDS.iter().map(|w| w.to_string()).collect(),
            subregion_labels: SUBREGION_LABELS.iter().map(|w| w.to_string()).collect(),
            city_aliases: CITY_ALIASES
                .iter()
                .map(|(alias, city)| (alias.to_string(), city.to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_country_falls_back_to_sentinel_centroid() {
        let tables = GeoTables::builtin();
        assert_eq!(tables.centroid("Peru"), (-9.1900, -75.0152));
        assert_eq!(tables.centroid("Atlantis"), (8.0, 0.0));
    }

    #[test]
    fn colors_default_for_unlisted_countries() {
        let tables = GeoTables::builtin();
        assert_eq!(tables.color("Japan"), "#E24B5B");
        assert_eq!(tables.color("USA"), "#E2ACB7");
        assert_eq!(tables.color("Austria"), DEFAULT_COLOR);
        assert_eq!(tables.color("Atlantis"), DEFAULT_COLOR);
    }

    #[test]
    fn country_labels_include_aliases_and_extras() {
        let tables = GeoTables::builtin();
        assert!(tables.is_country_label("usa"));
        assert!(tables.is_country_label("eeuu"));
        assert!(tables.is_country_label("united kingdom"));
        assert!(tables.is_country_label("the philippines"));
        assert!(!tables.is_country_label("lisbon"));
    }
}
