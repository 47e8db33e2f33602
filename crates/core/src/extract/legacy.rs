// ABOUTME: Matcher for the older single-line "<rank>. <name> - <city>, <country>" list items.
// ABOUTME: Any hit here means the document uses the old markup exclusively.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::{ExtractorConfig, ListingCandidate};
use crate::html_utils::clean_text;

static LI_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.+?)\s+-\s+([^,]+),\s*(.+)$").unwrap());

/// Parses every `<li>` whose text matches the single-line entry pattern.
pub fn match_list_items(document: &str, config: &ExtractorConfig) -> Vec<ListingCandidate> {
    let html = Html::parse_document(document);
    let mut out = Vec::new();

    for item in html.select(&LI_SELECTOR) {
        let text = clean_text(&item.text().collect::<Vec<_>>().join(" "));
        let Some(caps) = ENTRY_RE.captures(&text) else {
            continue;
        };
        let Ok(rank) = caps[1].parse::<u32>() else {
            continue;
        };

        let detail_url = item
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| config.resolve(href));

        out.push(ListingCandidate {
            rank: Some(rank),
            name: caps[2].trim().to_string(),
            city: caps[3].trim().to_string(),
            country: caps[4].trim().to_string(),
            detail_url,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_line_entries() {
        let found = match_list_items("<ul><li>1. A - X, Y</li></ul>", &ExtractorConfig::default());
        assert_eq!(
            found,
            vec![ListingCandidate {
                rank: Some(1),
                name: "A".into(),
                city: "X".into(),
                country: "Y".into(),
                detail_url: None,
            }]
        );
    }

    #[test]
    fn keeps_hyphenated_names_and_decodes_entities() {
        let doc = r#"<li><a href="/locales/cafe/">12. Caf&eacute; Al-Ma - Bogotá, Colombia</a></li>"#;
        let found = match_list_items(doc, &ExtractorConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Café Al-Ma");
        assert_eq!(found[0].city, "Bogotá");
        assert_eq!(found[0].country, "Colombia");
        assert_eq!(
            found[0].detail_url.as_deref(),
            Some("https://theworlds100bestcoffeeshops.com/locales/cafe/")
        );
    }

    #[test]
    fn ignores_unrelated_list_items() {
        let doc = "<ul><li>Home</li><li>About - us</li></ul>";
        assert!(match_list_items(doc, &ExtractorConfig::default()).is_empty());
    }
}
