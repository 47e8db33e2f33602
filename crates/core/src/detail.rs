// ABOUTME: Detail-page heuristics: city and address from heading fragments, contact address.
// ABOUTME: Pure functions over a document string; a miss yields None, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::html_utils::{clean_text, strip_html};
use crate::text::has_digit;

static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, .elementor-heading-title").unwrap()
});
static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#).unwrap()
});
static LOCATED_IN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b[Ll]ocated in (?:the (?:heart|centre|center|city) of )?([A-ZÀ-Þ][\p{L}'-]*(?:\s+[A-ZÀ-Þ][\p{L}'-]*)*)",
    )
    .unwrap()
});

static CONTACT_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<h2[^>]*>\s*Contact\s*</h2>(?P<section>.*?)(?:<h2[^>]*>|<div data-elementor-type="footer"|</body>|$)"#,
    )
    .unwrap()
});
static CONTACT_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<p[^>]*class="[^"]*elementor-heading-title[^"]*"[^>]*>\s*(?P<text>.*?)\s*</p>"#,
    )
    .unwrap()
});
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

const MIN_ADDRESS_CHARS: usize = 10;

/// City and address found on a venue detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub city: Option<String>,
    pub address: Option<String>,
}

/// Heading-like text fragments (`h1`-`h6`, `.elementor-heading-title`) in document order.
pub fn heading_fragments(document: &str) -> Vec<String> {
    let html = Html::parse_document(document);
    html.select(&HEADING_SELECTOR)
        .map(|el| clean_text(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Extracts city and address for a venue whose country is already known.
///
/// The city is the fragment just before the first fragment equal to
/// `country`, when it has a comma and no digits. The address is the first
/// fragment with a digit, a comma and at least ten characters. Without a
/// country-anchored city, a "located in <City>" phrase in the page
/// description is used instead.
pub fn extract_detail(document: &str, country: &str) -> DetailInfo {
    let fragments = heading_fragments(document);
    let country = country.trim();

    let mut city = None;
    if !country.is_empty() {
        let anchor = fragments
            .iter()
            .position(|fragment| fragment.to_lowercase() == country.to_lowercase());
        if let Some(index) = anchor.filter(|index| *index > 0) {
            let previous = &fragments[index - 1];
            if previous.contains(',') && !has_digit(previous) {
                city = Some(previous.clone());
            }
        }
    }

    let address = fragments
        .iter()
        .find(|fragment| {
            has_digit(fragment)
                && fragment.contains(',')
                && fragment.chars().count() >= MIN_ADDRESS_CHARS
        })
        .cloned();

    if city.is_none() {
        city = city_from_description(document);
    }

    DetailInfo { city, address }
}

/// City named by a "located in <City>" phrase in the page description.
pub fn city_from_description(document: &str) -> Option<String> {
    let html = Html::parse_document(document);
    html.select(&DESCRIPTION_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(|content| {
            let content = clean_text(content);
            LOCATED_IN_RE
                .captures(&content)
                .map(|caps| caps[1].trim().to_string())
        })
        .filter(|city| !city.is_empty())
}

/// First non-URL heading-title paragraph inside the page's `Contact` section.
pub fn extract_contact_address(document: &str) -> Option<String> {
    let section = CONTACT_SECTION_RE.captures(document)?;
    let section = section.name("section")?.as_str();

    CONTACT_TEXT_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let text = strip_html(&caps["text"]);
            let text = text.trim_matches(|c: char| c.is_whitespace() || c == ',');
            (!text.is_empty() && !URL_RE.is_match(text)).then(|| text.to_string())
        })
        .next()
}
