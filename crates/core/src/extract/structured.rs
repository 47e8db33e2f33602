// ABOUTME: Positional matcher for rank/name/country anchor triples in raw markup.
// ABOUTME: Each venue is three adjacent anchors to one detail URL wrapping h3, h2 and p.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractorConfig, ListingCandidate};
use crate::html_utils::{decode_entities, strip_html};

/// `<a href=U><h3>rank</h3></a> <a href=U><h2>name</h2></a> <a href=U><p>country</p></a>`.
///
/// The three hrefs are captured separately and compared after matching.
static GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    let anchor = r#"<a\b[^>]*?\bhref\s*=\s*["']([^"']+)["'][^>]*>\s*"#;
    Regex::new(&format!(
        r"(?is){anchor}<h3\b[^>]*>\s*(\d+)\s*</h3>\s*</a>\s*{anchor}<h2\b[^>]*>(.*?)</h2>\s*</a>\s*{anchor}<p\b[^>]*>(.*?)</p>\s*</a>"
    ))
    .unwrap()
});

/// Finds every rank/name/country triple whose anchors share a detail URL.
pub fn match_heading_groups(document: &str, config: &ExtractorConfig) -> Vec<ListingCandidate> {
    let mut out = Vec::new();

    for caps in GROUP_RE.captures_iter(document) {
        let hrefs = [&caps[1], &caps[3], &caps[5]].map(|href| decode_entities(href.trim()));
        if hrefs[0] != hrefs[1] || hrefs[1] != hrefs[2] {
            continue;
        }
        let Some(detail_url) = config.detail_target(&hrefs[0]) else {
            continue;
        };

        out.push(ListingCandidate {
            rank: caps[2].parse().ok(),
            name: strip_html(&caps[4]),
            city: String::new(),
            country: strip_html(&caps[6]),
            detail_url: Some(detail_url),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIPLE: &str = r#"
      <a href="/locales/tobbys-estate/"><img src="/img/toby.jpg"/></a>
      <a href="/locales/tobbys-estate/">
        <h3 class="elementor-heading-title">1</h3>
      </a>
      <a href="/locales/tobbys-estate/">
        <h2 class="elementor-heading-title">Toby&#8217;s Estate Coffee Roasters</h2>
      </a>
      <a href="/locales/tobbys-estate/">
        <p class="elementor-heading-title">Australia</p>
      </a>
    "#;

    #[test]
    fn matches_anchor_triples() {
        let found = match_heading_groups(TRIPLE, &ExtractorConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rank, Some(1));
        assert_eq!(found[0].name, "Toby’s Estate Coffee Roasters");
        assert_eq!(found[0].country, "Australia");
        assert_eq!(
            found[0].detail_url.as_deref(),
            Some("https://theworlds100bestcoffeeshops.com/locales/tobbys-estate/")
        );
    }

    #[test]
    fn mismatched_targets_are_not_a_group() {
        let doc = r#"<a href="/locales/a/"><h3>1</h3></a><a href="/locales/b/"><h2>B</h2></a><a href="/locales/b/"><p>Peru</p></a>"#;
        assert!(match_heading_groups(doc, &ExtractorConfig::default()).is_empty());
    }

    #[test]
    fn non_detail_targets_are_ignored() {
        let doc = r#"<a href="/about/"><h3>1</h3></a><a href="/about/"><h2>About</h2></a><a href="/about/"><p>Us</p></a>"#;
        assert!(match_heading_groups(doc, &ExtractorConfig::default()).is_empty());
    }
}
