// ABOUTME: Link-grouping matcher: consecutive detail anchors sharing a target form one venue.
// ABOUTME: Rank, name and country are read from the group's text tokens in order.

use scraper::{ElementRef, Html, Selector};

use once_cell::sync::Lazy;

use super::{ExtractorConfig, ListingCandidate};
use crate::html_utils::collapse_whitespace;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Consecutive detail anchors that point at the same URL.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkGroup {
    pub url: String,
    pub tokens: Vec<String>,
}

impl LinkGroup {
    /// First numeric token is the rank; the first two other tokens are name and country.
    pub fn into_candidate(self) -> ListingCandidate {
        let rank = self
            .tokens
            .iter()
            .find(|token| is_numeric_token(token))
            .and_then(|token| token.parse().ok());
        let mut text = self.tokens.into_iter().filter(|token| !is_numeric_token(token));

        ListingCandidate {
            rank,
            name: text.next().unwrap_or_default(),
            city: String::new(),
            country: text.next().unwrap_or_default(),
            detail_url: Some(self.url),
        }
    }
}

/// Groups detail anchors in document order.
pub fn group_detail_links(document: &str, config: &ExtractorConfig) -> Vec<LinkGroup> {
    let html = Html::parse_document(document);
    let mut groups: Vec<LinkGroup> = Vec::new();

    for anchor in html.select(&ANCHOR_SELECTOR) {
        let Some(url) = anchor
            .value()
            .attr("href")
            .and_then(|href| config.detail_target(href))
        else {
            continue;
        };

        let tokens = anchor_tokens(anchor);
        match groups.last_mut() {
            Some(group) if group.url == url => group.tokens.extend(tokens),
            _ => groups.push(LinkGroup { url, tokens }),
        }
    }

    groups
}

/// One candidate per link group; groups without a rank are kept so they still count.
pub fn match_link_groups(document: &str, config: &ExtractorConfig) -> Vec<ListingCandidate> {
    group_detail_links(document, config)
        .into_iter()
        .map(LinkGroup::into_candidate)
        .collect()
}

fn anchor_tokens(anchor: ElementRef<'_>) -> Vec<String> {
    anchor
        .text()
        .map(collapse_whitespace)
        .filter(|token| !token.is_empty())
        .collect()
}

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"
      <a href="/locales/tobbys-estate/"><img src="/img/toby.jpg" alt="Toby's"/></a>
      <a href="/locales/tobbys-estate/"><h3>1</h3></a>
      <a href="/locales/tobbys-estate/"><h2>Toby's Estate Coffee Roasters</h2></a>
      <a href="/locales/tobbys-estate/"><p>Australia</p></a>
      <a href="/about/">About Us</a>
      <a href="https://theworlds100bestcoffeeshops.com/locales/onyx-coffee-lab/"><h3>2</h3></a>
      <a href="/locales/onyx-coffee-lab/"><h2>Onyx Coffee LAB</h2></a>
    "#;

    #[test]
    fn groups_consecutive_anchors_by_resolved_target() {
        let groups = group_detail_links(LIST, &ExtractorConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tokens, vec!["1", "Toby's Estate Coffee Roasters", "Australia"]);
        assert_eq!(groups[1].tokens, vec!["2", "Onyx Coffee LAB"]);
    }

    #[test]
    fn tokens_map_to_rank_name_country() {
        let found = match_link_groups(LIST, &ExtractorConfig::default());
        assert_eq!(found[0].rank, Some(1));
        assert_eq!(found[0].name, "Toby's Estate Coffee Roasters");
        assert_eq!(found[0].country, "Australia");
        assert_eq!(found[1].rank, Some(2));
        assert_eq!(found[1].country, "");
    }

    #[test]
    fn non_adjacent_repeats_start_a_new_group() {
        let doc = r#"<a href="/locales/a/">1</a><a href="/locales/b/">2</a><a href="/locales/a/">A</a>"#;
        assert_eq!(group_detail_links(doc, &ExtractorConfig::default()).len(), 3);
    }
}
