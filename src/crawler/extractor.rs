//! Link extraction from listing pages
//!
//! Parses "Index of" style HTML and turns every anchor into a classified
//! link. Document order is preserved and duplicates within one page are
//! dropped, so sort toggles and repeated anchors do not inflate the work
//! list.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::url::{classify_href, NormalizedLink};

/// Extracts every crawlable link from a listing page
///
/// Anchors are resolved against `base` (the page the HTML came from) and
/// checked against `scope`, the root URL prefix; anything resolving
/// outside it is dropped, which also covers parent links and foreign
/// schemes.
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `base` - URL of the page, for resolving relative hrefs
/// * `scope` - Root URL prefix that links must stay under
///
/// # Returns
///
/// Classified links in document order, de-duplicated per page
pub fn extract_links(html: &str, base: &Url, scope: &str) -> Vec<NormalizedLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(link) = classify_href(href, base, scope) {
                    if seen.insert(link.url.clone()) {
                        links.push(link);
                    }
                }
            }
        }
    }

    links
}
