//! Recursive listing traversal
//!
//! The walk runs up front and in full: starting from the root listing
//! page it follows every in-scope directory link depth first and returns
//! the flattened work list. A scanned set keyed by normalized URL makes
//! sure each page is fetched once, which breaks the cycles that self
//! links, parent links, and sort toggles would otherwise cause.

use std::collections::HashSet;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::{debug, warn};
use url::Url;

use crate::crawler::extractor::extract_links;
use crate::crawler::fetcher::ListingClient;
use crate::url::{normalize_root, LinkKind};
use crate::Result;

/// One unit of scan work produced by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Normalized absolute URL.
    pub url: String,
    /// Directory listing or downloadable file.
    pub kind: LinkKind,
    /// URL path component, still percent-encoded.
    pub path: String,
}

/// Walks the listing tree under `root` and returns every discovered
/// entry in depth-first document order: each directory is followed by
/// its own subtree before later siblings.
///
/// The root itself is never part of the result. Listing pages that fail
/// to load are logged and treated as empty, so a flaky subdirectory
/// costs only its own subtree. The one bootstrap failure is a root URL
/// that does not parse as http(s), which surfaces as an error.
pub async fn walk(client: &ListingClient, root: &str) -> Result<Vec<WorkItem>> {
    let root_url = normalize_root(root)?;
    let scope = root_url.to_string();

    let mut visited = HashSet::new();
    let mut produced = HashSet::new();
    let mut items = Vec::new();
    collect(
        client,
        root_url,
        &scope,
        &mut visited,
        &mut produced,
        &mut items,
    )
    .await;

    debug!("walk of {} produced {} entries", scope, items.len());
    Ok(items)
}

fn collect<'a>(
    client: &'a ListingClient,
    page: Url,
    scope: &'a str,
    visited: &'a mut HashSet<String>,
    produced: &'a mut HashSet<String>,
    items: &'a mut Vec<WorkItem>,
) -> BoxFuture<'a, ()> {
    async move {
        if !visited.insert(page.to_string()) {
            return;
        }

        let html = match client.get_html(page.as_str()).await {
            Ok(html) => html,
            Err(err) => {
                warn!("listing page {} failed, skipping its subtree: {}", page, err);
                return;
            }
        };

        for link in extract_links(&html, &page, scope) {
            if visited.contains(&link.url) || !produced.insert(link.url.clone()) {
                continue;
            }

            let kind = link.kind;
            items.push(WorkItem {
                url: link.url.clone(),
                kind,
                path: link.path,
            });

            if kind == LinkKind::Directory {
                if let Ok(next) = Url::parse(&link.url) {
                    collect(client, next, scope, visited, produced, items).await;
                }
            }
        }
    }
    .boxed()
}
