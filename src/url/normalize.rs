use url::Url;

use crate::url::LinkKind;
use crate::RipperError;

/// A canonicalized, in-scope link produced by [`classify_href`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLink {
    /// Absolute URL: `scheme://host/path`, query and fragment stripped.
    /// Directories keep exactly one trailing slash, files none.
    pub url: String,

    /// Directory or file, per the classification rules below.
    pub kind: LinkKind,

    /// The percent-encoded path component of `url`.
    pub path: String,
}

/// Classifies a raw anchor href against a page base and the crawl scope.
///
/// Returns `None` when the href is rejected:
/// - empty, `.`, `..`, `/`, or query-only (`?...`, e.g. listing sort links)
/// - fails to resolve against `base`
/// - the resolved URL does not start with the `scope` prefix
///
/// Otherwise the link is canonicalized to `scheme://host/path` and
/// classified. A resolved path ending in `/` is a directory, unless the last
/// segment (after stripping the slash) contains a `.`; some servers emit
/// spurious trailing slashes on dotted filenames, and those are reclassified
/// as files.
///
/// # Arguments
///
/// * `href` - The raw anchor href attribute
/// * `base` - The URL of the page the href appeared on
/// * `scope` - The crawl root as originally given; string-prefix containment
///   is the scope boundary
///
/// # Example
///
/// ```
/// use url::Url;
/// use index_ripper::url::{classify_href, LinkKind};
///
/// let base = Url::parse("http://files.example.com/pub/").unwrap();
/// let link = classify_href("docs/", &base, "http://files.example.com/pub/").unwrap();
/// assert_eq!(link.url, "http://files.example.com/pub/docs/");
/// assert_eq!(link.kind, LinkKind::Directory);
/// ```
pub fn classify_href(href: &str, base: &Url, scope: &str) -> Option<NormalizedLink> {
    let href = href.trim();

    // Self-references, parent links, and sort anchors are never work.
    if href.is_empty() || href == "." || href == ".." || href == "/" || href.starts_with('?') {
        return None;
    }

    let resolved = base.join(href).ok()?;

    // Scope check runs on the resolved URL before any stripping, so a link
    // whose query carries it out of scope is still compared as served.
    if !resolved.as_str().starts_with(scope) {
        return None;
    }

    let mut link = resolved;
    link.set_query(None);
    link.set_fragment(None);

    let path = link.path().to_string();
    let (kind, normalized_path) = if path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let last_segment = trimmed.rsplit('/').next().unwrap_or("");
        if last_segment.contains('.') {
            (LinkKind::File, trimmed.to_string())
        } else {
            (LinkKind::Directory, format!("{}/", trimmed))
        }
    } else {
        (LinkKind::File, path)
    };
    link.set_path(&normalized_path);

    Some(NormalizedLink {
        url: link.to_string(),
        kind,
        path: normalized_path,
    })
}

/// Parses and canonicalizes a crawl root URL.
///
/// The scheme must be HTTP or HTTPS; query and fragment are dropped. An
/// empty path becomes `/`. Note the *raw* root string, not this value, is
/// what scope containment compares against.
///
/// # Returns
///
/// * `Ok(Url)` - The canonical root, ready to fetch and to seed the visited set
/// * `Err(RipperError)` - The root is malformed or uses an unsupported scheme
pub fn normalize_root(raw: &str) -> Result<Url, RipperError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| RipperError::InvalidRootUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(RipperError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://files.test/pub/").unwrap()
    }

    const SCOPE: &str = "http://files.test/pub/";

    #[test]
    fn test_reject_empty_href() {
        assert!(classify_href("", &base(), SCOPE).is_none());
        assert!(classify_href("   ", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_reject_dot_segments() {
        assert!(classify_href(".", &base(), SCOPE).is_none());
        assert!(classify_href("..", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_reject_root_href() {
        assert!(classify_href("/", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_reject_query_only_href() {
        // Apache listing column-sort links.
        assert!(classify_href("?C=M;O=A", &base(), SCOPE).is_none());
        assert!(classify_href("?C=N;O=D", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_reject_out_of_scope() {
        assert!(classify_href("http://other.test/file.txt", &base(), SCOPE).is_none());
        // Parent of the scope root escapes the prefix.
        assert!(classify_href("/outside.txt", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_reject_special_schemes() {
        // Resolved absolute URLs with foreign schemes never match the scope.
        assert!(classify_href("javascript:void(0)", &base(), SCOPE).is_none());
        assert!(classify_href("mailto:admin@files.test", &base(), SCOPE).is_none());
    }

    #[test]
    fn test_relative_file() {
        let link = classify_href("report.pdf", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/report.pdf");
        assert_eq!(link.kind, LinkKind::File);
        assert_eq!(link.path, "/pub/report.pdf");
    }

    #[test]
    fn test_relative_directory() {
        let link = classify_href("docs/", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/docs/");
        assert_eq!(link.kind, LinkKind::Directory);
    }

    #[test]
    fn test_absolute_in_scope() {
        let link = classify_href("http://files.test/pub/data/", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/data/");
        assert_eq!(link.kind, LinkKind::Directory);
    }

    #[test]
    fn test_dotted_trailing_slash_is_file() {
        // Misconfigured servers emit "photo.jpg/" for plain files.
        let link = classify_href("photo.jpg/", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/photo.jpg");
        assert_eq!(link.kind, LinkKind::File);
    }

    #[test]
    fn test_undotted_trailing_slash_is_directory() {
        let link = classify_href("archive/", &base(), SCOPE).unwrap();
        assert_eq!(link.kind, LinkKind::Directory);
        assert!(link.url.ends_with("/archive/"));
    }

    #[test]
    fn test_query_stripped_from_file() {
        let link = classify_href("file.txt?download=1", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/file.txt");
    }

    #[test]
    fn test_fragment_stripped() {
        let link = classify_href("file.txt#top", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/file.txt");
    }

    #[test]
    fn test_double_trailing_slash_collapsed() {
        let link = classify_href("sub//", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/sub/");
        assert_eq!(link.kind, LinkKind::Directory);
    }

    #[test]
    fn test_current_dir_href_resolves_to_base() {
        // "./" is not in the rejection list; it resolves to the page itself
        // and the walker's visited set screens it out.
        let link = classify_href("./", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/");
        assert_eq!(link.kind, LinkKind::Directory);
    }

    #[test]
    fn test_nested_relative_resolution() {
        let deep = Url::parse("http://files.test/pub/a/b/").unwrap();
        let link = classify_href("c.txt", &deep, SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/a/b/c.txt");
    }

    #[test]
    fn test_percent_encoded_path_preserved() {
        let link = classify_href("my%20file.txt", &base(), SCOPE).unwrap();
        assert_eq!(link.url, "http://files.test/pub/my%20file.txt");
        assert_eq!(link.path, "/pub/my%20file.txt");
    }

    #[test]
    fn test_normalize_root_empty_path_becomes_slash() {
        let root = normalize_root("http://files.test").unwrap();
        assert_eq!(root.as_str(), "http://files.test/");
    }

    #[test]
    fn test_normalize_root_drops_query_and_fragment() {
        let root = normalize_root("http://files.test/pub/?C=M#top").unwrap();
        assert_eq!(root.as_str(), "http://files.test/pub/");
    }

    #[test]
    fn test_normalize_root_trims_whitespace() {
        let root = normalize_root("  http://files.test/pub/  ").unwrap();
        assert_eq!(root.as_str(), "http://files.test/pub/");
    }

    #[test]
    fn test_normalize_root_rejects_malformed() {
        assert!(matches!(
            normalize_root("not a url"),
            Err(RipperError::InvalidRootUrl { .. })
        ));
    }

    #[test]
    fn test_normalize_root_rejects_foreign_scheme() {
        assert!(matches!(
            normalize_root("ftp://files.test/pub/"),
            Err(RipperError::UnsupportedScheme { .. })
        ));
    }
}
