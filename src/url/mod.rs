//! URL handling for directory-listing crawls
//!
//! This module classifies raw anchor hrefs into in-scope directory or file
//! links, canonicalizes them, and validates the crawl root.

mod normalize;

// Re-export main functions
pub use normalize::{classify_href, normalize_root, NormalizedLink};

/// Kind of a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A nested listing page to walk into
    Directory,
    /// A downloadable leaf entry
    File,
}

impl LinkKind {
    /// Returns true if this link points at a nested listing.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns true if this link points at a downloadable file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }
}
