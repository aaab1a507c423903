//! Plain data nodes held by the tree model

/// Ordered reference from a folder to one child entry.
///
/// Children are stored by path rather than by value so that a file can be
/// looked up and mutated through the file map without walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRef {
    /// Child folder, identified by its folder path.
    Folder(String),
    /// Child file, identified by its file path.
    File(String),
}

/// A folder in the reconstructed listing hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Relative path with no leading or trailing slash, e.g. `pub/iso`.
    pub path: String,
    /// Listing page this folder was reconstructed from.
    pub source_url: String,
    /// Parent folder path; `None` for top-level folders.
    pub parent: Option<String>,
    /// Child entries in discovery order.
    pub children: Vec<ChildRef>,
    /// Download selection flag. New folders start unselected.
    pub selected: bool,
}

/// A file with metadata resolved by the probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Relative path including the file name, e.g. `pub/iso/disk1.iso`.
    pub path: String,
    /// Decoded file name, the last path segment.
    pub name: String,
    /// Fully qualified download URL.
    pub source_url: String,
    /// Reported `Content-Length`, when the server sent one.
    pub size_bytes: Option<u64>,
    /// Reported `Content-Type`, `"Unknown"` when absent.
    pub content_type: String,
    /// Containing folder path; `None` for files at the listing root.
    pub folder: Option<String>,
    /// Download selection flag. New files start unselected.
    pub selected: bool,
}

impl FileNode {
    /// Human-readable size used in listings and progress output.
    pub fn size_label(&self) -> String {
        match self.size_bytes {
            Some(bytes) => format!("{:.2} KB", bytes as f64 / 1024.0),
            None => "Unknown".to_string(),
        }
    }

    /// Lowercased extension after the last dot. Dotless names and
    /// leading-dot names like `.htaccess` have no extension.
    pub fn extension(&self) -> Option<String> {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => Some(self.name[idx + 1..].to_lowercase()),
            _ => None,
        }
    }
}

/// Flat view of one selected file, handed to the download queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub name: String,
    pub url: String,
}
