//! Shared store for scan results
//!
//! Two maps guarded by separate mutexes back the tree:
//! - the folder store maps folder paths to nodes and keeps the ordered
//!   top-level child list
//! - the file map holds one slot per file path; a slot is reserved when a
//!   worker claims the path and populated once its metadata resolves
//!
//! Lock discipline: only [`TreeModel::populate_file`] holds both locks,
//! taking the file lock first and the folder lock inside it. Every other
//! operation takes one lock at a time.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tracing::warn;
use url::Url;

use super::node::{ChildRef, FileNode, FolderNode, SelectedFile};

/// Bucket used by [`TreeModel::extension_counts`] for files without an
/// extension.
pub const NO_EXTENSION: &str = "(no extension)";

/// Slot state in the file map.
#[derive(Debug)]
enum FileSlot {
    /// Claimed by a scan worker, metadata not resolved yet.
    Reserved,
    /// Fully populated entry.
    Ready(FileNode),
}

#[derive(Debug, Default)]
struct FolderStore {
    by_path: HashMap<String, FolderNode>,
    /// Top-level entries in discovery order.
    roots: Vec<ChildRef>,
}

/// Concurrency-safe tree of folders and files built up during a scan.
///
/// Workers call [`reserve_file`](TreeModel::reserve_file), probe the file,
/// then either [`populate_file`](TreeModel::populate_file) or
/// [`rollback_file`](TreeModel::rollback_file). Folders are created with
/// [`ensure_folder`](TreeModel::ensure_folder), which is idempotent and
/// safe to call from any number of workers.
#[derive(Debug, Default)]
pub struct TreeModel {
    folders: Mutex<FolderStore>,
    files: Mutex<HashMap<String, FileSlot>>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates every missing folder along `path`, linking each new node
    /// under its parent, and returns the normalized path of the deepest
    /// folder (empty when `path` normalizes to nothing).
    ///
    /// `listing_url` is the listing page of the deepest folder; ancestor
    /// URLs are derived from it by dropping trailing path segments.
    /// Existing folders are left untouched, so repeated and concurrent
    /// calls converge on the same tree.
    pub fn ensure_folder(&self, path: &str, listing_url: &str) -> String {
        let mut folders = self.folders.lock().unwrap();
        Self::ensure_locked(&mut folders, path, listing_url)
    }

    fn ensure_locked(store: &mut FolderStore, path: &str, listing_url: &str) -> String {
        let normalized = normalize_tree_path(path);
        if normalized.is_empty() {
            return normalized;
        }
        let segments: Vec<&str> = normalized.split('/').collect();
        let mut parent: Option<String> = None;
        let mut current = String::new();
        for (depth, segment) in segments.iter().enumerate() {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            if !store.by_path.contains_key(&current) {
                let node = FolderNode {
                    path: current.clone(),
                    source_url: ancestor_listing_url(listing_url, segments.len() - 1 - depth),
                    parent: parent.clone(),
                    children: Vec::new(),
                    selected: false,
                };
                store.by_path.insert(current.clone(), node);
                let link = ChildRef::Folder(current.clone());
                match &parent {
                    Some(parent_path) => {
                        if let Some(parent_node) = store.by_path.get_mut(parent_path) {
                            parent_node.children.push(link);
                        }
                    }
                    None => store.roots.push(link),
                }
            }
            parent = Some(current.clone());
        }
        current
    }

    /// Claims `path` for the calling worker.
    ///
    /// Returns `false` when another worker already reserved or populated
    /// the slot, in which case the caller must skip the file without
    /// probing it.
    pub fn reserve_file(&self, path: &str) -> bool {
        let mut files = self.files.lock().unwrap();
        match files.entry(path.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(FileSlot::Reserved);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Fills a previously reserved slot with resolved metadata and links
    /// the file under its folder, creating missing ancestors first.
    ///
    /// Populating a slot that was never reserved, or one that is already
    /// populated, is a protocol violation by the caller: the store is left
    /// unchanged, a warning is logged, and `false` comes back.
    pub fn populate_file(&self, node: FileNode) -> bool {
        let mut files = self.files.lock().unwrap();
        match files.get(&node.path) {
            Some(FileSlot::Reserved) => {}
            Some(FileSlot::Ready(_)) => {
                warn!("file {} populated twice, keeping the first entry", node.path);
                return false;
            }
            None => {
                warn!("file {} populated without a reservation", node.path);
                return false;
            }
        }
        {
            let mut folders = self.folders.lock().unwrap();
            let link = ChildRef::File(node.path.clone());
            match &node.folder {
                Some(folder_path) => {
                    let parent_url = ancestor_listing_url(&node.source_url, 1);
                    let parent = Self::ensure_locked(&mut folders, folder_path, &parent_url);
                    match folders.by_path.get_mut(&parent) {
                        Some(parent_node) => parent_node.children.push(link),
                        None => folders.roots.push(link),
                    }
                }
                None => folders.roots.push(link),
            }
        }
        files.insert(node.path.clone(), FileSlot::Ready(node));
        true
    }

    /// Releases a reservation after a failed probe so the path can be
    /// reclaimed later. Populated entries are left alone.
    pub fn rollback_file(&self, path: &str) {
        let mut files = self.files.lock().unwrap();
        if let Some(FileSlot::Reserved) = files.get(path) {
            files.remove(path);
        }
    }

    /// Drops every folder and file. Callers must not clear the model
    /// while scan workers are still inserting into it.
    pub fn clear(&self) {
        {
            let mut folders = self.folders.lock().unwrap();
            folders.by_path.clear();
            folders.roots.clear();
        }
        self.files.lock().unwrap().clear();
    }

    /// Sets the selection flag on one file. Returns `false` for paths
    /// that are unknown or still reserved.
    pub fn set_file_selected(&self, path: &str, selected: bool) -> bool {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(path) {
            Some(FileSlot::Ready(node)) => {
                node.selected = selected;
                true
            }
            _ => false,
        }
    }

    /// Applies `selected` to a folder and everything beneath it.
    pub fn set_folder_selected(&self, path: &str, selected: bool) {
        let mut touched_files = Vec::new();
        {
            let mut folders = self.folders.lock().unwrap();
            let mut stack = vec![normalize_tree_path(path)];
            while let Some(folder_path) = stack.pop() {
                if let Some(node) = folders.by_path.get_mut(&folder_path) {
                    node.selected = selected;
                    for child in &node.children {
                        match child {
                            ChildRef::Folder(child_path) => stack.push(child_path.clone()),
                            ChildRef::File(file_path) => touched_files.push(file_path.clone()),
                        }
                    }
                }
            }
        }
        let mut files = self.files.lock().unwrap();
        for file_path in &touched_files {
            if let Some(FileSlot::Ready(node)) = files.get_mut(file_path) {
                node.selected = selected;
            }
        }
    }

    /// Applies `selected` to every folder and file in the model.
    pub fn select_all(&self, selected: bool) {
        {
            let mut folders = self.folders.lock().unwrap();
            for node in folders.by_path.values_mut() {
                node.selected = selected;
            }
        }
        let mut files = self.files.lock().unwrap();
        for slot in files.values_mut() {
            if let FileSlot::Ready(node) = slot {
                node.selected = selected;
            }
        }
    }

    /// Applies `selected` to every file whose extension matches `ext`
    /// (leading dot optional, case-insensitive). Returns how many files
    /// actually changed.
    pub fn set_extension_selected(&self, ext: &str, selected: bool) -> usize {
        let wanted = ext.trim().trim_start_matches('.').to_lowercase();
        let mut changed = 0;
        let mut files = self.files.lock().unwrap();
        for slot in files.values_mut() {
            if let FileSlot::Ready(node) = slot {
                if node.extension().as_deref() == Some(wanted.as_str())
                    && node.selected != selected
                {
                    node.selected = selected;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Per-extension file counts, sorted by extension. Files without an
    /// extension are grouped under [`NO_EXTENSION`].
    pub fn extension_counts(&self) -> BTreeMap<String, usize> {
        let files = self.files.lock().unwrap();
        let mut counts = BTreeMap::new();
        for slot in files.values() {
            if let FileSlot::Ready(node) = slot {
                let key = node.extension().unwrap_or_else(|| NO_EXTENSION.to_string());
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Snapshot of every selected file, sorted by path for stable
    /// ordering.
    pub fn selected_files(&self) -> Vec<SelectedFile> {
        let files = self.files.lock().unwrap();
        let mut selected: Vec<SelectedFile> = files
            .values()
            .filter_map(|slot| match slot {
                FileSlot::Ready(node) if node.selected => Some(SelectedFile {
                    path: node.path.clone(),
                    name: node.name.clone(),
                    url: node.source_url.clone(),
                }),
                _ => None,
            })
            .collect();
        selected.sort_by(|a, b| a.path.cmp(&b.path));
        selected
    }

    /// Number of fully populated files. Reservations do not count.
    pub fn file_count(&self) -> usize {
        let files = self.files.lock().unwrap();
        files
            .values()
            .filter(|slot| matches!(slot, FileSlot::Ready(_)))
            .count()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.lock().unwrap().by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folder_count() == 0 && self.file_count() == 0
    }

    /// Clone of one populated file entry.
    pub fn file(&self, path: &str) -> Option<FileNode> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(FileSlot::Ready(node)) => Some(node.clone()),
            _ => None,
        }
    }

    /// Clone of one folder entry.
    pub fn folder(&self, path: &str) -> Option<FolderNode> {
        let folders = self.folders.lock().unwrap();
        folders.by_path.get(&normalize_tree_path(path)).cloned()
    }

    /// Ordered top-level entries.
    pub fn roots(&self) -> Vec<ChildRef> {
        self.folders.lock().unwrap().roots.clone()
    }
}

/// Collapses `.` and `..` segments and squeezes duplicate slashes,
/// returning a relative path with no leading or trailing slash.
fn normalize_tree_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Drops `levels` trailing path segments from `url`, keeping the result
/// directory-shaped. Falls back to the input when it does not parse.
fn ancestor_listing_url(url: &str, levels: usize) -> String {
    if levels == 0 {
        return url.to_string();
    }
    match Url::parse(url) {
        Ok(mut parsed) => {
            let trimmed = parsed.path().trim_end_matches('/').to_string();
            let mut segments: Vec<&str> =
                trimmed.split('/').filter(|s| !s.is_empty()).collect();
            for _ in 0..levels {
                segments.pop();
            }
            let mut ancestor = format!("/{}", segments.join("/"));
            if !ancestor.ends_with('/') {
                ancestor.push('/');
            }
            parsed.set_path(&ancestor);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    fn ready_file(path: &str, url: &str) -> FileNode {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let folder = path.rfind('/').map(|idx| path[..idx].to_string());
        FileNode {
            path: path.to_string(),
            name,
            source_url: url.to_string(),
            size_bytes: Some(1024),
            content_type: "application/octet-stream".to_string(),
            folder,
            selected: false,
        }
    }

    #[test]
    fn ensure_folder_creates_missing_ancestors() {
        let model = TreeModel::new();
        let leaf = model.ensure_folder("pub/iso/x86", "http://example.com/pub/iso/x86/");
        assert_eq!(leaf, "pub/iso/x86");
        assert_eq!(model.folder_count(), 3);

        let top = model.folder("pub").unwrap();
        assert_eq!(top.parent, None);
        assert_eq!(top.source_url, "http://example.com/pub/");
        assert_eq!(top.children, vec![ChildRef::Folder("pub/iso".to_string())]);

        let mid = model.folder("pub/iso").unwrap();
        assert_eq!(mid.parent, Some("pub".to_string()));
        assert_eq!(mid.source_url, "http://example.com/pub/iso/");

        assert_eq!(model.roots(), vec![ChildRef::Folder("pub".to_string())]);
    }

    #[test]
    fn ensure_folder_is_idempotent() {
        let model = TreeModel::new();
        model.ensure_folder("pub/iso", "http://example.com/pub/iso/");
        model.ensure_folder("pub/iso", "http://example.com/pub/iso/");
        model.ensure_folder("pub", "http://example.com/pub/");

        assert_eq!(model.folder_count(), 2);
        assert_eq!(model.folder("pub").unwrap().children.len(), 1);
        assert_eq!(model.roots().len(), 1);
    }

    #[test]
    fn ensure_folder_normalizes_odd_paths() {
        let model = TreeModel::new();
        assert_eq!(
            model.ensure_folder("/pub//iso/", "http://example.com/pub/iso/"),
            "pub/iso"
        );
        assert_eq!(model.ensure_folder("", "http://example.com/"), "");
        assert_eq!(model.folder_count(), 2);
    }

    #[test]
    fn tree_path_normalization() {
        assert_eq!(normalize_tree_path("a/b/../c"), "a/c");
        assert_eq!(normalize_tree_path("./a//b/"), "a/b");
        assert_eq!(normalize_tree_path("../.."), "");
    }

    #[test]
    fn concurrent_ensure_folder_converges() {
        let model = Arc::new(TreeModel::new());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for worker in 0..8 {
            let model = Arc::clone(&model);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                let path = format!("shared/deep/w{}", worker % 4);
                let url = format!("http://example.com/shared/deep/w{}/", worker % 4);
                model.ensure_folder(&path, &url);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // shared, shared/deep, and four distinct leaves
        assert_eq!(model.folder_count(), 6);
        assert_eq!(model.roots().len(), 1);
        assert_eq!(model.folder("shared/deep").unwrap().children.len(), 4);
    }

    #[test]
    fn reserve_is_exclusive() {
        let model = TreeModel::new();
        assert!(model.reserve_file("pub/a.iso"));
        assert!(!model.reserve_file("pub/a.iso"));
    }

    #[test]
    fn concurrent_reserve_admits_one_worker() {
        let model = Arc::new(TreeModel::new());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let model = Arc::clone(&model);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                model.reserve_file("pub/contested.iso")
            }));
        }
        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn populate_fills_reservation_and_links_file() {
        let model = TreeModel::new();
        assert!(model.reserve_file("pub/a.iso"));
        assert!(model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso")));

        let node = model.file("pub/a.iso").unwrap();
        assert_eq!(node.name, "a.iso");
        assert_eq!(model.file_count(), 1);

        let folder = model.folder("pub").unwrap();
        assert_eq!(folder.source_url, "http://example.com/pub/");
        assert_eq!(folder.children, vec![ChildRef::File("pub/a.iso".to_string())]);
    }

    #[test]
    fn populate_without_reservation_is_rejected() {
        let model = TreeModel::new();
        assert!(!model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso")));
        assert_eq!(model.file_count(), 0);
        assert!(model.folder("pub").is_none());
    }

    #[test]
    fn populate_twice_keeps_first_entry() {
        let model = TreeModel::new();
        assert!(model.reserve_file("pub/a.iso"));
        assert!(model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso")));

        let mut replacement = ready_file("pub/a.iso", "http://example.com/pub/a.iso");
        replacement.size_bytes = Some(4096);
        assert!(!model.populate_file(replacement));
        assert_eq!(model.file("pub/a.iso").unwrap().size_bytes, Some(1024));
        assert_eq!(model.folder("pub").unwrap().children.len(), 1);
    }

    #[test]
    fn rollback_releases_only_reservations() {
        let model = TreeModel::new();
        assert!(model.reserve_file("pub/a.iso"));
        model.rollback_file("pub/a.iso");
        assert!(model.reserve_file("pub/a.iso"));

        assert!(model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso")));
        model.rollback_file("pub/a.iso");
        assert_eq!(model.file_count(), 1);
    }

    #[test]
    fn root_level_file_attaches_to_roots() {
        let model = TreeModel::new();
        assert!(model.reserve_file("index.txt"));
        let node = ready_file("index.txt", "http://example.com/index.txt");
        assert_eq!(node.folder, None);
        assert!(model.populate_file(node));
        assert_eq!(model.roots(), vec![ChildRef::File("index.txt".to_string())]);
    }

    #[test]
    fn clear_drops_everything() {
        let model = TreeModel::new();
        model.ensure_folder("pub", "http://example.com/pub/");
        model.reserve_file("pub/a.iso");
        model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso"));
        model.clear();

        assert!(model.is_empty());
        assert!(model.roots().is_empty());
        assert!(model.reserve_file("pub/a.iso"));
    }

    #[test]
    fn folder_selection_cascades() {
        let model = TreeModel::new();
        for path in ["pub/a.iso", "pub/iso/b.iso"] {
            assert!(model.reserve_file(path));
            let url = format!("http://example.com/{}", path);
            assert!(model.populate_file(ready_file(path, &url)));
        }

        model.set_folder_selected("pub", true);
        assert!(model.folder("pub").unwrap().selected);
        assert!(model.folder("pub/iso").unwrap().selected);
        assert_eq!(model.selected_files().len(), 2);

        model.set_folder_selected("pub/iso", false);
        let selected = model.selected_files();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].path, "pub/a.iso");
    }

    #[test]
    fn select_all_and_single_file_toggle() {
        let model = TreeModel::new();
        assert!(model.reserve_file("pub/a.iso"));
        assert!(model.populate_file(ready_file("pub/a.iso", "http://example.com/pub/a.iso")));

        model.select_all(true);
        assert_eq!(model.selected_files().len(), 1);

        assert!(model.set_file_selected("pub/a.iso", false));
        assert!(model.selected_files().is_empty());
        assert!(!model.set_file_selected("pub/missing.iso", true));
    }

    #[test]
    fn extension_selection_and_counts() {
        let model = TreeModel::new();
        for path in ["pub/a.iso", "pub/b.ISO", "pub/notes.txt", "pub/README"] {
            assert!(model.reserve_file(path));
            let url = format!("http://example.com/{}", path);
            assert!(model.populate_file(ready_file(path, &url)));
        }

        let counts = model.extension_counts();
        assert_eq!(counts.get("iso"), Some(&2));
        assert_eq!(counts.get("txt"), Some(&1));
        assert_eq!(counts.get(NO_EXTENSION), Some(&1));

        assert_eq!(model.set_extension_selected(".ISO", true), 2);
        assert_eq!(model.set_extension_selected("iso", true), 0);
        let selected = model.selected_files();
        assert_eq!(selected.len(), 2);
        assert!(selected
            .iter()
            .all(|file| file.path.to_lowercase().ends_with(".iso")));
    }
}
