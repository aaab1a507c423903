//! Concurrency-safe tree of discovered folders and files
//!
//! Scan workers insert into the model from many tasks at once while the
//! consumer renders it or queues downloads from it. All shared state sits
//! behind module-internal mutexes; callers only ever see the atomic
//! operations on [`TreeModel`].

mod node;
mod tree;

pub use node::{ChildRef, FileNode, FolderNode, SelectedFile};
pub use tree::{TreeModel, NO_EXTENSION};
