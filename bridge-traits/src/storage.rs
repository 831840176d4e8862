//! Remote Storage Values
//!
//! Plain values shared between the drive provider, which produces them, and
//! the download dispatcher, which consumes them.

use serde::{Deserialize, Serialize};

/// A configured traversal root.
///
/// Deserializes from the `downloadFiles` entries of the configuration file,
/// where the folder flag is spelled `folder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Drive path, starting with `/`, relative to the drive root
    pub path: String,

    /// Whether the path names a folder to expand or a single file
    #[serde(rename = "folder", default)]
    pub is_folder: bool,
}

impl Target {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_folder: false,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_folder: true,
        }
    }
}

/// A single downloadable file discovered in the remote tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    /// File name
    pub name: String,

    /// File size in bytes
    pub size: u64,

    /// Parent directory of the file, without the file name
    pub path: String,

    /// Pre-authenticated direct download URL
    pub download_url: String,
}

/// Ordered, append-only sequence of [`DownloadItem`]s.
///
/// Built by the tree collector and then handed by value to the dispatcher.
/// There is no way to remove or reorder entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    items: Vec<DownloadItem>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: DownloadItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DownloadItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[DownloadItem] {
        &self.items
    }

    /// Total size in bytes of every item.
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size).sum()
    }
}

impl IntoIterator for Collection {
    type Item = DownloadItem;
    type IntoIter = std::vec::IntoIter<DownloadItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a DownloadItem;
    type IntoIter = std::slice::Iter<'a, DownloadItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
