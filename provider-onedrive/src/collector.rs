//! Tree collector
//!
//! Expands the configured targets into a flat [`Collection`] of download
//! items. The walk is depth-first and follows server order, so the collection
//! order is fully determined by target order and listing order.
//!
//! Collection is best-effort. A target or subfolder that fails to load is
//! logged and skipped, and the walk carries on with its siblings.

use bridge_traits::storage::{Collection, DownloadItem, Target};
use core_runtime::logging::strip_query;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connector::DriveReader;
use crate::error::OneDriveError;
use crate::types::{ChildSummary, RemoteNode};

/// A folder whose listing is partially consumed.
struct Frame {
    /// Drive path with names as the server spells them
    path: String,
    /// The same path with every collected name percent-encoded, as fetched
    remote_path: String,
    children: std::vec::IntoIter<ChildSummary>,
}

/// Drives recursive expansion of targets through a [`DriveReader`].
pub struct TreeCollector {
    reader: Arc<dyn DriveReader>,
}

impl TreeCollector {
    pub fn new(reader: Arc<dyn DriveReader>) -> Self {
        Self { reader }
    }

    /// Collect every downloadable file under `targets`, in target order.
    ///
    /// An entry with a zero child count but no download URL (an empty
    /// folder) is skipped with a warning rather than collected as a file.
    pub async fn collect(&self, targets: &[Target]) -> Collection {
        let mut collection = Collection::new();

        for target in targets {
            let before = collection.len();
            if target.is_folder {
                self.expand_folder(&target.path, &mut collection).await;
            } else {
                self.collect_file(target, &mut collection).await;
            }
            debug!(
                path = %target.path,
                folder = target.is_folder,
                items = collection.len() - before,
                "Target collected"
            );
        }

        info!(
            items = collection.len(),
            bytes = collection.total_size(),
            "Collection complete"
        );
        collection
    }

    async fn collect_file(&self, target: &Target, collection: &mut Collection) {
        let item = match self.reader.fetch(&target.path, false).await {
            Ok(RemoteNode::Item(item)) => item,
            Ok(RemoteNode::Listing(_)) => {
                let err = OneDriveError::UnexpectedShape {
                    path: target.path.clone(),
                    expected: "item",
                };
                warn!(error = %err, "Skipping target");
                return;
            }
            Err(err) => {
                warn!(path = %target.path, error = %err, "Skipping target");
                return;
            }
        };

        match item.download_url {
            Some(download_url) => {
                debug!(name = %item.name, url = strip_query(&download_url), "Found file");
                collection.push(DownloadItem {
                    name: item.name,
                    size: item.size,
                    path: target.path.clone(),
                    download_url,
                });
            }
            None => warn!(path = %target.path, "Target has no download URL; skipping"),
        }
    }

    /// Depth-first expansion of the folder at `root`.
    ///
    /// Uses an explicit stack of partially consumed listings so each subfolder
    /// is fully expanded before the next sibling of its parent is visited.
    async fn expand_folder(&self, root: &str, collection: &mut Collection) {
        let mut stack = Vec::new();
        if let Some(children) = self.list(root).await {
            stack.push(Frame {
                path: root.to_string(),
                remote_path: root.to_string(),
                children: children.into_iter(),
            });
        }

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };

            if child.has_children() {
                let path = child_path(&frame.path, &child.name);
                let remote_path =
                    child_path(&frame.remote_path, &urlencoding::encode(&child.name));
                if let Some(children) = self.list(&remote_path).await {
                    stack.push(Frame {
                        path,
                        remote_path,
                        children: children.into_iter(),
                    });
                }
                continue;
            }

            match child.download_url {
                Some(download_url) => {
                    debug!(
                        name = %child.name,
                        parent = %frame.path,
                        url = strip_query(&download_url),
                        "Found file"
                    );
                    collection.push(DownloadItem {
                        name: child.name,
                        size: child.size,
                        path: frame.path.clone(),
                        download_url,
                    });
                }
                None => warn!(
                    name = %child.name,
                    parent = %frame.path,
                    "Entry has no children and no download URL; skipping"
                ),
            }
        }
    }

    async fn list(&self, path: &str) -> Option<Vec<ChildSummary>> {
        match self.reader.fetch(path, true).await {
            Ok(RemoteNode::Listing(children)) => Some(children),
            Ok(RemoteNode::Item(_)) => {
                let err = OneDriveError::UnexpectedShape {
                    path: path.to_string(),
                    expected: "listing",
                };
                warn!(error = %err, "Skipping folder");
                None
            }
            Err(err) => {
                warn!(path, error = %err, "Skipping folder");
                None
            }
        }
    }
}

/// Path of the subfolder `name` inside `parent`.
fn child_path(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::ItemSummary;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Reader answering from a fixed script and recording every query.
    #[derive(Default)]
    struct ScriptedReader {
        listings: HashMap<String, Vec<ChildSummary>>,
        items: HashMap<String, ItemSummary>,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedReader {
        fn folder(mut self, path: &str, children: Vec<ChildSummary>) -> Self {
            self.listings.insert(path.to_string(), children);
            self
        }

        fn item(mut self, path: &str, name: &str, size: u64) -> Self {
            self.items.insert(
                path.to_string(),
                ItemSummary {
                    name: name.to_string(),
                    size,
                    download_url: Some(format!("http://x/{}", name)),
                },
            );
            self
        }

        fn calls(&self) -> Vec<(String, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DriveReader for ScriptedReader {
        async fn fetch(&self, path: &str, as_folder: bool) -> Result<RemoteNode> {
            self.calls.lock().unwrap().push((path.to_string(), as_folder));

            let found = if as_folder {
                self.listings.get(path).cloned().map(RemoteNode::Listing)
            } else {
                self.items.get(path).cloned().map(RemoteNode::Item)
            };
            found.ok_or_else(|| OneDriveError::ApiError {
                status_code: 404,
                code: "itemNotFound".to_string(),
                message: path.to_string(),
            })
        }
    }

    fn file(name: &str, size: u64) -> ChildSummary {
        ChildSummary {
            name: name.to_string(),
            size,
            download_url: Some(format!("http://x/{}", name)),
            child_count: 0,
        }
    }

    fn dir(name: &str, child_count: u64) -> ChildSummary {
        ChildSummary {
            name: name.to_string(),
            size: 0,
            download_url: None,
            child_count,
        }
    }

    fn names(collection: &Collection) -> Vec<&str> {
        collection.iter().map(|item| item.name.as_str()).collect()
    }

    async fn collect(reader: ScriptedReader, targets: &[Target]) -> (Collection, Arc<ScriptedReader>) {
        let reader = Arc::new(reader);
        let collector = TreeCollector::new(reader.clone());
        (collector.collect(targets).await, reader)
    }

    #[tokio::test]
    async fn test_single_file_target() {
        let reader = ScriptedReader::default().item("/docs/report.pdf", "report.pdf", 42);

        let (collection, reader) = collect(reader, &[Target::file("/docs/report.pdf")]).await;

        assert_eq!(
            collection.as_slice(),
            &[DownloadItem {
                name: "report.pdf".to_string(),
                size: 42,
                path: "/docs/report.pdf".to_string(),
                download_url: "http://x/report.pdf".to_string(),
            }]
        );
        assert_eq!(reader.calls(), vec![("/docs/report.pdf".to_string(), false)]);
    }

    #[tokio::test]
    async fn test_folder_of_files() {
        let reader = ScriptedReader::default().folder("/docs", vec![file("a.txt", 10)]);

        let (collection, _) = collect(reader, &[Target::folder("/docs")]).await;

        assert_eq!(
            collection.as_slice(),
            &[DownloadItem {
                name: "a.txt".to_string(),
                size: 10,
                path: "/docs".to_string(),
                download_url: "http://x/a.txt".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_depth_first_order() {
        let reader = ScriptedReader::default()
            .folder("/root", vec![dir("A", 2), dir("B", 1)])
            .folder("/root/A", vec![file("a1", 1), file("a2", 2)])
            .folder("/root/B", vec![file("b1", 3)]);

        let (collection, reader) = collect(reader, &[Target::folder("/root")]).await;

        assert_eq!(names(&collection), vec!["a1", "a2", "b1"]);
        let paths: Vec<_> = collection.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["/root/A", "/root/A", "/root/B"]);
        let fetched: Vec<_> = reader.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(fetched, vec!["/root", "/root/A", "/root/B"]);
    }

    #[tokio::test]
    async fn test_subfolder_is_expanded_before_later_siblings() {
        let reader = ScriptedReader::default()
            .folder("/r", vec![file("first", 1), dir("deep", 1), file("last", 1)])
            .folder("/r/deep", vec![dir("deeper", 1)])
            .folder("/r/deep/deeper", vec![file("bottom", 1)]);

        let (collection, _) = collect(reader, &[Target::folder("/r")]).await;

        assert_eq!(names(&collection), vec!["first", "bottom", "last"]);
        assert_eq!(collection.as_slice()[1].path, "/r/deep/deeper");
    }

    #[tokio::test]
    async fn test_failed_subfolder_keeps_siblings() {
        // "/root/A" is not scripted, so fetching it fails
        let reader = ScriptedReader::default()
            .folder("/root", vec![dir("A", 5), file("c.txt", 7)]);

        let (collection, _) = collect(reader, &[Target::folder("/root")]).await;

        assert_eq!(names(&collection), vec!["c.txt"]);
        assert_eq!(collection.as_slice()[0].path, "/root");
    }

    #[tokio::test]
    async fn test_empty_folder_contributes_nothing() {
        let reader = ScriptedReader::default().folder("/empty", vec![]);

        let (collection, reader) = collect(reader, &[Target::folder("/empty")]).await;

        assert!(collection.is_empty());
        assert_eq!(reader.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_target_is_skipped() {
        let reader = ScriptedReader::default().item("/b.txt", "b.txt", 1);

        let targets = [Target::folder("/missing"), Target::file("/b.txt")];
        let (collection, _) = collect(reader, &targets).await;

        assert_eq!(names(&collection), vec!["b.txt"]);
    }

    #[tokio::test]
    async fn test_target_order_is_preserved() {
        let reader = ScriptedReader::default()
            .item("/z.txt", "z.txt", 1)
            .folder("/a", vec![file("a.txt", 1)]);

        let targets = [Target::file("/z.txt"), Target::folder("/a")];
        let (collection, _) = collect(reader, &targets).await;

        assert_eq!(names(&collection), vec!["z.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_entries_without_download_url_are_skipped() {
        let reader = ScriptedReader::default()
            .folder("/docs", vec![dir("empty", 0), file("a.txt", 10)]);

        let (collection, reader) = collect(reader, &[Target::folder("/docs")]).await;

        assert_eq!(names(&collection), vec!["a.txt"]);
        // Empty folders are not descended into
        assert_eq!(reader.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_targets() {
        let (collection, reader) = collect(ScriptedReader::default(), &[]).await;

        assert!(collection.is_empty());
        assert!(reader.calls().is_empty());
    }

    #[tokio::test]
    async fn test_subfolder_names_are_encoded_for_fetching() {
        let reader = ScriptedReader::default()
            .folder("/docs", vec![dir("C# notes", 1), dir("100%", 1), dir("what?", 1)])
            .folder("/docs/C%23%20notes", vec![file("a.txt", 1)])
            .folder("/docs/100%25", vec![file("b.txt", 2)])
            .folder("/docs/what%3F", vec![dir("Q&A", 1)])
            .folder("/docs/what%3F/Q%26A", vec![file("c.txt", 3)]);

        let (collection, reader) = collect(reader, &[Target::folder("/docs")]).await;

        assert_eq!(names(&collection), vec!["a.txt", "b.txt", "c.txt"]);
        let paths: Vec<_> = collection.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["/docs/C# notes", "/docs/100%", "/docs/what?/Q&A"]);
        let fetched: Vec<_> = reader.calls().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            fetched,
            vec![
                "/docs",
                "/docs/C%23%20notes",
                "/docs/100%25",
                "/docs/what%3F",
                "/docs/what%3F/Q%26A"
            ]
        );
    }

    #[tokio::test]
    async fn test_target_path_is_fetched_verbatim() {
        let reader = ScriptedReader::default()
            .folder("/My%20Docs", vec![dir("sub dir", 1)])
            .folder("/My%20Docs/sub%20dir", vec![file("a.txt", 1)]);

        let (collection, _) = collect(reader, &[Target::folder("/My%20Docs")]).await;

        assert_eq!(collection.as_slice()[0].path, "/My%20Docs/sub dir");
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("/docs", "sub"), "/docs/sub");
        assert_eq!(child_path("/docs/", "sub"), "/docs/sub");
        assert_eq!(child_path("/", "sub"), "/sub");
    }
}
