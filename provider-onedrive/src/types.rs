//! Microsoft Graph response types
//!
//! Data structures for deserializing the selective `driveItem` queries the
//! connector issues, and the decoded shapes handed to the collector.

use serde::Deserialize;

/// Graph `driveItem` resource, restricted to the selected fields.
///
/// See: https://learn.microsoft.com/graph/api/resources/driveitem
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    /// Item name
    pub name: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// Pre-authenticated download URL (files only)
    #[serde(
        rename = "@microsoft.graph.downloadUrl",
        alias = "downloadUrl",
        default
    )]
    pub download_url: Option<String>,

    /// Present when the item is a folder
    #[serde(default)]
    pub folder: Option<FolderFacet>,
}

/// Graph `folder` facet
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: u64,
}

/// Graph `children` collection response
#[derive(Debug, Deserialize)]
pub struct ChildrenResponse {
    #[serde(default)]
    pub value: Vec<DriveItem>,

    /// Link to the next page, when the listing is paginated
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Graph error envelope
#[derive(Debug, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSummary {
    pub name: String,
    pub size: u64,
    pub download_url: Option<String>,
    /// Zero for files and empty folders
    pub child_count: u64,
}

impl ChildSummary {
    /// A child with a nonzero child count is a subfolder to descend into.
    pub fn has_children(&self) -> bool {
        self.child_count != 0
    }
}

impl From<DriveItem> for ChildSummary {
    fn from(item: DriveItem) -> Self {
        Self {
            name: item.name,
            size: item.size,
            download_url: item.download_url,
            child_count: item.folder.map(|f| f.child_count).unwrap_or(0),
        }
    }
}

/// A single file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub name: String,
    pub size: u64,
    pub download_url: Option<String>,
}

impl From<DriveItem> for ItemSummary {
    fn from(item: DriveItem) -> Self {
        Self {
            name: item.name,
            size: item.size,
            download_url: item.download_url,
        }
    }
}

/// Decoded answer to one reader query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteNode {
    /// Children of a folder, in server order
    Listing(Vec<ChildSummary>),
    /// A single file
    Item(ItemSummary),
}
