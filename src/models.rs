//! Data models for Yandex.Disk API responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata attributes requested when trimming listings server-side.
pub const METADATA_FIELDS: [&str; 8] = [
    "name", "type", "path", "size", "created", "modified", "revision", "file",
];

/// `fields` filter covering the items of an embedded directory listing.
pub fn embedded_fields() -> String {
    METADATA_FIELDS
        .iter()
        .map(|f| format!("_embedded.items.{f}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// `fields` filter covering the items of a flat file listing.
pub fn flat_fields() -> String {
    METADATA_FIELDS
        .iter()
        .map(|f| format!("items.{f}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Metadata for a file or folder on the disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetadata {
    pub name: String,
    /// `"dir"` or `"file"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub revision: Option<u64>,
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    /// Original location of a trashed resource.
    #[serde(default)]
    pub origin_path: Option<String>,
    /// Direct download URL, present on file resources.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<ResourceList>,
}

impl ResourceMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }

    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

impl std::fmt::Display for ResourceMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        let modified = self.modified.as_deref().unwrap_or("-");
        write!(f, "{}\t{}\t{}\t{}", self.kind, size_str, modified, self.path)
    }
}

/// Format a byte count into a human-readable size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Directory listing embedded in a resource's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub items: Vec<ResourceMetadata>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Flat listing of files, as returned by the media-filtered endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<ResourceMetadata>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// A link object: upload targets, operation handles, published URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub templated: bool,
}

/// Status of a server-side long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    Success,
    Failed,
    InProgress,
}

/// Payload of the operations endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub status: OperationStatus,
}

/// Capacity and usage information for the whole disk.
#[derive(Debug, Clone, Deserialize)]
pub struct DiskInfo {
    pub total_space: u64,
    pub used_space: u64,
    #[serde(default)]
    pub trash_size: Option<u64>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub system_folders: HashMap<String, String>,
}
