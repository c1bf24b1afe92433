//! yandex_disk - An async client for the Yandex.Disk REST API.
//!
//! This library provides functionality to:
//! - Inspect file and folder metadata, with field filtering, sorting and paging
//! - Create folders; delete, copy and move resources
//! - Upload local files, or have the server fetch a remote URL
//! - Publish resources and resolve download / public links
//! - List, restore and purge trashed resources
//! - Poll the status of long-running server-side operations
//!
//! Every call starts from one of the client's scope entry points and chains
//! query parameters onto a [`ResourceRequest`], which a terminal operation
//! consumes. Parameters left unset (or empty, or `false`) are never sent.
//!
//! # Example
//!
//! ```no_run
//! use yandex_disk::DiskClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DiskClient::new("oauth-token");
//!
//!     let response = client.resource("disk:/docs").limit(20).get().await?;
//!     if let Some(listing) = response.body {
//!         println!("{listing:#}");
//!     }
//!
//!     client.resource("disk:/docs/report.pdf").copy_to("disk:/backup/report.pdf").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod request;

// Re-exports for convenience
pub use client::{ApiResponse, DiskClient};
pub use error::{DiskError, Result};
pub use models::{DiskInfo, Link, OperationStatus, ResourceMetadata};
pub use request::ResourceRequest;
