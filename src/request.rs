//! Per-call request configuration for disk resources.

use std::path::Path;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::{ApiResponse, DiskClient};
use crate::error::{DiskError, Result};

/// Pending query parameters for one API call.
///
/// Values that are unset, empty, or `false` never reach the wire.
#[derive(Debug, Default, Clone)]
pub(crate) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub(crate) fn push_str(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            if !value.is_empty() {
                self.0.push((key.to_string(), value.to_string()));
            }
        }
    }

    pub(crate) fn push_bool(&mut self, key: &str, value: Option<bool>) {
        if value == Some(true) {
            self.0.push((key.to_string(), "true".to_string()));
        }
    }

    pub(crate) fn push_u64(&mut self, key: &str, value: Option<u64>) {
        if let Some(value) = value {
            self.0.push((key.to_string(), value.to_string()));
        }
    }

    pub(crate) fn into_inner(self) -> Vec<(String, String)> {
        self.0
    }
}

/// One pending API call against a resource, normal or trash scoped.
///
/// Configuration methods take and return the request by value; a terminal
/// operation consumes it for good. Obtained from [`DiskClient::resource`],
/// [`DiskClient::resources`] or [`DiskClient::trash`].
#[derive(Clone)]
pub struct ResourceRequest<'a> {
    client: &'a DiskClient,
    trash: bool,
    path: Option<String>,
    fields: Option<String>,
    sort: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    overwrite: Option<bool>,
    force_async: Option<bool>,
    permanently: Option<bool>,
    md5: Option<String>,
    media_type: Option<String>,
    preview_size: Option<String>,
    preview_crop: Option<bool>,
    extra: Vec<(String, String)>,
}

impl<'a> ResourceRequest<'a> {
    pub(crate) fn new(client: &'a DiskClient, trash: bool, path: Option<String>) -> Self {
        Self {
            client,
            trash,
            path,
            fields: None,
            sort: None,
            limit: None,
            offset: None,
            overwrite: None,
            force_async: None,
            permanently: None,
            md5: None,
            media_type: None,
            preview_size: None,
            preview_crop: None,
            extra: Vec::new(),
        }
    }

    /// Replace the resource path this request targets.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Comma-separated list of JSON attributes the server should return.
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Sort key for listings, e.g. `"name"` or `"-modified"`.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Allow `copy_to`/`move_to`/`upload`/`restore` to replace an existing
    /// resource.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }

    /// Ask the server to run the operation asynchronously and reply with an
    /// operation link.
    pub fn force_async(mut self, force_async: bool) -> Self {
        self.force_async = Some(force_async);
        self
    }

    /// Skip the trash on `delete`.
    pub fn permanently(mut self, permanently: bool) -> Self {
        self.permanently = Some(permanently);
        self
    }

    /// Only delete if the resource's checksum matches.
    pub fn md5(mut self, md5: impl Into<String>) -> Self {
        self.md5 = Some(md5.into());
        self
    }

    /// Media type filter for the flat file listings.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn preview_size(mut self, preview_size: impl Into<String>) -> Self {
        self.preview_size = Some(preview_size.into());
        self
    }

    pub fn preview_crop(mut self, preview_crop: bool) -> Self {
        self.preview_crop = Some(preview_crop);
        self
    }

    /// Attach a free-form query parameter not covered by a dedicated setter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    fn base_params(&self) -> QueryParams {
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        params.push_str("fields", self.fields.as_deref());
        params.push_str("sort", self.sort.as_deref());
        params.push_u64("limit", self.limit);
        params.push_u64("offset", self.offset);
        for (key, value) in &self.extra {
            params.push_str(key, Some(value.as_str()));
        }
        params
    }

    fn url(&self, suffix: &str) -> String {
        self.client.resources_url(self.trash, suffix)
    }

    /// Fetch metadata for the configured resource.
    ///
    /// On a directory this includes the embedded listing, subject to
    /// `limit`/`offset`/`sort`.
    pub async fn get(self) -> Result<ApiResponse> {
        let params = self.base_params();
        self.client
            .request(Method::GET, &self.url(""), &params.into_inner())
            .await
    }

    /// Create a directory at the configured path.
    pub async fn create(self) -> Result<ApiResponse> {
        let params = self.base_params();
        self.client
            .request(Method::PUT, &self.url(""), &params.into_inner())
            .await
    }

    /// Create a directory one level below the configured path.
    pub async fn create_subdir(mut self, name: &str) -> Result<ApiResponse> {
        let base = self.path.take().unwrap_or_default();
        self.path = Some(format!("{base}/{name}"));
        self.create().await
    }

    /// Delete the configured resource.
    ///
    /// In normal mode the resource moves to the trash unless `permanently`
    /// is set; in trash mode this purges it.
    pub async fn delete(self) -> Result<ApiResponse> {
        let mut params = self.base_params();
        params.push_bool("permanently", self.permanently);
        params.push_str("md5", self.md5.as_deref());
        params.push_bool("force_async", self.force_async);
        self.client
            .request(Method::DELETE, &self.url(""), &params.into_inner())
            .await
    }

    /// Copy the configured resource to `destination`.
    pub async fn copy_to(self, destination: &str) -> Result<ApiResponse> {
        self.relocate("/copy", destination).await
    }

    /// Move the configured resource to `destination`.
    pub async fn move_to(self, destination: &str) -> Result<ApiResponse> {
        self.relocate("/move", destination).await
    }

    // `from` is the configured source path; `path` becomes the destination.
    async fn relocate(self, suffix: &str, destination: &str) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_str("from", self.path.as_deref());
        params.push_str("path", Some(destination));
        params.push_str("fields", self.fields.as_deref());
        params.push_bool("force_async", self.force_async);
        params.push_bool("overwrite", self.overwrite);
        self.client
            .request(Method::POST, &self.url(suffix), &params.into_inner())
            .await
    }

    /// Flat listing of all files on the disk, optionally media-filtered.
    pub async fn files(self) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_u64("limit", self.limit);
        params.push_u64("offset", self.offset);
        params.push_str("media_type", self.media_type.as_deref());
        params.push_bool("preview_crop", self.preview_crop);
        params.push_str("preview_size", self.preview_size.as_deref());
        params.push_str("fields", self.fields.as_deref());
        self.client
            .request(Method::GET, &self.url("/files"), &params.into_inner())
            .await
    }

    /// Files in upload order, newest first, optionally media-filtered.
    pub async fn last_uploaded(self) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_u64("limit", self.limit);
        params.push_str("media_type", self.media_type.as_deref());
        params.push_bool("preview_crop", self.preview_crop);
        params.push_str("preview_size", self.preview_size.as_deref());
        params.push_str("fields", self.fields.as_deref());
        self.client
            .request(Method::GET, &self.url("/last-uploaded"), &params.into_inner())
            .await
    }

    /// Obtain a short-lived direct download link for the configured resource.
    pub async fn download_link(self) -> Result<String> {
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        let response = self
            .client
            .request(Method::GET, &self.url("/download"), &params.into_inner())
            .await?;
        if !response.is_success() {
            return Err(DiskError::ApiError {
                status: response.status,
            });
        }
        response
            .href()
            .map(str::to_string)
            .ok_or_else(|| DiskError::NotFound("download href".to_string()))
    }

    /// Download the configured resource into a local file.
    ///
    /// Resolves the direct link first, then streams the body to
    /// `destination`. Returns the number of bytes written.
    pub async fn download_to<P: AsRef<Path>>(self, destination: P) -> Result<u64> {
        let client = self.client;
        let href = self.download_link().await?;

        debug!(href, "downloading resource body");
        let response = client.http().get(&href).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiskError::ApiError {
                status: status.as_u16(),
            });
        }

        let mut file = File::create(destination.as_ref()).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Publish the configured resource. Raw pass-through.
    pub async fn publish(self) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        self.client
            .request(Method::PUT, &self.url("/publish"), &params.into_inner())
            .await
    }

    /// Publish the configured resource and return its public URL.
    ///
    /// The publish endpoint only replies with a metadata link, so the
    /// resource is re-fetched to read `public_url`.
    pub async fn share(self) -> Result<String> {
        let refetch = self.clone();
        let response = self.publish().await?;
        if !response.is_success() {
            return Err(DiskError::ApiError {
                status: response.status,
            });
        }
        let meta = refetch.get().await?;
        if !meta.is_success() {
            return Err(DiskError::ApiError {
                status: meta.status,
            });
        }
        meta.str_field("public_url")
            .map(str::to_string)
            .ok_or_else(|| DiskError::NotFound("public_url".to_string()))
    }

    /// Close public access to the configured resource. Raw pass-through.
    pub async fn unpublish(self) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        self.client
            .request(Method::PUT, &self.url("/unpublish"), &params.into_inner())
            .await
    }

    /// Close public access and return the link to the resource's metadata.
    pub async fn unshare(self) -> Result<String> {
        let response = self.unpublish().await?;
        if !response.is_success() {
            return Err(DiskError::ApiError {
                status: response.status,
            });
        }
        response
            .href()
            .map(str::to_string)
            .ok_or_else(|| DiskError::NotFound("unpublish href".to_string()))
    }

    /// Upload a local file to the configured path.
    ///
    /// Two requests: the first obtains a pre-signed upload target, the
    /// second transfers the bytes to it as multipart form data. A refusal
    /// from the first request passes through as its `ApiResponse`.
    pub async fn upload<P: AsRef<Path>>(self, local_path: P) -> Result<ApiResponse> {
        let local_path = local_path.as_ref();
        if !local_path.is_file() {
            return Err(DiskError::NotFound(local_path.display().to_string()));
        }
        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DiskError::NotFound(local_path.display().to_string()))?
            .to_string();
        let mime_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();
        let bytes = tokio::fs::read(local_path).await?;

        let client = self.client;
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        params.push_str("fields", self.fields.as_deref());
        params.push_bool("overwrite", self.overwrite);
        let target = client
            .request(Method::GET, &self.url("/upload"), &params.into_inner())
            .await?;
        if !target.is_success() {
            return Ok(target);
        }
        let href = target
            .href()
            .ok_or_else(|| DiskError::NotFound("upload href".to_string()))?
            .to_string();

        debug!(href, size = bytes.len(), "uploading file body");
        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(&mime_type)?;
        let form = Form::new().part("file", part);

        // The target is pre-signed; no auth header and no retry replay.
        let response = client.http().put(&href).multipart(form).send().await?;
        Ok(DiskClient::normalize(response).await)
    }

    /// Ask the server to fetch a remote URL into the configured path.
    ///
    /// Replies with an operation link; poll it for completion.
    pub async fn upload_from_url(self, source: &str) -> Result<ApiResponse> {
        let mut params = QueryParams::default();
        params.push_str("path", self.path.as_deref());
        params.push_str("url", Some(source));
        params.push_str("fields", self.fields.as_deref());
        self.client
            .request(Method::POST, &self.url("/upload"), &params.into_inner())
            .await
    }

    /// Restore the configured resource from the trash.
    ///
    /// Meaningful in trash mode only. A new name can be supplied via
    /// `param("name", …)`.
    pub async fn restore(self) -> Result<ApiResponse> {
        let mut params = self.base_params();
        params.push_bool("force_async", self.force_async);
        params.push_bool("overwrite", self.overwrite);
        self.client
            .request(Method::PUT, &self.url("/restore"), &params.into_inner())
            .await
    }
}
