//! HTTP client for the Yandex.Disk REST API.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Proxy, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DiskError, Result};
use crate::models::{DiskInfo, Operation, OperationStatus};
use crate::request::ResourceRequest;

/// Base URL for the Yandex.Disk REST API.
const DISK_API_BASE: &str = "https://cloud-api.yandex.net/v1/disk";

/// Resource group for regular disk resources.
const RESOURCES: &str = "/resources";

/// Resource group for trashed resources.
const TRASH_RESOURCES: &str = "/trash/resources";

/// Resource group for server-side asynchronous operations.
const OPERATIONS: &str = "/operations";

/// Default transport retry budget.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Initial delay between transport retries; doubles per attempt.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Normalized outcome of a single API exchange.
///
/// Every HTTP response becomes one of these, whatever its status; only
/// transport-level failures surface as [`DiskError`]. A 2xx body that is
/// not valid JSON degrades to `body: None`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the payload into a typed model, if present and matching.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        self.body
            .as_ref()
            .and_then(|body| serde_json::from_value(body.clone()).ok())
    }

    /// Extract a top-level string attribute from the payload.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }

    /// The `href` attribute of a link payload.
    pub fn href(&self) -> Option<&str> {
        self.str_field("href")
    }
}

/// Client for the Yandex.Disk REST API.
///
/// The client itself is immutable; every call starts a fresh
/// [`ResourceRequest`] chain, so one instance can be shared across tasks.
#[derive(Clone)]
pub struct DiskClient {
    http: Client,
    token: String,
    base_url: String,
    max_retries: u32,
}

/// Builder for [`DiskClient`] with transport-level options.
pub struct DiskClientBuilder {
    token: String,
    base_url: String,
    proxy: Option<String>,
    accept_invalid_certs: bool,
    max_retries: u32,
}

impl DiskClientBuilder {
    /// Replace the production endpoint, e.g. with a mock server's URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Route both HTTP and HTTPS traffic through a proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Disable TLS certificate verification.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Transport retry budget for connection-level failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn build(self) -> Result<DiskClient> {
        let mut http = Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(url) = &self.proxy {
            let proxy = Proxy::all(url)
                .map_err(|e| DiskError::ConfigError(format!("invalid proxy url: {e}")))?;
            http = http.proxy(proxy);
        }
        Ok(DiskClient {
            http: http.build()?,
            token: self.token,
            base_url: self.base_url,
            max_retries: self.max_retries,
        })
    }
}

impl DiskClient {
    /// Create a client with default transport settings.
    ///
    /// # Arguments
    /// * `token` - A pre-obtained OAuth token for the disk
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: DISK_API_BASE.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Start configuring a client with non-default transport settings.
    pub fn builder(token: impl Into<String>) -> DiskClientBuilder {
        DiskClientBuilder {
            token: token.into(),
            base_url: DISK_API_BASE.to_string(),
            proxy: None,
            accept_invalid_certs: false,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Begin a request against the resource at `path`.
    pub fn resource(&self, path: impl Into<String>) -> ResourceRequest<'_> {
        ResourceRequest::new(self, false, Some(path.into()))
    }

    /// Begin a request against the resource collection, with no path set.
    ///
    /// Used by the disk-wide listings (`files`, `last_uploaded`).
    pub fn resources(&self) -> ResourceRequest<'_> {
        ResourceRequest::new(self, false, None)
    }

    /// Begin a request against the trashed resource at `path`.
    pub fn trash(&self, path: impl Into<String>) -> ResourceRequest<'_> {
        ResourceRequest::new(self, true, Some(path.into()))
    }

    /// Fetch capacity and usage information for the whole disk.
    pub async fn disk_info(&self) -> Result<DiskInfo> {
        let url = self.base_url.clone();
        let response = self.request(Method::GET, &url, &[]).await?;
        if !response.is_success() {
            return Err(DiskError::ApiError {
                status: response.status,
            });
        }
        response
            .decode::<DiskInfo>()
            .ok_or_else(|| DiskError::NotFound("disk info payload".to_string()))
    }

    /// Fetch the raw payload of a server-side asynchronous operation.
    pub async fn operation(&self, id: &str) -> Result<ApiResponse> {
        let url = format!("{}{}/{}", self.base_url, OPERATIONS, id);
        self.request(Method::GET, &url, &[]).await
    }

    /// Fetch and decode the status of a server-side asynchronous operation.
    pub async fn operation_status(&self, id: &str) -> Result<OperationStatus> {
        let response = self.operation(id).await?;
        if !response.is_success() {
            return Err(DiskError::ApiError {
                status: response.status,
            });
        }
        response
            .decode::<Operation>()
            .map(|op| op.status)
            .ok_or_else(|| DiskError::NotFound(format!("operation {id}")))
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Full URL of a resource-group endpoint, normal or trash scoped.
    pub(crate) fn resources_url(&self, trash: bool, suffix: &str) -> String {
        let group = if trash { TRASH_RESOURCES } else { RESOURCES };
        format!("{}{}{}", self.base_url, group, suffix)
    }

    /// Issue one API call and normalize the outcome.
    ///
    /// Connection-level failures are retried up to the configured budget
    /// with exponential backoff; HTTP statuses are never retried.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse> {
        let mut attempt: u32 = 0;
        loop {
            debug!(method = %method, url, attempt, "issuing disk api request");
            let call = self
                .http
                .request(method.clone(), url)
                .header(AUTHORIZATION, format!("OAuth {}", self.token))
                .header(ACCEPT, "application/json")
                .query(query);

            match call.send().await {
                Ok(response) => return Ok(Self::normalize(response).await),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    let delay = RETRY_DELAY * 2u32.saturating_pow(attempt - 1);
                    warn!(error = %err, attempt, "transport failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Collapse an HTTP response into the `(status, payload)` shape.
    pub(crate) async fn normalize(response: Response) -> ApiResponse {
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            let body = response.json::<Value>().await.ok();
            ApiResponse { status, body }
        } else {
            ApiResponse { status, body: None }
        }
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
