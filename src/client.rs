use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::retry::RetryConfig;
use crate::types::{
    Album, ApiErrorEnvelope, BatchCreateRequest, BatchCreateResponse, CreateAlbumRequest,
    ListAlbumsResponse, NewAlbum,
};

pub const DEFAULT_BASE_URL: &str = "https://photoslibrary.googleapis.com";
pub const API_VERSION: &str = "v1";

/// OAuth2 credential bundle the client was constructed with.
///
/// The client never refreshes or exchanges tokens itself; the caller hands
/// it an already-authenticated `reqwest::Client` and, optionally, this for
/// inspection. `Debug` redacts the secrets.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "AccessToken::default_token_type")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn default_token_type() -> String {
        "Bearer".to_string()
    }

    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: Self::default_token_type(),
            expiry: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= Utc::now(),
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// What the raw upload endpoint answered, reduced to the parts the
/// classifier needs.
#[derive(Debug, Clone)]
pub struct RawUploadResponse {
    pub status: u16,
    pub retry_after: Option<u64>,
    pub body: String,
}

/// Capability for staging raw bytes at `POST /{v1}/uploads`.
///
/// Connection-level failures surface as `Err`; any HTTP response, including
/// 429 and other non-200 statuses, comes back as `Ok` for the caller to
/// classify.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn send_upload(&self, filename: &str, body: Bytes) -> Result<RawUploadResponse>;
}

/// Capability for the JSON API surface the upload path needs.
#[async_trait]
pub trait PhotosApi: Send + Sync {
    async fn batch_create(&self, request: &BatchCreateRequest) -> Result<BatchCreateResponse>;
    async fn list_albums(&self) -> Result<ListAlbumsResponse>;
    async fn get_album(&self, id: &str) -> Result<Album>;
    async fn create_album(&self, title: &str) -> Result<Album>;
}

/// Integer seconds from a `Retry-After` header; absent or unparseable
/// values mean "no server hint".
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

struct HttpUploadTransport {
    http: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn send_upload(&self, filename: &str, body: Bytes) -> Result<RawUploadResponse> {
        let url = format!("{}/{}/uploads", self.base_url, API_VERSION);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("X-Goog-Upload-File-Name", filename)
            .header("X-Goog-Upload-Protocol", "raw")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;

        Ok(RawUploadResponse {
            status,
            retry_after,
            body,
        })
    }
}

struct HttpPhotosApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPhotosApi {
    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    /// Maps a service response to a typed value, turning 429 into
    /// `Error::RateLimited` and any other failure status into `Error::Api`
    /// with the service's error message when it sent one.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        if status.as_u16() == 429 {
            let retry_after = parse_retry_after(response.headers());
            return Err(Error::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) => {
                log::debug!(
                    "Photos API error {} ({}, code {})",
                    envelope.error.message,
                    envelope.error.status,
                    envelope.error.code
                );
                envelope.error.message
            }
            Err(_) => body,
        };
        Err(Error::api(status.as_u16(), message))
    }
}

#[async_trait]
impl PhotosApi for HttpPhotosApi {
    async fn batch_create(&self, request: &BatchCreateRequest) -> Result<BatchCreateResponse> {
        let response = self
            .http
            .post(self.url("mediaItems:batchCreate"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_albums(&self) -> Result<ListAlbumsResponse> {
        let response = self.http.get(self.url("albums")).send().await?;
        Self::decode(response).await
    }

    async fn get_album(&self, id: &str) -> Result<Album> {
        let response = self
            .http
            .get(self.url(&format!("albums/{}", id)))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create_album(&self, title: &str) -> Result<Album> {
        let request = CreateAlbumRequest {
            album: NewAlbum {
                title: title.to_string(),
            },
        };
        let response = self
            .http
            .post(self.url("albums"))
            .json(&request)
            .send()
            .await?;
        Self::decode(response).await
    }
}

/// Google Photos client.
///
/// Explicitly composes its two collaborators: the raw upload transport and
/// the JSON service API. Cloning is cheap and the client is safe to share
/// across tasks; concurrent uploads of different files only share the
/// underlying connection pool.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn UploadTransport>,
    api: Arc<dyn PhotosApi>,
    token: Option<AccessToken>,
    retry: RetryConfig,
}

impl Client {
    /// Builds a client from a `reqwest::Client` that already attaches OAuth
    /// credentials to every request.
    pub fn new(http: reqwest::Client) -> Self {
        Self::builder(http).build()
    }

    pub fn with_token(http: reqwest::Client, token: AccessToken) -> Self {
        Self::builder(http).token(token).build()
    }

    pub fn builder(http: reqwest::Client) -> ClientBuilder {
        ClientBuilder {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            retry: RetryConfig::default(),
        }
    }

    /// Assembles a client from explicit capabilities. Mainly a seam for
    /// tests and alternative transports.
    pub fn with_parts(
        transport: Arc<dyn UploadTransport>,
        api: Arc<dyn PhotosApi>,
        token: Option<AccessToken>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            api,
            token,
            retry,
        }
    }

    /// Read access to the credential the client was constructed with.
    /// There is no setter.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub(crate) fn transport(&self) -> &dyn UploadTransport {
        self.transport.as_ref()
    }

    pub(crate) fn api(&self) -> &dyn PhotosApi {
        self.api.as_ref()
    }
}

pub struct ClientBuilder {
    http: reqwest::Client,
    base_url: String,
    token: Option<AccessToken>,
    retry: RetryConfig,
}

impl ClientBuilder {
    /// Overrides the service base URL, e.g. for a staging endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Client {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        Client {
            transport: Arc::new(HttpUploadTransport {
                http: self.http.clone(),
                base_url: base_url.clone(),
            }),
            api: Arc::new(HttpPhotosApi {
                http: self.http,
                base_url,
            }),
            token: self.token,
            retry: self.retry,
        }
    }
}
