//! Client for the Google Photos Library API upload path.
//!
//! The photoslibrary JSON surface has no `/v1/uploads` call, so uploading a
//! file is a two-phase protocol: stage the raw bytes for an upload token,
//! then commit the token into a media item with `mediaItems:batchCreate`.
//! Both phases run under a shared retry engine that understands rate-limit
//! responses (429 + `Retry-After`) and falls back to exponential backoff.
//!
//! Authentication is out of scope: construct a [`Client`] from a
//! `reqwest::Client` that already attaches OAuth credentials.
//!
//! ```no_run
//! use gphotos::Client;
//!
//! # async fn run(http: reqwest::Client) -> gphotos::Result<()> {
//! let client = Client::new(http);
//! let album = client.get_or_create_album("Trip").await?;
//! let item = client.upload_file("photos/beach.jpg", Some(&album.id)).await?;
//! println!("uploaded as {}", item.id);
//! # Ok(())
//! # }
//! ```

mod albums;
pub mod client;
pub mod errors;
pub mod retry;
pub mod types;
pub mod uploader;

pub use client::{AccessToken, Client, ClientBuilder, PhotosApi, RawUploadResponse, UploadTransport};
pub use errors::{Error, Result};
pub use retry::{retry, RetryConfig, RetryOutcome};
pub use types::{Album, MediaItem, UploadToken};
pub use uploader::upload_token::acquire_upload_token;
