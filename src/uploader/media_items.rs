use std::path::Path;
use std::time::Duration;

use tokio::fs::File;

use crate::client::Client;
use crate::errors::{Error, Result};
use crate::retry::{retry, RetryOutcome};
use crate::types::{
    BatchCreateRequest, MediaItem, NewMediaItem, NewMediaItemResult, SimpleMediaItem,
};
use crate::uploader::upload_token::acquire_upload_token;

impl Client {
    /// Uploads the file at `path` and commits it as a media item, optionally
    /// into the album with `album_id`.
    ///
    /// Exactly one upload token is acquired, then exactly one batch-create
    /// call is issued for it. Rate-limited batch-create attempts wait out
    /// the server's `Retry-After`; any other batch-create failure is treated
    /// as transient and retried on the backoff schedule until the attempt
    /// budget runs out. A response that does not contain exactly one `"OK"`
    /// result is a protocol error and is not retried.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        album_id: Option<&str>,
    ) -> Result<MediaItem> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!("Uploading {}", filename);

        let mut file = File::open(path).await?;
        let token = acquire_upload_token(self.transport(), self.retry_config(), &mut file, &filename)
            .await
            .map_err(|err| Error::token_acquisition(&filename, err))?;
        drop(file);

        let request = BatchCreateRequest {
            album_id: album_id.map(str::to_owned),
            new_media_items: vec![NewMediaItem {
                description: filename.clone(),
                simple_media_item: SimpleMediaItem {
                    upload_token: token.into_inner(),
                },
            }],
        };

        let response = retry(self.retry_config(), || {
            let request = &request;
            async move {
                match self.api().batch_create(request).await {
                    Ok(response) => RetryOutcome::Success(response),
                    Err(Error::RateLimited { retry_after }) => {
                        log::warn!(
                            "Rate limit reached, sleeping for {} seconds",
                            retry_after.unwrap_or(0)
                        );
                        RetryOutcome::Retry {
                            after: retry_after.map(Duration::from_secs),
                            cause: Error::RateLimited { retry_after },
                        }
                    }
                    Err(err) => {
                        log::warn!("Unknown error adding media, will retry: {}", err);
                        RetryOutcome::Retry {
                            after: None,
                            cause: err,
                        }
                    }
                }
            }
        })
        .await
        .map_err(|err| Error::media_creation(&filename, err))?;

        let item = validate_single_result(response.new_media_item_results)?;
        log::info!("{} uploaded successfully as {}", filename, item.id);
        Ok(item)
    }
}

/// The upload path always submits exactly one new item, so anything other
/// than one `"OK"` result is a broken response.
fn validate_single_result(mut results: Vec<NewMediaItemResult>) -> Result<MediaItem> {
    if results.len() != 1 {
        return Err(Error::protocol(format!(
            "expected exactly one media item result, got {}",
            results.len()
        )));
    }

    let result = results.remove(0);
    if result.status.message != "OK" {
        return Err(Error::protocol(format!(
            "media item status should be OK, found: {}",
            result.status.message
        )));
    }

    result
        .media_item
        .ok_or_else(|| Error::protocol("OK result is missing its media item"))
}
