use std::io::SeekFrom;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use crate::client::{Client, UploadTransport};
use crate::errors::{Error, Result};
use crate::retry::{retry, RetryConfig, RetryOutcome};
use crate::types::UploadToken;

/// Stages raw bytes against the upload endpoint and returns the token that
/// finalizes them.
///
/// The reader is rewound to offset 0 before its contents are captured, so a
/// handle that has already been read from still uploads the whole file. The
/// full body is resent on every retry. Classification per attempt:
/// connection failures stop immediately, 429 retries after the server's
/// `Retry-After` (or the backoff schedule when the header is missing), and
/// any other non-200 status stops with a protocol error.
pub async fn acquire_upload_token<R>(
    transport: &dyn UploadTransport,
    config: &RetryConfig,
    reader: &mut R,
    filename: &str,
) -> Result<UploadToken>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    reader.seek(SeekFrom::Start(0)).await?;
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).await?;
    let body = Bytes::from(contents);

    retry(config, || {
        let body = body.clone();
        async move {
            let response = match transport.send_upload(filename, body).await {
                Ok(response) => response,
                // connection-level failure, nothing to wait for
                Err(err) => return RetryOutcome::Stop(err),
            };

            match response.status {
                200 => RetryOutcome::Success(UploadToken::new(response.body)),
                429 => {
                    let after = response.retry_after;
                    log::warn!("429 throttle waiting {} sec", after.unwrap_or(0));
                    RetryOutcome::Retry {
                        after: after.map(Duration::from_secs),
                        cause: Error::RateLimited { retry_after: after },
                    }
                }
                status => RetryOutcome::Stop(Error::protocol(format!(
                    "upload endpoint returned status {}",
                    status
                ))),
            }
        }
    })
    .await
}

impl Client {
    /// Uploads raw bytes from `reader` and returns the upload token, using
    /// the client's transport and retry budget.
    pub async fn acquire_upload_token<R>(&self, reader: &mut R, filename: &str) -> Result<UploadToken>
    where
        R: AsyncRead + AsyncSeek + Unpin,
    {
        acquire_upload_token(self.transport(), self.retry_config(), reader, filename).await
    }
}
