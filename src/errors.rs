use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limit exceeded. Retry after {} sec", .retry_after.unwrap_or(0))]
    RateLimited { retry_after: Option<u64> },

    #[error("Photos API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    Protocol { message: String },

    #[error("Album title can't be empty")]
    InvalidAlbumTitle,

    #[error("Invalid retry configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed getting upload token for {filename}")]
    TokenAcquisition {
        filename: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed adding media {filename}")]
    MediaCreation {
        filename: String,
        #[source]
        source: Box<Error>,
    },
}

/// Custom result type
pub type Result<T> = std::result::Result<T, Error>;

/// Error helpers
impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn token_acquisition(filename: &str, source: Error) -> Self {
        Self::TokenAcquisition {
            filename: filename.to_string(),
            source: Box::new(source),
        }
    }

    pub fn media_creation(filename: &str, source: Error) -> Self {
        Self::MediaCreation {
            filename: filename.to_string(),
            source: Box::new(source),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited { .. } | Error::Api { .. })
    }

    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Io(_)
                | Error::Protocol { .. }
                | Error::InvalidAlbumTitle
                | Error::InvalidConfig { .. }
        )
    }
}
