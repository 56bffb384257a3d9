#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Service { status: u16, message: String },
    #[error("failed to decode search response: {0}")]
    Decode(serde_json::Error),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
