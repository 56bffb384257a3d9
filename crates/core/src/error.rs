#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("server configuration error: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),

    #[error("places upstream responded {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("places request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode places response: {0}")]
    Decode(serde_json::Error),

    #[error("failed to read catalog file: {0}")]
    CatalogRead(std::io::Error),
    #[error("catalog schema mismatch at {path}: {message}")]
    CatalogYaml { path: String, message: String },

    #[error("booking store unavailable: {0}")]
    Storage(String),

    #[error(transparent)]
    Types(#[from] lablink_types::TypesError),
}

pub type LabResult<T> = std::result::Result<T, LabError>;
