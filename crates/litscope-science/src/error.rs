use litscope_core::LitscopeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("undefined alias in {map}: {key:?}")]
    UndefinedAlias { map: String, key: String },

    #[error("malformed table: {0}")]
    MalformedTable(String),

    #[error(transparent)]
    Core(#[from] LitscopeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScienceError {
    pub fn undefined_alias(map: &str, key: impl Into<String>) -> Self {
        Self::UndefinedAlias {
            map: map.to_string(),
            key: key.into(),
        }
    }

    /// Errors caused by one bad input record, which lenient runs skip.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_record_level())
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
