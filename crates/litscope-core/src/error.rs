use thiserror::Error;

/// All errors that can occur in litscope-core.
#[derive(Debug, Error)]
pub enum LitscopeError {
    #[error("{file}: record {index}: missing required field '{field}'")]
    MissingField {
        file: String,
        index: usize,
        field: String,
    },

    #[error("{file}: record {index}: invalid value for '{field}': {value:?}")]
    InvalidField {
        file: String,
        index: usize,
        field: String,
        value: String,
    },

    #[error("Unknown source prefix: {0}")]
    UnknownSource(String),

    #[error("Directory does not exist: {0}")]
    DirectoryNotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LitscopeError {
    /// True for errors scoped to a single input record rather than a whole file.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::MissingField { .. } | Self::InvalidField { .. })
    }
}

/// Exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, LitscopeError>;
