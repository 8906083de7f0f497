//! Domain error types.

/// Top-level error type for confluence.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("malformed data for {symbol}: {reason}")]
    DataFormat { symbol: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfluenceError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ConfluenceError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        ConfluenceError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&ConfluenceError> for std::process::ExitCode {
    fn from(err: &ConfluenceError) -> Self {
        let code: u8 = match err {
            ConfluenceError::Io(_) | ConfluenceError::Json(_) | ConfluenceError::Report { .. } => 1,
            ConfluenceError::ConfigParse { .. }
            | ConfluenceError::ConfigMissing { .. }
            | ConfluenceError::ConfigInvalid { .. } => 2,
            ConfluenceError::DataFormat { .. } => 3,
            ConfluenceError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
