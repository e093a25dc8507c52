use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum KgError {
    /// A required setting (usually the API key) was not available when the gateway was built
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model provider call failed: transport, auth, rate limit, timeout or an error payload
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The model answered with something that is not the expected JSON shape
    #[error("Malformed model output: {message}\nRaw output: {raw}")]
    MalformedOutput { message: String, raw: String },

    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt rendering failed: {0}")]
    Prompt(#[from] tera::Error),
}

impl KgError {
    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        KgError::MalformedOutput {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

impl From<reqwest::Error> for KgError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            KgError::Upstream(format!("Request timed out: {}", err))
        } else {
            KgError::Upstream(err.to_string())
        }
    }
}

pub type KgResult<T> = Result<T, KgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_raw_text() {
        let err = KgError::malformed("expected a JSON array", "not json");
        match &err {
            KgError::MalformedOutput { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("Raw output: not json"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: KgError = io.into();
        assert!(matches!(err, KgError::Io(_)));
    }
}
