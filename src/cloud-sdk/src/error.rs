/// Errors from the control-plane, cluster and telemetry clients
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// API returned a non-2xx response
    #[error("{method} {url} failed ({status}): {message}")]
    Api {
        /// HTTP method of the failed request
        method: String,
        /// Target of the failed request
        url: String,
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    /// A response did not contain a field the caller depends on
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// A request could not be built from the given parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SdkError {
    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            SdkError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
