use thiserror::Error;

/// Failures raised by the platform client itself (credentials, HTTP,
/// response decoding). Analysis code wraps these in `anyhow` context.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no usable credentials: {0}")]
    MissingCredentials(String),

    #[error("credential store is not valid JSON: {0}")]
    CredentialFormat(#[from] serde_json::Error),

    #[error("credential store I/O: {0}")]
    CredentialStore(#[from] std::io::Error),

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("platform request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("platform returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed platform response: {0}")]
    MalformedResponse(String),
}
