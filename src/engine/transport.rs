use std::time::Duration;

use serde_json::{json, Value};
use url::Url;

use crate::engine::auth::Credentials;
use crate::error::EngineError;

/// Default base URL of the platform's REST surface.
pub const DEFAULT_ENDPOINT: &str = "https://earthengine.googleapis.com/v1/";

/// Environment override for the endpoint (used against staging mirrors).
pub const ENDPOINT_ENV_VAR: &str = "RSBASIN_ENDPOINT";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Seam between the lazy query layer and the wire. The production
/// implementation is HTTP; tests substitute canned responses.
pub trait Transport {
    /// Evaluate one serialized expression graph on the platform and return
    /// the decoded result value. Blocking.
    fn compute(&self, project: &str, expression: &Value) -> Result<Value, EngineError>;
}

/// Blocking HTTP transport with bearer authentication.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: Url,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, credentials: &Credentials) -> Result<Self, EngineError> {
        let endpoint = Url::parse(endpoint)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(HttpTransport {
            client,
            endpoint,
            token: credentials.access_token.clone(),
        })
    }

    fn compute_url(&self, project: &str) -> Result<Url, EngineError> {
        Ok(self
            .endpoint
            .join(&format!("projects/{}/value:compute", project))?)
    }
}

impl Transport for HttpTransport {
    fn compute(&self, project: &str, expression: &Value) -> Result<Value, EngineError> {
        let url = self.compute_url(project)?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&json!({ "expression": expression }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EngineError::Status { status, body });
        }

        let payload: Value = response.json()?;
        payload.get("result").cloned().ok_or_else(|| {
            EngineError::MalformedResponse("missing `result` field in compute response".to_string())
        })
    }
}
