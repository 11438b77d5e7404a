use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Failure talking to one downstream system (or the roster source).
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("{system}: request failed: {detail}")]
    Transport { system: String, detail: String },
    #[error("{system}: no response within {timeout:?}")]
    Timeout { system: String, timeout: Duration },
    #[error("{system}: server error {status}")]
    ServerStatus { system: String, status: u16 },
    #[error("{system}: unexpected response status {status}")]
    UnexpectedStatus { system: String, status: u16 },
    #[error("{system}: response body is not valid JSON: {detail}")]
    Decode { system: String, detail: String },
    #[error("{system}: invalid API response: missing '{key}' key")]
    MissingKey { system: String, key: String },
    #[error("{system}: '{key}' is not a valid {expected}")]
    MalformedKey {
        system: String,
        key: String,
        expected: &'static str,
    },
    #[error("{system}: invalid header '{header}'")]
    InvalidHeader { system: String, header: String },
}

/// JSON-over-HTTP client shared by the roster provider and every system adapter.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| UpstreamError::Transport {
                system: "http-client".to_string(),
                detail: err.to_string(),
            })?;

        Ok(Self { client, timeout })
    }

    /// POST `body` as JSON and return the decoded JSON response.
    ///
    /// Only 2xx responses yield a body; 5xx and every other status are errors.
    pub async fn post_json<B>(
        &self,
        system: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &B,
    ) -> Result<Value, UpstreamError>
    where
        B: Serialize + ?Sized,
    {
        let header_map = build_headers(system, headers)?;
        debug!(system, url, "posting upstream request");

        let response = self
            .client
            .post(url)
            .headers(header_map)
            .json(body)
            .send()
            .await
            .map_err(|err| self.map_transport(system, err))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(UpstreamError::ServerStatus {
                system: system.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            warn!(system, %status, "upstream returned non-success status");
            return Err(UpstreamError::UnexpectedStatus {
                system: system.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| UpstreamError::Decode {
                system: system.to_string(),
                detail: err.to_string(),
            })
    }

    fn map_transport(&self, system: &str, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                system: system.to_string(),
                timeout: self.timeout,
            }
        } else {
            UpstreamError::Transport {
                system: system.to_string(),
                detail: err.to_string(),
            }
        }
    }
}

/// Text form of a JSON scalar; upstreams send ids as strings or numbers interchangeably.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn build_headers(
    system: &str,
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, UpstreamError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || UpstreamError::InvalidHeader {
            system: system.to_string(),
            header: name.clone(),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(name, value);
    }
    Ok(map)
}
