use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::RemoteOperationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Patch,
    Put,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RestRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url = format!(
            "{}{}{}={}",
            self.url,
            separator,
            urlencoding::encode(key),
            urlencoding::encode(value)
        );
        self
    }

    /// A PostgREST `column=eq.value` filter.
    pub fn eq(self, column: &str, value: &str) -> Self {
        self.query(column, &format!("eq.{value}"))
    }

    pub fn json(self, body: &serde_json::Value) -> Self {
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(body.to_string());
        request
    }

    /// The token sent in the `Authorization` header, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.header_value("Authorization")?.strip_prefix("Bearer ")
    }

    /// Replaces the `Authorization` header.
    pub fn authorize(mut self, token: &str) -> Self {
        self.headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case("Authorization"));
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        RestResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteOperationError> {
        serde_json::from_str(&self.body)
            .map_err(|e| RemoteOperationError::decode(format!("unexpected response body: {e}")))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("request failed: {0}")]
pub struct TransportError(pub String);

impl From<TransportError> for RemoteOperationError {
    fn from(error: TransportError) -> Self {
        RemoteOperationError::network(error.0)
    }
}

/// Sends one HTTP request; the browser implementation is `fetch`.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, TransportError>;
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

/// Turns a non-2xx response into the provider's code and message. Both the
/// table API (`code`/`message`) and the auth API (`error`/`error_description`,
/// `error_code`/`msg`) shapes are understood.
pub fn decode_error(response: &RestResponse) -> RemoteOperationError {
    let body: ErrorBody = serde_json::from_str(&response.body).unwrap_or_default();

    let code = body
        .error_code
        .or_else(|| {
            body.code.and_then(|code| match code {
                serde_json::Value::String(code) => Some(code),
                serde_json::Value::Number(code) => Some(code.to_string()),
                _ => None,
            })
        })
        .or(body.error.clone())
        .unwrap_or_else(|| response.status.to_string());

    let message = body
        .message
        .or(body.msg)
        .or(body.error_description)
        .or(body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("request failed with status {}", response.status));

    RemoteOperationError::new(code, message)
}

/// The total from a `Content-Range` header such as `0-9/42` or `*/0`.
pub fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}
