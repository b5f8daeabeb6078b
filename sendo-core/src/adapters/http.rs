//! Sendo REST gateway over reqwest
//!
//! Adds `Authorization: Bearer` and `X-Passcode` headers as requested,
//! decodes JSON bodies and turns every non-2xx status into a typed
//! [`Error::Api`]. There is no retry and no backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::{ApiGateway, ApiRequest, FormPart, Method, RequestBody};

/// Header carrying the 4-digit passcode on money-movement calls
pub const PASSCODE_HEADER: &str = "X-Passcode";

/// reqwest-backed [`ApiGateway`]
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpGateway {
    /// `timeout` of `None` waits forever
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid API URL '{}'", base_url)));
        }

        let mut builder = Client::builder().user_agent(concat!("sendo/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a request path onto the base URL, encoding each segment
    fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("Invalid API URL '{}'", self.base_url)))?;
            segments.pop_if_empty();
            segments.extend(request.path.split('/').filter(|s| !s.is_empty()));
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    fn build_form(parts: Vec<FormPart>) -> Result<Form> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File { name, file } => {
                    let body = Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(file.content_type)
                        .map_err(|e| Error::validation(format!("Invalid content type: {}", e)))?;
                    form.part(name, body)
                }
            };
        }
        Ok(form)
    }

    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            match self.timeout {
                Some(t) => Error::Network(format!("Request timed out after {} seconds", t.as_secs())),
                None => Error::Network("Request timed out".to_string()),
            }
        } else if error.is_connect() {
            Error::Network("Unable to connect to the Sendo servers".to_string())
        } else {
            Error::Network(format!("Request failed: {}", error.without_url()))
        }
    }
}

/// Pull a readable message out of an error body
///
/// The API answers `{ "message": "..." }`, or an array of messages for
/// validation failures.
pub fn error_message(body: &str) -> String {
    let parsed: Option<JsonValue> = serde_json::from_str(body).ok();
    match parsed.as_ref().and_then(|v| v.get("message")) {
        Some(JsonValue::String(message)) => message.clone(),
        Some(JsonValue::Array(messages)) => messages
            .iter()
            .filter_map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => match parsed.as_ref().and_then(|v| v.get("error")).and_then(|e| e.as_str()) {
            Some(error) => error.to_string(),
            None => body.trim().chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue> {
        let url = self.url_for(&request)?;
        let description = request.describe();

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(pin) = &request.passcode {
            builder = builder.header(PASSCODE_HEADER, pin.expose());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        tracing::debug!(request = %description, "sending API request");

        let response = builder.send().await.map_err(|e| self.map_request_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_request_error(e))?;

        if !status.is_success() {
            let message = error_message(&body);
            tracing::debug!(request = %description, status = status.as_u16(), "API request failed");
            return Err(Error::api(status.as_u16(), message));
        }

        if body.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
