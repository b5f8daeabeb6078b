//! Remote API gateway port
//!
//! A stateless request/response wrapper around the Sendo REST API. The
//! gateway knows nothing about sessions: callers attach the bearer token
//! and, for money movement, the passcode on each request.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::{KycFile, Pin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// One field of a multipart form
#[derive(Debug, Clone)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: KycFile },
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
    Multipart(Vec<FormPart>),
}

/// A single API call, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub bearer: Option<String>,
    pub passcode: Option<Pin>,
    /// Shown instead of the path in logs when the path carries a secret
    pub description: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            passcode: None,
            description: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn queries(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(params);
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn passcode(mut self, pin: &Pin) -> Self {
        self.passcode = Some(pin.clone());
        self
    }

    pub fn described_as(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// "GET /wallet/SND-1", for logs and error context
    pub fn describe(&self) -> String {
        match &self.description {
            Some(description) => description.clone(),
            None => format!("{} {}", self.method.as_str(), self.path),
        }
    }
}

/// Transport abstraction over the Sendo REST API
///
/// Implementations return the decoded JSON body of a 2xx response (or
/// `Null` for an empty body) and map every other status to
/// [`Error::Api`](crate::domain::result::Error::Api) without retrying.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue>;
}
