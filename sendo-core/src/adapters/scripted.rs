//! Scripted doubles for offline use and testing
//!
//! `ScriptedGateway` answers API calls from canned responses and records
//! every request it receives; `ScriptedConfirmer` answers confirmation
//! prompts with a fixed choice.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};
use crate::domain::Pin;
use crate::ports::{
    ApiGateway, ApiRequest, ConfirmationPrompt, Confirmer, FormPart, Method, RequestBody,
};

/// One canned answer
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(JsonValue),
    Fail { status: u16, message: String },
    Network(String),
    /// Never answers; for exercising cancellation
    Hang,
}

impl Scripted {
    /// `{ status, message, data }` envelope around `data`
    pub fn data(data: JsonValue) -> Self {
        Self::Ok(serde_json::json!({ "status": 200, "message": "ok", "data": data }))
    }

    pub fn fail(status: u16, message: impl Into<String>) -> Self {
        Self::Fail {
            status,
            message: message.into(),
        }
    }
}

/// A request as the gateway received it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub json: Option<JsonValue>,
    /// Names of multipart fields, in order
    pub form_fields: Vec<String>,
    pub bearer: Option<String>,
    pub passcode: Option<Pin>,
}

impl RecordedCall {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-process [`ApiGateway`] answering from a script
///
/// Responses queue per `(method, path)`; the last one for a route keeps
/// answering once the queue is down to it. Unscripted routes get a 404.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`
    pub fn on(&self, method: Method, path: impl Into<String>, response: Scripted) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes
                .entry((method, path.into()))
                .or_default()
                .push_back(response);
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn next_response(&self, method: Method, path: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().ok()?;
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn execute(&self, request: ApiRequest) -> Result<JsonValue> {
        let (json, form_fields) = match &request.body {
            RequestBody::Empty => (None, Vec::new()),
            RequestBody::Json(body) => (Some(body.clone()), Vec::new()),
            RequestBody::Multipart(parts) => (
                None,
                parts
                    .iter()
                    .map(|p| match p {
                        FormPart::Text { name, .. } | FormPart::File { name, .. } => name.clone(),
                    })
                    .collect(),
            ),
        };

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method: request.method,
                path: request.path.clone(),
                query: request.query.clone(),
                json,
                form_fields,
                bearer: request.bearer.clone(),
                passcode: request.passcode.clone(),
            });
        }

        match self.next_response(request.method, &request.path) {
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Fail { status, message }) => Err(Error::api(status, message)),
            Some(Scripted::Network(message)) => Err(Error::Network(message)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(Error::api(
                404,
                format!("No scripted response for {}", request.describe()),
            )),
        }
    }
}

/// [`Confirmer`] with a fixed answer that remembers what it was asked
#[derive(Debug)]
pub struct ScriptedConfirmer {
    answer: bool,
    prompts: Mutex<Vec<ConfirmationPrompt>>,
}

impl ScriptedConfirmer {
    pub fn accepting() -> Self {
        Self {
            answer: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ConfirmationPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &ConfirmationPrompt) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_response_is_sticky() {
        let gateway = ScriptedGateway::new();
        gateway
            .on(Method::Get, "/users/me", Scripted::fail(500, "boom"))
            .on(Method::Get, "/users/me", Scripted::data(serde_json::json!({ "id": 1 })));

        assert!(gateway.execute(ApiRequest::get("/users/me")).await.is_err());
        assert!(gateway.execute(ApiRequest::get("/users/me")).await.is_ok());
        assert!(gateway.execute(ApiRequest::get("/users/me")).await.is_ok());
        assert_eq!(gateway.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_not_found() {
        let gateway = ScriptedGateway::new();
        let err = gateway.execute(ApiRequest::get("/nowhere")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
