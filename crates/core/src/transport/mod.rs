//! Transport abstraction between the schema engine and the Directus API.
//!
//! Two implementations:
//! - [`HttpTransport`] -- blocking HTTP via `ureq`, used by the CLI
//! - [`ScriptedTransport`] -- replays queued responses and records requests
//!
//! A transport never interprets status codes. Each accessor operation decides
//! which statuses count as success, so an HTTP 404 comes back as an ordinary
//! [`Response`] and only a missing response is a [`TransportError`].

pub mod http;
pub mod scripted;

use std::fmt;

use crate::error::TransportError;
use crate::query::Query;

pub use http::HttpTransport;
pub use scripted::ScriptedTransport;

// ──────────────────────────────────────────────
// Request / Response
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request against the project root, e.g. `GET /fields/posts/title`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to `{base_url}/{project}`, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl Request {
    fn new(method: Method, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Request {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, None)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, path, Some(body))
    }

    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Patch, path, Some(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query.into_pairs();
        self
    }

    /// Look up the first query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Short description used in logs and error messages: `"GET /fields/posts/title"`.
    pub fn context(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Status code and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Response {
            status,
            body: body.into(),
        }
    }

    /// Parse the body as JSON. An empty body (e.g. a 204) parses as `null`.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

// ──────────────────────────────────────────────
// Transport trait
// ──────────────────────────────────────────────

/// Sends one request and returns whatever the server answered.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        (**self).send(request)
    }
}
