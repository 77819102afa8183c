//! In-memory transport that replays a queue of canned responses.
//!
//! Every request is recorded, so callers can assert the exact sequence of
//! remote calls a workflow issued. When the queue runs dry the transport
//! answers with a [`TransportError`] rather than panicking, which surfaces as
//! an ordinary workflow failure.

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{Method, Request, Response, Transport};
use crate::error::TransportError;

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<Response, TransportError>>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a raw body.
    pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(Response::new(status, body)));
        self
    }

    /// Queue a response whose body is the serialized JSON value.
    pub fn respond_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.respond(status, body.to_string())
    }

    /// Queue a transport-level failure (no response received).
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.responses.borrow_mut().push_back(Err(TransportError {
            method: "?".to_string(),
            url: "scripted".to_string(),
            message: message.into(),
        }));
        self
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Requests received so far with the given method.
    pub fn requests_with(&self, method: Method) -> Vec<Request> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError {
                    method: request.method.to_string(),
                    url: request.path.clone(),
                    message: "no scripted response left".to_string(),
                })
            })
    }
}
