use std::cell::RefCell;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde_json::Value;
use tracing::warn;

use super::request::HeaderVec;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderVec,
    body: String,
    committed: bool,
}

/// Mutable response writer for a single request.
///
/// The writer is shared by reference between the interceptors and the
/// handler of one dispatch, so writes go through interior mutability. It is
/// deliberately not `Sync`: a response never leaves its request's thread.
#[derive(Debug)]
pub struct Response {
    state: RefCell<ResponseState>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// A fresh `200 OK` response with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderVec::new(),
                body: String::new(),
                committed: false,
            }),
        }
    }

    /// Plain-text response with the given status and body.
    #[must_use]
    pub fn text(status: StatusCode, body: &str) -> Self {
        let res = Self::new();
        res.set_status(status);
        res.set_header("content-type", "text/plain; charset=utf-8");
        res.write(body);
        res
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "404 not found")
    }

    /// Generic failure response. Never carries internal failure details.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error")
    }

    pub fn set_status(&self, status: StatusCode) {
        self.state.borrow_mut().status = status;
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.state.borrow().status
    }

    /// Add or replace a header (case-insensitive name).
    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        let mut state = self.state.borrow_mut();
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        state.headers.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.state
            .borrow()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Append to the body and mark the response as committed.
    pub fn write(&self, chunk: &str) {
        let mut state = self.state.borrow_mut();
        state.body.push_str(chunk);
        state.committed = true;
    }

    /// Write a handler return value: strings as `text/plain`, everything
    /// else as JSON. `Null` writes nothing.
    pub fn write_value(&self, value: &Value) {
        match value {
            Value::Null => {}
            Value::String(s) => {
                self.set_header("content-type", "text/plain; charset=utf-8");
                self.write(s);
            }
            other => {
                self.set_header("content-type", "application/json");
                self.write(&other.to_string());
            }
        }
    }

    #[must_use]
    pub fn body(&self) -> String {
        self.state.borrow().body.clone()
    }

    /// Whether anything has been written to the body.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state.borrow().committed
    }

    /// Hand the response back to the transport layer.
    #[must_use]
    pub fn into_http(self) -> http::Response<String> {
        let state = self.state.into_inner();
        let mut res = http::Response::new(state.body);
        *res.status_mut() = state.status;
        for (name, value) in state.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().insert(name, value);
                }
                _ => warn!(header = %name, "Dropping invalid response header"),
            }
        }
        if !res.headers().contains_key(CONTENT_TYPE) && !res.body().is_empty() {
            res.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        res
    }
}
