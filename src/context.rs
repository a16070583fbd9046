//! Per-request context
//!
//! Owned snapshot of the inbound request handed to middleware, views and
//! layouts. Cloning is cheap and nothing outlives the request.

use crate::hx::{HxSignals, DEFAULT_BODY_TARGET};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::http::request::Parts;
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
struct Inner {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    body_target: String,
}

/// Request context passed down the middleware chain
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Build a context from request parts and an already collected body
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            inner: Arc::new(Inner {
                method: parts.method,
                uri: parts.uri,
                version: parts.version,
                headers: parts.headers,
                body,
                remote_addr: None,
                body_target: DEFAULT_BODY_TARGET.to_string(),
            }),
        }
    }

    /// Attach the peer address
    ///
    /// Copies the snapshot if other clones still share it; those clones keep
    /// the old value.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: Option<SocketAddr>) -> Self {
        Arc::make_mut(&mut self.inner).remote_addr = addr;
        self
    }

    /// Set the `HX-Target` id that counts as a whole-body swap
    #[must_use]
    pub fn with_body_target(mut self, target: &str) -> Self {
        Arc::make_mut(&mut self.inner).body_target = target.to_string();
        self
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    pub fn version(&self) -> Version {
        self.inner.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Header value by name, `None` when absent or not visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    /// htmx navigation signals for this request
    pub fn hx(&self) -> HxSignals {
        HxSignals::from_headers(&self.inner.headers, &self.inner.body_target)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("body_len", &self.inner.body.len())
            .finish_non_exhaustive()
    }
}
