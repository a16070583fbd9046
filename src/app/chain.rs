//! Middleware chain
//!
//! Endpoints produce a response; middleware receive the rest of the chain as
//! [`Next`] and decide what to do with whatever comes back.

use crate::context::Context;
use crate::error::AppError;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::future::Future;
use std::sync::Arc;

pub type HandlerResult = Result<Response<Full<Bytes>>, AppError>;

/// Leaf of the chain, answers a request
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'_, HandlerResult>;
}

/// Wraps the remainder of the chain
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult>;
}

/// Remaining middleware plus the endpoint for one request
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn new(middleware: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Handler) -> Self {
        Self {
            middleware,
            endpoint,
        }
    }

    /// Run the rest of the chain to completion
    pub async fn run(self, ctx: Context) -> HandlerResult {
        match self.middleware.split_first() {
            Some((current, rest)) => current.call(ctx, Next::new(rest, self.endpoint)).await,
            None => self.endpoint.call(ctx).await,
        }
    }
}

/// Handler backed by an async function
pub struct HandlerFn<F> {
    f: F,
}

/// Turn `async fn(Context) -> HandlerResult` into a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'_, HandlerResult> {
        Box::pin((self.f)(ctx))
    }
}

/// Endpoint used when no route matches
pub struct NotFound;

impl Handler for NotFound {
    fn call(&self, _ctx: Context) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async { Ok(crate::http::build_404_response()) })
    }
}
