//! Route and middleware registrar
//!
//! Entry point for HTTP request processing: body size validation, route
//! matching, middleware chain dispatch, error mapping and access logging.

mod chain;
mod matcher;

pub use chain::{handler_fn, Handler, HandlerFn, HandlerResult, Middleware, Next, NotFound};
pub use matcher::PathPattern;

use crate::context::Context;
use crate::error::AppError;
use crate::http;
use crate::layout::{self, Layout};
use crate::logger::{self, AccessLogEntry};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

static NOT_FOUND: NotFound = NotFound;

/// Request handling settings taken from configuration
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server_name: String,
    pub max_body_size: u64,
    pub body_target: String,
    pub access_log: bool,
    pub access_log_format: String,
    pub show_headers: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_name: "hxlayout".to_string(),
            max_body_size: 1_048_576,
            body_target: crate::hx::DEFAULT_BODY_TARGET.to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
            show_headers: false,
        }
    }
}

struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Arc<dyn Handler>,
}

struct MiddlewareEntry {
    pattern: PathPattern,
    middleware: Arc<dyn Middleware>,
}

/// Route and middleware table
pub struct App {
    middleware: Vec<MiddlewareEntry>,
    routes: Vec<Route>,
    settings: AppSettings,
}

impl App {
    /// App whose every response passes through `root` as the document layout
    pub fn new(root: impl Layout) -> Self {
        let mut app = Self::empty();
        app.middleware("*", layout::root_layout(root));
        app
    }

    /// App without any layout registered
    pub fn empty() -> Self {
        Self {
            middleware: Vec::new(),
            routes: Vec::new(),
            settings: AppSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    pub const fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Register middleware for paths matching `path`
    ///
    /// Middleware run outer to inner in registration order.
    pub fn middleware(&mut self, path: &str, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(MiddlewareEntry {
            pattern: PathPattern::parse(path),
            middleware: Arc::new(middleware),
        });
        self
    }

    /// Register an inner layout for paths matching `path`
    pub fn layout(&mut self, path: &str, inner: impl Layout) -> &mut Self {
        self.middleware(path, layout::layout(inner))
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Self {
        self.route(Method::POST, path, handler)
    }

    pub fn route(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Self {
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(path),
            handler: Arc::new(handler),
        });
        self
    }

    /// Main entry point for HTTP request handling
    ///
    /// Never fails: errors from the chain become error responses here.
    pub async fn handle<B>(
        &self,
        req: Request<B>,
        remote_addr: Option<SocketAddr>,
    ) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let is_head = parts.method == Method::HEAD;

        logger::log_headers_count(parts.headers.len(), self.settings.show_headers);

        let mut entry = self.settings.access_log.then(|| {
            let mut entry = AccessLogEntry::new(
                remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
                parts.method.to_string(),
                parts.uri.path().to_string(),
            );
            entry.query = parts.uri.query().map(ToString::to_string);
            entry.http_version = version_label(parts.version).to_string();
            entry.referer = header_string(&parts.headers, REFERER);
            entry.user_agent = header_string(&parts.headers, USER_AGENT);
            entry
        });

        let collected = self.read_body(&parts.headers, body).await;
        let result = match collected {
            Ok(bytes) => {
                let ctx = Context::from_parts(parts, bytes)
                    .with_remote_addr(remote_addr)
                    .with_body_target(&self.settings.body_target);
                if let Some(entry) = entry.as_mut() {
                    entry.partial = ctx.hx().is_partial;
                }
                self.dispatch(ctx).await
            }
            Err(err) => Err(err),
        };

        let mut response = result.unwrap_or_else(|err| error_response(&err));
        if let Ok(value) = HeaderValue::from_str(&self.settings.server_name) {
            response.headers_mut().insert(SERVER, value);
        }

        let body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        if is_head {
            response = http::strip_body(response);
        }

        if let Some(mut entry) = entry {
            entry.status = response.status().as_u16();
            entry.body_bytes = if is_head { 0 } else { body_bytes };
            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, &self.settings.access_log_format);
        }

        response
    }

    /// Run the middleware chain and endpoint for a request
    pub async fn dispatch(&self, ctx: Context) -> HandlerResult {
        let path = ctx.path();
        let chain: Vec<Arc<dyn Middleware>> = self
            .middleware
            .iter()
            .filter(|entry| entry.pattern.matches(path))
            .map(|entry| Arc::clone(&entry.middleware))
            .collect();
        let endpoint = self.find_route(ctx.method(), path);

        Next::new(&chain, endpoint).run(ctx).await
    }

    /// First route matching method and path; HEAD falls back to GET routes
    fn find_route(&self, method: &Method, path: &str) -> &dyn Handler {
        let lookup = |wanted: &Method| {
            self.routes
                .iter()
                .find(|route| route.method == *wanted && route.pattern.matches(path))
        };

        let found = lookup(method).or_else(|| {
            if *method == Method::HEAD {
                lookup(&Method::GET)
            } else {
                None
            }
        });

        match found {
            Some(route) => route.handler.as_ref(),
            None => &NOT_FOUND,
        }
    }

    /// Validate Content-Length and collect the request body
    async fn read_body<B>(&self, headers: &hyper::HeaderMap, body: B) -> Result<Bytes, AppError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let max = self.settings.max_body_size;

        if let Some(size) = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            if size > max {
                return Err(AppError::PayloadTooLarge { size, max });
            }
        }

        let limit = usize::try_from(max).unwrap_or(usize::MAX);
        match Limited::new(body, limit).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.is::<LengthLimitError>() => Err(AppError::PayloadTooLarge {
                size: max.saturating_add(1),
                max,
            }),
            Err(err) => Err(AppError::Body(err)),
        }
    }
}

/// Map a chain error to the response the client sees
fn error_response(err: &AppError) -> Response<Full<Bytes>> {
    match err {
        AppError::PayloadTooLarge { .. } => {
            logger::log_warning(&err.to_string());
            http::build_413_response()
        }
        AppError::Body(_) => {
            logger::log_warning(&err.to_string());
            http::build_400_response()
        }
        AppError::Render(_) => {
            logger::log_error(&err.to_string());
            http::build_500_response()
        }
    }
}

fn header_string(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: hyper::Version) -> &'static str {
    if version == hyper::Version::HTTP_10 {
        "1.0"
    } else if version == hyper::Version::HTTP_2 {
        "2"
    } else if version == hyper::Version::HTTP_3 {
        "3"
    } else if version == hyper::Version::HTTP_09 {
        "0.9"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::layout::{layout_fn, LayoutProps};
    use crate::view::{view, view_fn, ViewProps};
    use hyper::StatusCode;
    use maud::{html, Markup};

    fn root(props: LayoutProps) -> Markup {
        html! { html { body { (props.children) } } }
    }

    fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let (_, body) = http::read_body(response).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn app() -> App {
        let mut app = App::new(layout_fn(root));
        app.layout("/docs/*", layout_fn(|p: LayoutProps| html! { nav {} (p.children) }))
            .get("/", view(view_fn(|_p: ViewProps| html! { p { "home" } })))
            .get("/docs/*", view(view_fn(|p: ViewProps| html! { p { (p.context.path()) } })))
            .post("/echo", view(view_fn(|p: ViewProps| {
                html! { pre { (String::from_utf8_lossy(p.context.body()).into_owned()) } }
            })))
            .get("/broken", view(|_p: ViewProps| async {
                Err::<Markup, _>(RenderError::new("view failed"))
            }));
        app
    }

    #[tokio::test]
    async fn test_full_load_wrapped_by_root() {
        let response = app().handle(request(Method::GET, "/", &[]), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "hxlayout");
        assert_eq!(body_text(response).await, "<html><body><p>home</p></body></html>");
    }

    #[tokio::test]
    async fn test_prefix_layout_and_route() {
        let response = app()
            .handle(request(Method::GET, "/docs/intro", &[]), None)
            .await;
        assert_eq!(
            body_text(response).await,
            "<html><body><nav></nav><p>/docs/intro</p></body></html>"
        );

        let boosted = app()
            .handle(
                request(
                    Method::GET,
                    "/docs/intro",
                    &[("hx-request", "true"), ("hx-boosted", "true")],
                ),
                None,
            )
            .await;
        assert_eq!(body_text(boosted).await, "<nav></nav><p>/docs/intro</p>");
    }

    #[tokio::test]
    async fn test_post_body_reaches_view() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("hx-request", "true")
            .body(Full::new(Bytes::from_static(b"a<b")))
            .unwrap();
        let response = app().handle(req, None).await;
        assert_eq!(body_text(response).await, "<pre>a&lt;b</pre>");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_inside_root() {
        let response = app().handle(request(Method::GET, "/missing", &[]), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_text(response).await,
            "<html><body>404 Not Found</body></html>"
        );

        let response = app()
            .handle(request(Method::POST, "/", &[("hx-request", "true")]), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "404 Not Found");
    }

    #[tokio::test]
    async fn test_view_error_becomes_500() {
        let response = app().handle(request(Method::GET, "/broken", &[]), None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_head_uses_get_route_without_body() {
        let response = app().handle(request(Method::HEAD, "/", &[]), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let expected = "<html><body><p>home</p></body></html>".len().to_string();
        assert_eq!(response.headers()[CONTENT_LENGTH], expected.as_str());
        assert!(body_text(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_body_limits() {
        let small = app().with_settings(AppSettings {
            max_body_size: 4,
            ..AppSettings::default()
        });

        let declared = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header(CONTENT_LENGTH, "100")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = small.handle(declared, None).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let streamed = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Full::new(Bytes::from_static(b"too long")))
            .unwrap();
        let response = small.handle(streamed, None).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_empty_app_has_no_layout() {
        let mut app = App::empty();
        app.get("/", view(view_fn(|_p: ViewProps| html! { "bare" })));
        let response = app.handle(request(Method::GET, "/", &[]), None).await;
        assert_eq!(body_text(response).await, "bare");
    }
}
