//! Layout composition
//!
//! A layout wraps the body produced further down the chain in its own
//! markup. [`LayoutMiddleware`] runs the inner chain first, then asks
//! [`should_wrap`] whether this request wants the layout at all. When it does,
//! the buffered body becomes the layout's `children` and the response is
//! rebuilt around the layout's output; otherwise the inner response goes back
//! out untouched.

use crate::app::{HandlerResult, Middleware, Next};
use crate::context::Context;
use crate::error::RenderError;
use crate::fragment::Fragment;
use crate::http::{read_body, HTML_CONTENT_TYPE};
use crate::hx::should_wrap;
use crate::logger;
use futures::future::{self, BoxFuture, FutureExt};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::Response;
use maud::{Markup, PreEscaped};
use std::future::Future;

/// Input handed to a layout
pub struct LayoutProps {
    pub context: Context,
    /// Markup already rendered by the inner chain
    ///
    /// The inner body is decoded as UTF-8; invalid sequences become U+FFFD.
    pub children: Markup,
}

/// Wraps inner markup with surrounding markup
///
/// Implemented for any async function or closure taking [`LayoutProps`].
/// Use [`layout_fn`] for a synchronous function.
pub trait Layout: Send + Sync + 'static {
    fn render(&self, props: LayoutProps) -> BoxFuture<'static, Result<Fragment, RenderError>>;
}

impl<F, Fut, T> Layout for F
where
    F: Fn(LayoutProps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RenderError>> + Send + 'static,
    T: Into<Fragment> + 'static,
{
    fn render(&self, props: LayoutProps) -> BoxFuture<'static, Result<Fragment, RenderError>> {
        self(props).map(|result| result.map(Into::into)).boxed()
    }
}

/// Adapt a synchronous, infallible layout function
pub fn layout_fn<F, T>(f: F) -> impl Layout
where
    F: Fn(LayoutProps) -> T + Send + Sync + 'static,
    T: Into<Fragment> + 'static,
{
    move |props: LayoutProps| future::ready(Ok::<Fragment, RenderError>(f(props).into()))
}

/// Middleware applying one layout according to the request's htmx signals
pub struct LayoutMiddleware<L> {
    layout: L,
    is_root: bool,
}

impl<L: Layout> LayoutMiddleware<L> {
    pub const fn new(layout: L, is_root: bool) -> Self {
        Self { layout, is_root }
    }

    async fn compose(&self, ctx: Context, next: Next<'_>) -> HandlerResult {
        let response = next.run(ctx.clone()).await?;

        let signals = ctx.hx();
        let wrap = should_wrap(self.is_root, signals);
        if logger::debug_enabled() {
            logger::log_debug(&format!(
                "[Layout] {} {} {} (root: {}, {:?})",
                ctx.method(),
                ctx.path(),
                if wrap { "wrapped" } else { "skipped" },
                self.is_root,
                signals
            ));
        }
        if !wrap {
            return Ok(response);
        }

        let (mut parts, body) = read_body(response).await;
        let children = PreEscaped(String::from_utf8_lossy(&body).into_owned());
        let wrapped = self
            .layout
            .render(LayoutProps {
                context: ctx,
                children,
            })
            .await?
            .into_string();

        parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        parts
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(wrapped.len()));
        Ok(Response::from_parts(parts, Full::new(Bytes::from(wrapped))))
    }
}

impl<L: Layout> Middleware for LayoutMiddleware<L> {
    fn call<'a>(&'a self, ctx: Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.compose(ctx, next))
    }
}

/// Middleware for an inner layout
pub const fn layout<L: Layout>(layout: L) -> LayoutMiddleware<L> {
    LayoutMiddleware::new(layout, false)
}

/// Middleware for the outermost document layout
pub const fn root_layout<L: Layout>(layout: L) -> LayoutMiddleware<L> {
    LayoutMiddleware::new(layout, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{handler_fn, Handler};
    use crate::http::build_html_response;
    use hyper::{Method, Request, StatusCode};
    use maud::html;
    use std::sync::Arc;

    fn context(method: Method, headers: &[(&str, &str)]) -> Context {
        let mut builder = Request::builder().method(method).uri("/bob");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        Context::from_parts(parts, Bytes::new())
    }

    fn leaf() -> impl Handler {
        handler_fn(|_ctx| async {
            let mut response = build_html_response(StatusCode::CREATED, "<p>leaf</p>".to_string());
            response
                .headers_mut()
                .insert("x-trace", HeaderValue::from_static("kept"));
            Ok(response)
        })
    }

    fn boxed(children: Markup) -> Markup {
        html! { section { (children) } }
    }

    async fn run(
        middleware: Vec<Arc<dyn Middleware>>,
        ctx: Context,
    ) -> (hyper::http::response::Parts, String) {
        let endpoint = leaf();
        let response = Next::new(&middleware, &endpoint).run(ctx).await.unwrap();
        let (parts, body) = read_body(response).await;
        (parts, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_full_load_wraps_and_keeps_head() {
        let chain: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(root_layout(layout_fn(|p: LayoutProps| boxed(p.children))))];
        let (parts, body) = run(chain, context(Method::GET, &[])).await;
        assert_eq!(body, "<section><p>leaf</p></section>");
        assert_eq!(parts.status, StatusCode::CREATED);
        assert_eq!(parts.headers["x-trace"], "kept");
        assert_eq!(parts.headers[CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert_eq!(parts.headers[CONTENT_LENGTH], body.len().to_string().as_str());
    }

    #[tokio::test]
    async fn test_partial_skips_root() {
        let chain: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(root_layout(layout_fn(|p: LayoutProps| boxed(p.children))))];
        let ctx = context(
            Method::GET,
            &[("hx-request", "true"), ("hx-boosted", "true"), ("hx-target", "body")],
        );
        let (parts, body) = run(chain, ctx).await;
        assert_eq!(body, "<p>leaf</p>");
        assert_eq!(parts.headers[CONTENT_LENGTH], "11");
    }

    #[tokio::test]
    async fn test_nested_layouts_compose_in_order() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(root_layout(layout_fn(|p: LayoutProps| {
                html! { main { (p.children) } }
            }))),
            Arc::new(layout(layout_fn(|p: LayoutProps| boxed(p.children)))),
        ];
        let (_, body) = run(chain.clone(), context(Method::POST, &[])).await;
        assert_eq!(body, "<main><section><p>leaf</p></section></main>");

        let ctx = context(Method::POST, &[("hx-request", "true")]);
        let (_, body) = run(chain, ctx).await;
        assert_eq!(body, "<p>leaf</p>");
    }

    #[tokio::test]
    async fn test_async_layout_sees_context() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(layout(|p: LayoutProps| async move {
            let method = p.context.method().clone();
            Ok::<_, RenderError>(vec![html! { h1 { (method.as_str()) } }, p.children])
        }))];
        let ctx = context(Method::GET, &[("hx-request", "true"), ("hx-boosted", "true")]);
        let (_, body) = run(chain, ctx).await;
        assert_eq!(body, "<h1>GET</h1>\n<p>leaf</p>");
    }

    #[tokio::test]
    async fn test_layout_error_propagates() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(layout(|_p: LayoutProps| async {
            Err::<Markup, _>(RenderError::new("layout exploded"))
        }))];
        let endpoint = leaf();
        let result = Next::new(&chain, &endpoint)
            .run(context(Method::GET, &[]))
            .await;
        match result {
            Err(crate::error::AppError::Render(err)) => assert_eq!(err.message(), "layout exploded"),
            other => panic!("expected render error, got {:?}", other.map(|r| r.status())),
        }
    }

    #[tokio::test]
    async fn test_repeat_render_is_identical() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(root_layout(layout_fn(|p: LayoutProps| {
                html! { main { (p.children) } }
            }))),
            Arc::new(layout(layout_fn(|p: LayoutProps| boxed(p.children)))),
        ];
        let headers = [("hx-request", "true"), ("hx-boosted", "true")];
        let (first_parts, first) = run(chain.clone(), context(Method::GET, &headers)).await;
        let (second_parts, second) = run(chain, context(Method::GET, &headers)).await;
        assert_eq!(first, "<section><p>leaf</p></section>");
        assert_eq!(first, second);
        assert_eq!(first_parts.status, second_parts.status);
        assert_eq!(
            first_parts.headers[CONTENT_LENGTH],
            second_parts.headers[CONTENT_LENGTH]
        );
    }

    #[tokio::test]
    async fn test_children_are_not_escaped() {
        let chain: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(layout(layout_fn(|p: LayoutProps| p.children)))];
        let (_, body) = run(chain, context(Method::GET, &[])).await;
        assert_eq!(body, "<p>leaf</p>");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let chain: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(layout(layout_fn(|p: LayoutProps| p.children)))];
        let endpoint = handler_fn(|_ctx| async {
            Ok(Response::new(Full::new(Bytes::from_static(b"caf\xe9"))))
        });
        let response = Next::new(&chain, &endpoint)
            .run(context(Method::GET, &[]))
            .await
            .unwrap();
        let (_, body) = read_body(response).await;
        assert_eq!(body.as_ref(), "caf\u{fffd}".as_bytes());
    }
}
