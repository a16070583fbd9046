//! View invocation
//!
//! Adapts a page-rendering function into an endpoint [`Handler`].

use crate::app::{Handler, HandlerResult};
use crate::context::Context;
use crate::error::RenderError;
use crate::fragment::Fragment;
use crate::http::build_html_response;
use futures::future::{self, BoxFuture, FutureExt};
use hyper::StatusCode;
use std::future::Future;

/// Input handed to a view
pub struct ViewProps {
    pub context: Context,
}

/// Produces the leaf content of a route
///
/// Implemented for any async function or closure taking [`ViewProps`].
/// Use [`view_fn`] for a synchronous function.
pub trait View: Send + Sync + 'static {
    fn render(&self, props: ViewProps) -> BoxFuture<'static, Result<Fragment, RenderError>>;
}

impl<F, Fut, T> View for F
where
    F: Fn(ViewProps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RenderError>> + Send + 'static,
    T: Into<Fragment> + 'static,
{
    fn render(&self, props: ViewProps) -> BoxFuture<'static, Result<Fragment, RenderError>> {
        self(props).map(|result| result.map(Into::into)).boxed()
    }
}

/// Adapt a synchronous, infallible view function
pub fn view_fn<F, T>(f: F) -> impl View
where
    F: Fn(ViewProps) -> T + Send + Sync + 'static,
    T: Into<Fragment> + 'static,
{
    move |props: ViewProps| future::ready(Ok::<Fragment, RenderError>(f(props).into()))
}

/// Endpoint emitting a view's output as a `200 OK` HTML response
pub struct ViewHandler<V> {
    view: V,
}

impl<V: View> Handler for ViewHandler<V> {
    fn call(&self, ctx: Context) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            let body = self.view.render(ViewProps { context: ctx }).await?;
            Ok(build_html_response(StatusCode::OK, body.into_string()))
        })
    }
}

/// Wrap a view as a route handler
pub const fn view<V: View>(view: V) -> ViewHandler<V> {
    ViewHandler { view }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::http::{read_body, HTML_CONTENT_TYPE};
    use hyper::body::Bytes;
    use hyper::header::CONTENT_TYPE;
    use hyper::Request;
    use maud::{html, Markup};

    fn context(uri: &str) -> Context {
        let (parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Context::from_parts(parts, Bytes::new())
    }

    fn greeting(props: ViewProps) -> Markup {
        html! { h1 { "Hello " (props.context.path()) } }
    }

    #[tokio::test]
    async fn test_sync_view() {
        let handler = view(view_fn(greeting));
        let response = handler.call(context("/bob")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
        let (_, body) = read_body(response).await;
        assert_eq!(body.as_ref(), b"<h1>Hello /bob</h1>");
    }

    #[tokio::test]
    async fn test_sequence_view_joined() {
        let handler = view(|_props: ViewProps| async {
            Ok::<_, RenderError>(vec![
                html! { li { "Bob" } },
                html! { li { "Rocks" } },
            ])
        });
        let response = handler.call(context("/")).await.unwrap();
        let (_, body) = read_body(response).await;
        assert_eq!(body.as_ref(), b"<li>Bob</li>\n<li>Rocks</li>");
    }

    #[tokio::test]
    async fn test_repeat_render_is_identical() {
        let handler = view(view_fn(greeting));
        let (_, first) = read_body(handler.call(context("/a")).await.unwrap()).await;
        let (_, second) = read_body(handler.call(context("/a")).await.unwrap()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_view_error_propagates() {
        let handler = view(|_props: ViewProps| async {
            Err::<Markup, _>(RenderError::new("no data"))
        });
        let result = handler.call(context("/")).await;
        assert!(matches!(result, Err(AppError::Render(ref e)) if e.message() == "no data"));
    }
}
