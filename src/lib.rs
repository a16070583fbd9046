//! Nested HTML layouts for htmx-driven hyper services.
//!
//! Register a root layout, inner layouts per path and views per route:
//!
//! ```no_run
//! use hxlayout::{html, layout_fn, view, view_fn, App, LayoutProps, ViewProps};
//!
//! let mut app = App::new(layout_fn(|p: LayoutProps| html! { body { (p.children) } }));
//! app.get("/", view(view_fn(|_p: ViewProps| html! { h1 { "Home" } })));
//! ```
//!
//! Full page loads get every layout. htmx requests (`HX-Request: true`) skip
//! the root layout, and skip inner layouts unless boosted or aimed at the
//! whole body.

pub mod app;
pub mod config;
pub mod context;
pub mod demo;
pub mod error;
pub mod fragment;
pub mod http;
pub mod hx;
pub mod layout;
pub mod logger;
pub mod server;
pub mod view;

pub use app::{handler_fn, App, AppSettings, Handler, HandlerResult, Middleware, Next};
pub use context::Context;
pub use error::{AppError, RenderError, ServerError};
pub use fragment::Fragment;
pub use hx::{should_wrap, HxSignals};
pub use layout::{layout, layout_fn, root_layout, Layout, LayoutMiddleware, LayoutProps};
pub use view::{view, view_fn, View, ViewHandler, ViewProps};

pub use maud::{html, Markup, PreEscaped};
