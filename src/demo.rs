//! Demo site
//!
//! A root document that loads htmx and boosts every link, a Bob section
//! with its own layout, and a Bob page that lazily posts back for a list.

use crate::app::{App, AppSettings};
use crate::layout::{layout_fn, LayoutProps};
use crate::view::{view, view_fn, ViewProps};
use maud::{html, Markup, DOCTYPE};

const HTMX_SRC: &str = "https://unpkg.com/htmx.org/dist/htmx.min.js";

/// Outer document: head, htmx script, boosted body
pub fn root_layout(props: LayoutProps) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8";
                title { "hxlayout demo" }
                script src=(HTMX_SRC) {}
            }
            body hx-boost="true" {
                (props.children)
            }
        }
    }
}

/// Header and home link around every Bob page
pub fn bob_layout(props: LayoutProps) -> Markup {
    html! {
        h1 { "hxlayout demo" }
        a href="/" { "Go Home" }
        (props.children)
    }
}

pub fn home_page(_props: ViewProps) -> Markup {
    html! {
        h1 { "Home" }
        a href="/bob" { "Meet Bob" }
    }
}

pub fn bob_page(_props: ViewProps) -> Markup {
    html! {
        h1 { "Hello BOB!" }
        div hx-post="/bob" hx-trigger="load" { "Loading..." }
    }
}

/// Answer to the Bob page's lazy load: two sibling blocks
pub fn bob_page_post(_props: ViewProps) -> Vec<Markup> {
    vec![
        html! {
            ul {
                li { "Bob" }
                li { "Rocks" }
                li { "🎉" }
            }
        },
        html! { p { "Loaded via htmx" } },
    ]
}

/// Route table for the demo site
pub fn build_app(settings: AppSettings) -> App {
    let mut app = App::new(layout_fn(root_layout)).with_settings(settings);
    app.get("/", view(view_fn(home_page)))
        .layout("/bob", layout_fn(bob_layout))
        .post("/bob", view(view_fn(bob_page_post)))
        .get("/bob", view(view_fn(bob_page)));
    app
}
