//! HTTP protocol layer module
//!
//! Response builders shared by the view invoker, the layout composer and
//! the app's error pipeline.

pub mod response;

pub use response::{
    build_400_response, build_404_response, build_413_response, build_500_response,
    build_html_response, build_text_response, read_body, strip_body, HTML_CONTENT_TYPE,
};
