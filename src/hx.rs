//! htmx request signals
//!
//! Reads the three headers htmx attaches to its requests and decides whether
//! a layout should wrap the downstream body.

use hyper::header::{HeaderMap, HeaderValue};

pub const HX_REQUEST: &str = "hx-request";
pub const HX_BOOSTED: &str = "hx-boosted";
pub const HX_TARGET: &str = "hx-target";

/// Default id that marks a swap of the whole document body
pub const DEFAULT_BODY_TARGET: &str = "body";

/// Navigation signals carried by a single request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HxSignals {
    /// `HX-Request: true`, an in-place swap rather than a full page load
    pub is_partial: bool,
    /// `HX-Boosted: true`, a boosted link or form
    pub is_boosted: bool,
    /// `HX-Target` names the document body
    pub targets_body: bool,
}

impl HxSignals {
    /// Parse signals from request headers
    ///
    /// Absent or malformed values read as false, which falls back to
    /// full-document rendering.
    pub fn from_headers(headers: &HeaderMap, body_target: &str) -> Self {
        Self {
            is_partial: header_flag(headers.get(HX_REQUEST)),
            is_boosted: header_flag(headers.get(HX_BOOSTED)),
            targets_body: headers
                .get(HX_TARGET)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(body_target)),
        }
    }
}

fn header_flag(value: Option<&HeaderValue>) -> bool {
    value
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Decide whether a layout applies to the current request
///
/// Full page loads get every layout. Partial requests never get the root
/// layout since the client already holds the document; inner layouts apply
/// only when the request is boosted or swaps the whole body. The request
/// method plays no part.
pub const fn should_wrap(is_root: bool, signals: HxSignals) -> bool {
    if !signals.is_partial {
        return true;
    }
    if is_root {
        return false;
    }
    signals.is_boosted || signals.targets_body
}
