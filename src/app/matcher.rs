//! Path pattern matching
//!
//! Patterns registered with the app:
//! - `*` matches every path
//! - `/prefix/*` matches `/prefix` and anything below it
//! - anything else matches exactly

/// Compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Any,
    Prefix(String),
    Exact(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            return Self::Any;
        }
        match pattern.strip_suffix("/*") {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    /// Check if a request path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => {
                // Segment boundary: "/bob/*" must not match "/bobby"
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            }
        }
    }
}

impl From<&str> for PathPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}
