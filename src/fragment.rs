//! Render results
//!
//! Views and layouts may hand back one block of markup or an ordered list of
//! blocks. Both collapse into a single response body through
//! [`Fragment::normalize`].

use maud::{Markup, PreEscaped};

/// Separator placed between adjacent blocks of a sequence
pub const SEQUENCE_SEPARATOR: &str = "\n";

/// Escaped markup produced by a view or layout
#[derive(Debug, Clone)]
pub enum Fragment {
    Single(Markup),
    Sequence(Vec<Markup>),
}

impl Fragment {
    /// Collapse into one block, joining sequences with a newline
    pub fn normalize(self) -> Markup {
        match self {
            Self::Single(markup) => markup,
            Self::Sequence(parts) => {
                let joined = parts
                    .iter()
                    .map(|part| part.0.as_str())
                    .collect::<Vec<_>>()
                    .join(SEQUENCE_SEPARATOR);
                PreEscaped(joined)
            }
        }
    }

    /// Normalized body as an owned string
    pub fn into_string(self) -> String {
        self.normalize().into_string()
    }
}

impl From<Markup> for Fragment {
    fn from(markup: Markup) -> Self {
        Self::Single(markup)
    }
}

impl From<Vec<Markup>> for Fragment {
    fn from(parts: Vec<Markup>) -> Self {
        Self::Sequence(parts)
    }
}

impl<const N: usize> From<[Markup; N]> for Fragment {
    fn from(parts: [Markup; N]) -> Self {
        Self::Sequence(parts.into())
    }
}
