//! Source-tagged positions carried by model nodes and messages.

use std::fmt;
use std::sync::Arc;

use super::SourceId;

/// A 1-based line/column position in a particular source.
///
/// `line == 0` marks a synthetic location that does not come from any
/// source text.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub source: Option<Arc<SourceId>>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(source: Option<Arc<SourceId>>, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
        }
    }

    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}:{}", source, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}
