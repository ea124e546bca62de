//! Source providers: how import strings become source identities and text.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::SourceId;

/// Failure to read a resolved source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source not found: {0}")]
    NotFound(SmolStr),

    #[error("source {0} cannot be opened")]
    Unopenable(SmolStr),

    #[error("cannot read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// Maps import strings to sources.
///
/// The parser calls [`SourceProvider::resolve`] for every `import`, with
/// the identity of the importing source, and [`SourceProvider::open`] for
/// sources it has not parsed yet.
pub trait SourceProvider {
    /// Identity of the source `import` refers to, as seen from `current`.
    /// The parser sets the parent link itself.
    fn resolve(&self, current: Option<&Arc<SourceId>>, import: &str) -> Option<SourceId>;

    /// Full text of a resolved source.
    fn open(&self, source: &SourceId) -> Result<String, SourceError>;

    /// Name safe to use in generated identifiers for `value`.
    fn unique_presentation(&self, value: &str) -> SmolStr {
        SmolStr::from(value.replace(['/', '\\', '.'], "_"))
    }
}

/// In-memory sources keyed by name. Import strings are matched exactly.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    sources: IndexMap<SmolStr, String>,
    unopenable: FxHashSet<SmolStr>,
}

impl MemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, name: impl Into<SmolStr>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, text: impl Into<String>) {
        self.sources.insert(name.into(), text.into());
    }

    /// Make `name` resolvable but failing to open.
    pub fn set_unopenable(&mut self, name: impl Into<SmolStr>) {
        self.unopenable.insert(name.into());
    }

    /// Identity of a stored source, for use as a parse root.
    pub fn source_id(&self, name: &str) -> Option<SourceId> {
        self.resolve(None, name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceProvider for MemorySourceProvider {
    fn resolve(&self, _current: Option<&Arc<SourceId>>, import: &str) -> Option<SourceId> {
        if !self.sources.contains_key(import) && !self.unopenable.contains(import) {
            return None;
        }
        Some(
            SourceId::new(import)
                .with_original(import)
                .with_unique_presentation(self.unique_presentation(import)),
        )
    }

    fn open(&self, source: &SourceId) -> Result<String, SourceError> {
        let name = source.value();
        if self.unopenable.contains(name) {
            return Err(SourceError::Unopenable(SmolStr::new(name)));
        }
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(SmolStr::new(name)))
    }
}
