//! Source identities and the per-session source registry.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

/// Canonical identity of one parsed source.
///
/// `value` is the resolved form produced by a source provider (for files,
/// the normalized path); `original` is the text written at the import site.
/// Imported sources point at the source that imported them, so the chain of
/// parents describes the import path from the root.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceId {
    value: SmolStr,
    original: SmolStr,
    unique_presentation: SmolStr,
    parent: Option<Arc<SourceId>>,
}

impl SourceId {
    /// Identity whose original and presentation strings equal `value`.
    pub fn new(value: impl Into<SmolStr>) -> Self {
        let value = value.into();
        Self {
            original: value.clone(),
            unique_presentation: value.clone(),
            value,
            parent: None,
        }
    }

    pub fn with_original(mut self, original: impl Into<SmolStr>) -> Self {
        self.original = original.into();
        self
    }

    pub fn with_unique_presentation(mut self, presentation: impl Into<SmolStr>) -> Self {
        self.unique_presentation = presentation.into();
        self
    }

    pub fn with_parent(mut self, parent: Option<Arc<SourceId>>) -> Self {
        self.parent = parent;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn unique_presentation(&self) -> &str {
        &self.unique_presentation
    }

    pub fn parent(&self) -> Option<&Arc<SourceId>> {
        self.parent.as_ref()
    }

    /// Walk the import chain upwards, starting with the direct parent.
    pub fn ancestors(&self) -> impl Iterator<Item = &SourceId> {
        std::iter::successors(self.parent.as_deref(), |id| id.parent.as_deref())
    }

    /// Whether a source with `value` already appears on this import chain,
    /// this source included.
    pub fn is_on_chain(&self, value: &str) -> bool {
        self.value == value || self.ancestors().any(|id| id.value == value)
    }

    /// Import depth: zero for a root source.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// The source at the top of the import chain.
    pub fn root(&self) -> &SourceId {
        self.ancestors().last().unwrap_or(self)
    }

    /// Path of this source relative to the directory the root source was
    /// named from.
    ///
    /// The root's `original` names it relative to that directory, so the
    /// directory is what remains of the root's `value` once `original` is
    /// taken off its end. Falls back to `original` when `value` is not a
    /// path below that directory.
    pub fn relative_to_root(&self) -> PathBuf {
        let root = self.root();
        let named: PathBuf = Path::new(root.original())
            .components()
            .filter(|component| matches!(component, Component::Normal(_)))
            .collect();
        let root_value = Path::new(root.value());
        let base = if root_value.ends_with(&named) {
            root_value.ancestors().nth(named.components().count())
        } else {
            None
        };
        base.and_then(|base| Path::new(self.value()).strip_prefix(base).ok())
            .map_or_else(|| PathBuf::from(self.original()), Path::to_path_buf)
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.value)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Every source identity seen during one parse session, keyed by value.
///
/// Registration happens before a source is parsed so that a later import of
/// the same value (diamond or cycle) is recognized while the first parse is
/// still in progress.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: IndexMap<SmolStr, Arc<SourceId>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`, returning the shared handle.
    ///
    /// If a source with the same value is already known, the existing
    /// handle is returned and `id` is dropped.
    pub fn register(&mut self, id: SourceId) -> Arc<SourceId> {
        self.sources
            .entry(id.value.clone())
            .or_insert_with(|| Arc::new(id))
            .clone()
    }

    pub fn get(&self, value: &str) -> Option<&Arc<SourceId>> {
        self.sources.get(value)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.sources.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Sources in registration (depth-first, pre-order) order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SourceId>> {
        self.sources.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_builder() {
        let id = SourceId::new("/idl/a.compil")
            .with_original("a.compil")
            .with_unique_presentation("idl_a.compil");

        assert_eq!(id.value(), "/idl/a.compil");
        assert_eq!(id.original(), "a.compil");
        assert_eq!(id.unique_presentation(), "idl_a.compil");
        assert!(id.parent().is_none());
        assert_eq!(id.to_string(), "/idl/a.compil");
    }

    #[test]
    fn test_source_id_ancestor_walk() {
        let root = Arc::new(SourceId::new("root"));
        let middle = Arc::new(SourceId::new("middle").with_parent(Some(root.clone())));
        let leaf = SourceId::new("leaf").with_parent(Some(middle));

        let chain: Vec<_> = leaf.ancestors().map(SourceId::value).collect();
        assert_eq!(chain, vec!["middle", "root"]);
        assert_eq!(leaf.depth(), 2);
        assert!(leaf.is_on_chain("root"));
        assert!(leaf.is_on_chain("leaf"));
        assert!(!leaf.is_on_chain("other"));
    }

    #[test]
    fn test_relative_to_root_uses_resolved_value() {
        let root = Arc::new(SourceId::new("/work/main.compil").with_original("main.compil"));
        let point = Arc::new(
            SourceId::new("/work/geo/point.compil")
                .with_original("geo/point.compil")
                .with_parent(Some(root.clone())),
        );
        let shape = SourceId::new("/work/geo/shape.compil")
            .with_original("shape.compil")
            .with_parent(Some(point));

        assert_eq!(shape.root().value(), "/work/main.compil");
        assert_eq!(root.relative_to_root(), PathBuf::from("main.compil"));
        assert_eq!(shape.relative_to_root(), PathBuf::from("geo/shape.compil"));
    }

    #[test]
    fn test_relative_to_root_falls_back_to_original() {
        let named = SourceId::new("geo/shapes/point");
        assert_eq!(named.relative_to_root(), PathBuf::from("geo/shapes/point"));

        let root = Arc::new(SourceId::new("/work/main.compil").with_original("link.compil"));
        let child = SourceId::new("/work/geo/point.compil")
            .with_original("geo/point.compil")
            .with_parent(Some(root));
        assert_eq!(child.relative_to_root(), PathBuf::from("geo/point.compil"));
    }

    #[test]
    fn test_registry_keeps_first_identity() {
        let mut registry = SourceRegistry::new();
        let first = registry.register(SourceId::new("a").with_original("first"));
        let second = registry.register(SourceId::new("a").with_original("second"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.original(), "first");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("a"));
        assert!(registry.get("b").is_none());
    }
}
