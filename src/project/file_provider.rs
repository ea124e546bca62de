//! Sources read from the file system.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::trace;

use crate::base::SourceId;

use super::provider::{SourceError, SourceProvider};

/// Resolves imports against the importing file's directory, then the base
/// directory (the working directory unless set), then each import
/// directory in order.
///
/// Contents are cached per resolved path, so a provider shared by several
/// sessions reads each file once.
#[derive(Debug, Default)]
pub struct FileSourceProvider {
    base_dir: Option<PathBuf>,
    import_dirs: Vec<PathBuf>,
    cache: RwLock<IndexMap<SmolStr, Arc<str>>>,
}

impl FileSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_import_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_dirs.push(dir.into());
        self
    }

    /// Identity of a root source given by path.
    pub fn root(&self, path: impl AsRef<Path>) -> Result<SourceId, SourceError> {
        let path = path.as_ref();
        let resolved = match &self.base_dir {
            Some(base) if path.is_relative() && base.join(path).is_file() => base.join(path),
            _ => path.to_path_buf(),
        };
        let canonical = resolved.canonicalize().map_err(|source| SourceError::Io {
            path: resolved.clone(),
            source,
        })?;
        Ok(self.identity(&canonical, &path.to_string_lossy()))
    }

    /// Number of files read so far.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }

    fn base(&self) -> Option<PathBuf> {
        match &self.base_dir {
            Some(dir) => dir.canonicalize().ok(),
            None => std::env::current_dir().ok(),
        }
    }

    fn identity(&self, path: &Path, original: &str) -> SourceId {
        let value = path.to_string_lossy();
        let relative = self
            .base()
            .and_then(|base| path.strip_prefix(base).ok().map(Path::to_path_buf));
        let presentation = match relative {
            Some(relative) => self.unique_presentation(&relative.to_string_lossy()),
            None => self.unique_presentation(&value),
        };
        SourceId::new(value.as_ref())
            .with_original(original)
            .with_unique_presentation(presentation)
    }

    fn candidates(&self, current: Option<&Arc<SourceId>>, import: &str) -> Vec<PathBuf> {
        let import = Path::new(import);
        if import.is_absolute() {
            return vec![import.to_path_buf()];
        }
        let mut candidates = Vec::with_capacity(self.import_dirs.len() + 2);
        if let Some(dir) = current.and_then(|c| Path::new(c.value()).parent()) {
            candidates.push(dir.join(import));
        }
        match &self.base_dir {
            Some(base) => candidates.push(base.join(import)),
            None => candidates.push(import.to_path_buf()),
        }
        candidates.extend(self.import_dirs.iter().map(|dir| dir.join(import)));
        candidates
    }
}

impl SourceProvider for FileSourceProvider {
    fn resolve(&self, current: Option<&Arc<SourceId>>, import: &str) -> Option<SourceId> {
        let path = self
            .candidates(current, import)
            .into_iter()
            .find(|candidate| candidate.is_file())?;
        let canonical = path.canonicalize().ok()?;
        trace!(import, path = %canonical.display(), "import resolved");
        Some(self.identity(&canonical, import))
    }

    fn open(&self, source: &SourceId) -> Result<String, SourceError> {
        {
            let cache = self.cache.read();
            if let Some(text) = cache.get(source.value()) {
                return Ok(text.to_string());
            }
        }

        let path = PathBuf::from(source.value());
        let text: Arc<str> = std::fs::read_to_string(&path)
            .map_err(|source| SourceError::Io { path, source })?
            .into();

        let mut cache = self.cache.write();
        let text = cache
            .entry(SmolStr::new(source.value()))
            .or_insert(text)
            .clone();
        Ok(text.to_string())
    }

    fn unique_presentation(&self, value: &str) -> SmolStr {
        let parts: Vec<_> = Path::new(value)
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().replace('.', "_")),
                _ => None,
            })
            .collect();
        SmolStr::from(parts.join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("geo")).expect("mkdir");
        fs::create_dir_all(dir.path().join("lib")).expect("mkdir");
        fs::write(dir.path().join("main.compil"), "import \"geo/point.compil\";").expect("write");
        fs::write(dir.path().join("geo/point.compil"), "import \"shape.compil\";").expect("write");
        fs::write(dir.path().join("geo/shape.compil"), "").expect("write");
        fs::write(dir.path().join("lib/common.compil"), "").expect("write");
        dir
    }

    #[test]
    fn test_root_identity_is_relative_to_base() {
        let dir = workspace();
        let provider = FileSourceProvider::new().with_base_dir(dir.path());

        let root = provider.root("geo/point.compil").expect("root");
        assert_eq!(root.original(), "geo/point.compil");
        assert_eq!(root.unique_presentation(), "geo_point_compil");
        assert!(root.value().ends_with("point.compil"));
    }

    #[test]
    fn test_resolve_prefers_importing_directory() {
        let dir = workspace();
        let provider = FileSourceProvider::new().with_base_dir(dir.path());

        let point = Arc::new(provider.root("geo/point.compil").expect("root"));
        let shape = provider
            .resolve(Some(&point), "shape.compil")
            .expect("sibling resolves");
        assert_eq!(shape.original(), "shape.compil");
        assert_eq!(shape.unique_presentation(), "geo_shape_compil");
    }

    #[test]
    fn test_resolve_falls_back_to_import_dirs() {
        let dir = workspace();
        let provider = FileSourceProvider::new()
            .with_base_dir(dir.path())
            .with_import_dir(dir.path().join("lib"));

        assert!(provider.resolve(None, "common.compil").is_some());
        assert!(provider.resolve(None, "missing.compil").is_none());
    }

    #[test]
    fn test_open_caches_contents() {
        let dir = workspace();
        let provider = FileSourceProvider::new().with_base_dir(dir.path());

        let main = provider.root("main.compil").expect("root");
        assert_eq!(provider.open(&main).expect("open"), "import \"geo/point.compil\";");
        fs::write(dir.path().join("main.compil"), "changed").expect("write");
        assert_eq!(provider.open(&main).expect("open"), "import \"geo/point.compil\";");
        assert_eq!(provider.cached(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let provider = FileSourceProvider::new();
        let error = provider
            .open(&SourceId::new("/definitely/not/here.compil"))
            .expect_err("missing");
        assert!(matches!(error, SourceError::Io { .. }));
    }
}
