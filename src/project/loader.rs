//! Bulk loading: every IDL file under a directory, parsed in parallel.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::base::SourceId;
use crate::parser::{Parse, ParseOptions, ParseSession};

use super::file_provider::FileSourceProvider;
use super::provider::{SourceError, SourceProvider};

/// Extension of IDL source files.
pub const SOURCE_EXTENSION: &str = "compil";

/// All IDL files below `dir`, sorted.
pub fn collect_source_paths(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse each root in its own session. Results keep the order of `roots`.
pub fn load_documents<P>(provider: &P, roots: &[SourceId]) -> Vec<Parse>
where
    P: SourceProvider + Sync,
{
    let parses: Vec<Parse> = roots
        .par_iter()
        .map(|root| {
            debug!(source = %root.value(), "loading");
            ParseSession::new()
                .with_options(ParseOptions::default())
                .with_provider(provider)
                .parse_source(root.clone())
        })
        .collect();
    let failed = parses.iter().filter(|parse| !parse.ok()).count();
    info!(documents = parses.len(), failed, "documents loaded");
    parses
}

/// Parse every IDL file under `dir` as a root, resolving imports against
/// `dir`.
pub fn load_directory(dir: impl AsRef<Path>) -> Result<Vec<Parse>, SourceError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SourceError::NotFound(dir.to_string_lossy().into()));
    }

    let provider = FileSourceProvider::new().with_base_dir(dir);
    let roots = collect_source_paths(dir)?
        .into_iter()
        .map(|path| provider.root(path))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(dir = %dir.display(), roots = roots.len(), "loading directory");
    Ok(load_documents(&provider, &roots))
}
