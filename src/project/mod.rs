//! Where sources come from.
//!
//! The parser only sees the [`SourceProvider`] trait. Two providers ship
//! with the crate:
//!
//! - [`MemorySourceProvider`] - named in-memory texts, mostly for tests
//! - [`FileSourceProvider`] - files, with import directories and a content cache
//!
//! [`load_directory`] parses a whole directory tree in parallel.

mod file_provider;
mod loader;
mod provider;

pub use file_provider::FileSourceProvider;
pub use loader::{SOURCE_EXTENSION, collect_source_paths, load_directory, load_documents};
pub use provider::{MemorySourceProvider, SourceError, SourceProvider};
