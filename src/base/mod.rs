//! Foundation types for the compil front end.
//!
//! - [`SourceId`], [`SourceRegistry`] - identities of parsed sources
//! - [`Location`] - source-tagged line/column pairs
//! - [`TextRange`], [`TextSize`] - byte positions
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//!
//! This module has NO dependencies on other compil modules.

mod location;
mod source_id;
mod span;

pub use location::Location;
pub use source_id::{SourceId, SourceRegistry};
pub use span::{LineCol, LineIndex, TextRange, TextSize};

pub use text_size;
