//! # compil-base
//!
//! Front end for compil interface-definition documents: tokenizer, typed
//! document model, semantic validators and a recursive-descent parser with
//! late type resolution, import handling and error recovery.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project     → source providers, directory loading
//!   ↓
//! parser      → statements, declarations, late binding, recovery
//!   ↓
//! validate    → validators over finished nodes
//!   ↓
//! model       → Document arenas, TypeRef, structures, enumerations, ...
//!   ↓
//! syntax      → logos token kinds, tokenizer cursor
//!   ↓
//! diagnostics → Message, MessageKind, MessageCollector
//!   ↓
//! base        → SourceId, Location, text positions
//! ```
//!
//! ## Quick start
//!
//! ```
//! let parse = compil::parse_str("enum Color { red; green; }");
//! assert!(parse.ok());
//! assert!(parse.document.find_enumeration("Color").is_some());
//! ```

// ============================================================================
// FOUNDATION
// ============================================================================

/// Source identities and positions
pub mod base;

/// Located messages and their severities
pub mod diagnostics;

/// Tokens and the tokenizer
pub mod syntax;

// ============================================================================
// SEMANTICS
// ============================================================================

/// The document model
pub mod model;

/// Checks run on completed declarations
pub mod validate;

/// Parsing sources into documents
pub mod parser;

/// Loading sources from memory or disk
pub mod project;

pub use base::{Location, SourceId, SourceRegistry};
pub use diagnostics::{Message, MessageCollector, MessageKind, Severity};
pub use model::{Declaration, Document, TypeRef};
pub use parser::{DEFAULT_MAX_IMPORT_DEPTH, Parse, ParseOptions, ParseSession, parse_str};
pub use project::{
    FileSourceProvider, MemorySourceProvider, SourceError, SourceProvider, load_directory,
};
pub use validate::{Validator, Validators};
