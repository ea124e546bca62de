//! Shared node vocabulary: names, comments and runtime kinds.

use std::fmt;

use smol_str::SmolStr;

use crate::base::Location;

/// Runtime kind of a model node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    File,
    Import,
    Package,
    Structure,
    Field,
    FieldOverride,
    Alter,
    Enumeration,
    EnumerationValue,
    Identification,
    Upcopy,
    Operator,
    Interface,
    Method,
    Parameter,
    Identifier,
    Specimen,
    Factory,
    Filter,
}

/// Behavior common to every node of the model.
pub trait Object {
    fn object_kind(&self) -> ObjectKind;

    fn location(&self) -> &Location;

    fn comment(&self) -> Option<&Comment> {
        None
    }
}

/// An identifier as written in the source.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: SmolStr,
    pub location: Location,
}

impl Name {
    pub fn new(value: impl Into<SmolStr>, location: Location) -> Self {
        Self {
            value: value.into(),
            location,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.value, self.location)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.value.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.value.as_str() == *other
    }
}

/// Leading comment of a declaration, one entry per line without markers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Comment {
    pub lines: Vec<SmolStr>,
    pub location: Location,
}

impl Comment {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
