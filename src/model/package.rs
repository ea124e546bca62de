//! Package paths.

use std::fmt;

use smol_str::SmolStr;

use crate::base::Location;

use super::object::{Object, ObjectKind};

/// One segment of a package path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageElement {
    pub value: SmolStr,
    pub location: Location,
    /// Written as `*` and taken from the importing source's package.
    pub inherited: bool,
}

/// A package declaration: `package short.path [| levels.path];`.
///
/// `short` is the alias used when qualifying type names; `levels` is the
/// canonical path (for example the generated namespace). Without a `|`
/// both paths are the same.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    pub short: Vec<PackageElement>,
    pub levels: Vec<PackageElement>,
    pub location: Location,
}

impl Package {
    pub fn short_path(&self) -> impl Iterator<Item = &str> {
        self.short.iter().map(|e| e.value.as_str())
    }

    pub fn levels_path(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|e| e.value.as_str())
    }

    /// Whether `path` names this package by its short or levels path.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let path = path.iter().map(as_str);
        self.short_path().eq(path.clone()) || self.levels_path().eq(path)
    }

    /// Same canonical path.
    pub fn same_as(&self, other: &Package) -> bool {
        self.levels_path().eq(other.levels_path())
    }

    /// Compare two optional packages; two absent packages are the same.
    pub fn same(a: Option<&Package>, b: Option<&Package>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

fn as_str<S: AsRef<str>>(s: &S) -> &str {
    s.as_ref()
}

impl Object for Package {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Package
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: Vec<_> = self.short_path().collect();
        let levels: Vec<_> = self.levels_path().collect();
        write!(f, "{}", short.join("."))?;
        if short != levels {
            write!(f, " | {}", levels.join("."))?;
        }
        Ok(())
    }
}
