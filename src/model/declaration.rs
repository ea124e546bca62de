//! Leaf declarations: identifiers, specimens, factories, imports and the
//! main file marker.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{Location, SourceId};

use super::ids::SpecimenId;
use super::object::{Comment, Name, Object, ObjectKind};
use super::package::Package;
use super::structure::FieldRef;
use super::types::{Cast, TypeRef};

/// `identifier<T> Name {}`: a typed key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    pub parameter: Option<TypeRef>,
    pub cast: Cast,
}

/// `specimen<T> Name [inherit Base] {}`: a constrained value type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specimen {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    pub parameter: Option<TypeRef>,
    pub base: Option<SpecimenId>,
    pub cast: Cast,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FactoryType {
    Hierarchy,
    Object,
    Plugin,
}

impl FactoryType {
    pub fn from_keyword(keyword: &str) -> Option<FactoryType> {
        match keyword {
            "hierarchy" => Some(FactoryType::Hierarchy),
            "object" => Some(FactoryType::Object),
            "plugin" => Some(FactoryType::Plugin),
            _ => None,
        }
    }
}

/// `filter field with method;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub field: FieldRef,
    pub method: Name,
    pub location: Location,
    pub comment: Option<Comment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factory {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    pub factory_type: FactoryType,
    /// `function object factory`: instances are created by a function.
    pub function: bool,
    pub parameter: Option<TypeRef>,
    pub filters: Vec<Filter>,
}

/// `import "source";` as written, with the identity it resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub source: SmolStr,
    pub location: Location,
    pub comment: Option<Comment>,
    pub resolved: Option<Arc<SourceId>>,
}

/// Marker of the main (root) source of a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub location: Location,
    pub comment: Option<Comment>,
}

macro_rules! impl_object {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl Object for $ty {
                fn object_kind(&self) -> ObjectKind {
                    ObjectKind::$kind
                }

                fn location(&self) -> &Location {
                    &self.location
                }

                fn comment(&self) -> Option<&Comment> {
                    self.comment.as_ref()
                }
            }
        )*
    };
}

impl_object!(
    Identifier => Identifier,
    Specimen => Specimen,
    Factory => Factory,
    Filter => Filter,
    Import => Import,
    File => File,
);
