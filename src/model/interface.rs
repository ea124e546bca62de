//! Interfaces, methods and their parameters.

use std::sync::Arc;

use crate::base::Location;

use super::object::{Comment, Name, Object, ObjectKind};
use super::package::Package;
use super::types::TypeRef;

/// Data flow of a method parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `-->`
    In,
    /// `<--`
    Out,
    /// `<->`
    InOut,
}

impl Direction {
    pub fn from_arrow(arrow: &str) -> Option<Direction> {
        match arrow {
            "-->" => Some(Direction::In),
            "<--" => Some(Direction::Out),
            "<->" => Some(Direction::InOut),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub direction: Direction,
    pub ty: Option<TypeRef>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub parameters: Vec<Parameter>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    pub methods: Vec<Method>,
}

impl Interface {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl Method {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl Object for Interface {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Interface
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

impl Object for Method {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Method
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

impl Object for Parameter {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Parameter
    }

    fn location(&self) -> &Location {
        &self.location
    }
}
