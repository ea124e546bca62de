//! Enumerations and value assignment.

use std::sync::Arc;

use crate::base::Location;

use super::ids::{EnumerationId, StructureId};
use super::object::{Comment, Name, Object, ObjectKind};
use super::package::Package;
use super::types::{Cast, TypeRef};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumerationValueKind {
    /// Takes the next counter value.
    Absolute { value: i64 },
    /// Bitwise OR of earlier siblings, referenced by position.
    Composed { values: Vec<usize>, value: i64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationValue {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub enumeration: EnumerationId,
    pub kind: EnumerationValueKind,
}

impl EnumerationValue {
    pub fn value(&self) -> i64 {
        match &self.kind {
            EnumerationValueKind::Absolute { value } | EnumerationValueKind::Composed { value, .. } => {
                *value
            }
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.kind, EnumerationValueKind::Absolute { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enumeration {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    /// Underlying width; `None` until late type resolution binds it.
    pub parameter: Option<TypeRef>,
    pub flags: bool,
    pub cast: Cast,
    pub values: Vec<EnumerationValue>,
    /// Enclosing structure of a nested enumeration.
    pub structure: Option<StructureId>,
}

impl Enumeration {
    pub fn value(&self, name: &str) -> Option<&EnumerationValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|v| v.name == name)
    }

    /// Assign integers to all values.
    ///
    /// Absolute values count up from 0 with flags and from 1 without, since
    /// 0 is the reserved invalid value of plain enumerations. Composed
    /// values are then resolved in declaration order; they may only
    /// reference earlier values, which are therefore already resolved.
    pub fn assign_values(&mut self) {
        let mut counter: i64 = if self.flags { 0 } else { 1 };
        for value in &mut self.values {
            if let EnumerationValueKind::Absolute { value } = &mut value.kind {
                *value = counter;
                counter += 1;
            }
        }

        for index in 0..self.values.len() {
            let combined = match &self.values[index].kind {
                EnumerationValueKind::Composed { values, .. } => values
                    .iter()
                    .filter(|&&i| i < index)
                    .fold(0, |acc, &i| acc | self.values[i].value()),
                EnumerationValueKind::Absolute { .. } => continue,
            };
            if let EnumerationValueKind::Composed { value, .. } = &mut self.values[index].kind {
                *value = combined;
            }
        }
    }

    /// Smallest absolute value; clamped to at most 0 without flags.
    pub fn min_value(&self) -> i64 {
        let min = self
            .values
            .iter()
            .filter(|v| v.is_absolute())
            .map(EnumerationValue::value)
            .min();
        match (min, self.flags) {
            (Some(min), true) => min,
            (Some(min), false) => min.min(0),
            (None, _) => 0,
        }
    }

    /// Largest absolute value, at least 0.
    pub fn max_value(&self) -> i64 {
        self.values
            .iter()
            .filter(|v| v.is_absolute())
            .map(EnumerationValue::value)
            .fold(0, i64::max)
    }
}

impl Object for Enumeration {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Enumeration
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

impl Object for EnumerationValue {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::EnumerationValue
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}
