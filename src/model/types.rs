//! The type vocabulary: builtins, template instances and type handles.

use std::fmt;

use super::ids::{EnumerationId, IdentifierId, SpecimenId, StructureId, TemplateId};

/// Which default-value literal a type accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    /// `true` or `false`
    Boolean,
    Integer,
    /// Real or integer literal
    Real,
    String,
    /// Written as a string literal
    Binary,
    /// A value name of an enumeration
    Identifier,
    /// No literal form; only `optional` is accepted
    Structure,
    Reference,
    Vector,
}

impl Literal {
    pub fn describe(self) -> &'static str {
        match self {
            Literal::Boolean => "boolean",
            Literal::Integer => "integer",
            Literal::Real => "real",
            Literal::String => "string",
            Literal::Binary => "binary",
            Literal::Identifier => "enumeration",
            Literal::Structure => "structure",
            Literal::Reference => "reference",
            Literal::Vector => "vector",
        }
    }
}

/// Coarse classification used by code generators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KindClass {
    Builtin,
    Object,
    String,
}

/// Implicit-conversion permissiveness of enumerations, identifiers and
/// specimens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cast {
    #[default]
    Weak,
    Strong,
}

/// Types known by keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Boolean,
    Small,
    Short,
    Integer,
    Long,
    Byte,
    Word,
    Dword,
    Qword,
    Size,
    Real32,
    Real64,
    String,
    Binary,
}

impl Builtin {
    pub const ALL: [Builtin; 14] = [
        Builtin::Boolean,
        Builtin::Small,
        Builtin::Short,
        Builtin::Integer,
        Builtin::Long,
        Builtin::Byte,
        Builtin::Word,
        Builtin::Dword,
        Builtin::Qword,
        Builtin::Size,
        Builtin::Real32,
        Builtin::Real64,
        Builtin::String,
        Builtin::Binary,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Builtin> {
        Builtin::ALL.into_iter().find(|b| b.keyword() == keyword)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Builtin::Boolean => "boolean",
            Builtin::Small => "small",
            Builtin::Short => "short",
            Builtin::Integer => "integer",
            Builtin::Long => "long",
            Builtin::Byte => "byte",
            Builtin::Word => "word",
            Builtin::Dword => "dword",
            Builtin::Qword => "qword",
            Builtin::Size => "size",
            Builtin::Real32 => "real32",
            Builtin::Real64 => "real64",
            Builtin::String => "string",
            Builtin::Binary => "binary",
        }
    }

    pub fn literal(self) -> Literal {
        match self {
            Builtin::Boolean => Literal::Boolean,
            Builtin::Real32 | Builtin::Real64 => Literal::Real,
            Builtin::String => Literal::String,
            Builtin::Binary => Literal::Binary,
            _ => Literal::Integer,
        }
    }

    pub fn kind_class(self) -> KindClass {
        match self {
            Builtin::String => KindClass::String,
            Builtin::Binary => KindClass::Object,
            _ => KindClass::Builtin,
        }
    }

    pub fn is_integer(self) -> bool {
        self.literal() == Literal::Integer
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Parametric type shapes taking one type argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Reference,
    Vector,
}

impl TemplateKind {
    pub fn from_keyword(keyword: &str) -> Option<TemplateKind> {
        match keyword {
            "reference" => Some(TemplateKind::Reference),
            "vector" => Some(TemplateKind::Vector),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TemplateKind::Reference => "reference",
            TemplateKind::Vector => "vector",
        }
    }

    pub fn literal(self) -> Literal {
        match self {
            TemplateKind::Reference => Literal::Reference,
            TemplateKind::Vector => Literal::Vector,
        }
    }
}

/// A template applied to a parameter type.
///
/// The parameter is `None` while it waits for late type resolution; such
/// an instance is not yet finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateInstance {
    pub template: TemplateKind,
    pub parameter: Option<TypeRef>,
    /// `weak reference<T>`
    pub weak: bool,
}

impl TemplateInstance {
    pub fn is_finished(&self) -> bool {
        self.parameter.is_some()
    }
}

/// Handle of any type a field, parameter or declaration can refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Builtin(Builtin),
    Structure(StructureId),
    Enumeration(EnumerationId),
    Identifier(IdentifierId),
    Specimen(SpecimenId),
    Template(TemplateId),
}

impl TypeRef {
    pub fn as_structure(self) -> Option<StructureId> {
        match self {
            TypeRef::Structure(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_enumeration(self) -> Option<EnumerationId> {
        match self {
            TypeRef::Enumeration(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_builtin(self) -> Option<Builtin> {
        match self {
            TypeRef::Builtin(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keywords_roundtrip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_keyword(builtin.keyword()), Some(builtin));
        }
        assert_eq!(Builtin::from_keyword("vector"), None);
        assert_eq!(TemplateKind::from_keyword("vector"), Some(TemplateKind::Vector));
    }

    #[test]
    fn test_builtin_classes() {
        assert_eq!(Builtin::Qword.literal(), Literal::Integer);
        assert!(Builtin::Small.is_integer());
        assert_eq!(Builtin::Real64.literal(), Literal::Real);
        assert_eq!(Builtin::String.kind_class(), KindClass::String);
        assert_eq!(Builtin::Boolean.kind_class(), KindClass::Builtin);
        assert_eq!(Builtin::Binary.kind_class(), KindClass::Object);
    }
}
