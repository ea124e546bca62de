//! Structures, their members, and inheritance-aware field queries.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::Location;
use crate::syntax::TokenKind;

use super::document::Document;
use super::ids::{EnumerationId, StructureId};
use super::object::{Comment, Name, Object, ObjectKind};
use super::package::Package;
use super::types::TypeRef;

// ============================================================================
// TRAITS
// ============================================================================

/// Boolean traits a structure can be declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trait {
    Abstract,
    Controlled,
    Immutable,
    Partial,
    Sharable,
    Streamable,
}

impl Trait {
    pub const ALL: [Trait; 6] = [
        Trait::Abstract,
        Trait::Controlled,
        Trait::Immutable,
        Trait::Partial,
        Trait::Sharable,
        Trait::Streamable,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Trait> {
        Trait::ALL.into_iter().find(|t| t.keyword() == keyword)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Trait::Abstract => "abstract",
            Trait::Controlled => "controlled",
            Trait::Immutable => "immutable",
            Trait::Partial => "partial",
            Trait::Sharable => "sharable",
            Trait::Streamable => "streamable",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of [`Trait`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Traits(u8);

impl Traits {
    pub fn insert(&mut self, t: Trait) {
        self.0 |= t.bit();
    }

    pub fn contains(self, t: Trait) -> bool {
        self.0 & t.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Trait> {
        Trait::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

// ============================================================================
// MEMBERS
// ============================================================================

/// Default of a field or alter clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultValue {
    /// `= optional`: the field may be left unset.
    Optional { location: Location },
    /// A literal, kept as written (strings without quotes).
    Value {
        value: SmolStr,
        token: TokenKind,
        location: Location,
    },
}

impl DefaultValue {
    pub fn is_optional(&self) -> bool {
        matches!(self, DefaultValue::Optional { .. })
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            DefaultValue::Value { value, .. } => Some(value),
            DefaultValue::Optional { .. } => None,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            DefaultValue::Optional { location } | DefaultValue::Value { location, .. } => location,
        }
    }
}

/// Points at a field member of some structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub structure: StructureId,
    pub member: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    /// `None` until late type resolution binds it.
    pub ty: Option<TypeRef>,
    pub bitmask: u32,
    pub default: Option<DefaultValue>,
    pub structure: StructureId,
}

/// `override Type name;` redeclaring a field of the base chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldOverride {
    pub field: Field,
    pub overridden: FieldRef,
}

/// `alter name = value` in the inherit clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alter {
    pub field: FieldRef,
    pub name: Name,
    pub default: DefaultValue,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentificationKind {
    Runtime,
    Inproc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identification {
    pub kind: IdentificationKind,
    pub location: Location,
    pub comment: Option<Comment>,
    pub structure: StructureId,
}

/// `upcopy from Base;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upcopy {
    pub base: StructureId,
    pub location: Location,
    pub comment: Option<Comment>,
    pub structure: StructureId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorAction {
    EqualTo,
    LessThan,
}

impl OperatorAction {
    pub fn from_token(text: &str) -> Option<OperatorAction> {
        match text {
            "==" => Some(OperatorAction::EqualTo),
            "<" => Some(OperatorAction::LessThan),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperatorAction::EqualTo => "==",
            OperatorAction::LessThan => "<",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum OperatorImplementation {
    /// Member operator generated in place.
    #[default]
    Native,
    /// Member operator calling a user function.
    Function,
    /// Separate functor object.
    Functor,
}

impl OperatorImplementation {
    pub fn from_keyword(keyword: &str) -> Option<OperatorImplementation> {
        match keyword {
            "native" => Some(OperatorImplementation::Native),
            "function" => Some(OperatorImplementation::Function),
            "functor" => Some(OperatorImplementation::Functor),
            _ => None,
        }
    }

    pub fn is_member(self) -> bool {
        !matches!(self, OperatorImplementation::Functor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operator {
    pub action: OperatorAction,
    pub implementation: OperatorImplementation,
    pub location: Location,
    pub comment: Option<Comment>,
    pub structure: StructureId,
}

/// One entry of a structure body, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Field(Field),
    FieldOverride(FieldOverride),
    Alter(Alter),
    Enumeration(EnumerationId),
    Identification(Identification),
    Upcopy(Upcopy),
    Operator(Operator),
}

impl Member {
    /// The field declared by this member, including an override's new field.
    pub fn field(&self) -> Option<&Field> {
        match self {
            Member::Field(field) => Some(field),
            Member::FieldOverride(o) => Some(&o.field),
            _ => None,
        }
    }

    pub(crate) fn field_mut(&mut self) -> Option<&mut Field> {
        match self {
            Member::Field(field) => Some(field),
            Member::FieldOverride(o) => Some(&mut o.field),
            _ => None,
        }
    }
}

// ============================================================================
// STRUCTURE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Structure {
    pub name: Name,
    pub location: Location,
    pub comment: Option<Comment>,
    pub package: Option<Arc<Package>>,
    pub base: Option<StructureId>,
    pub traits: Traits,
    pub members: Vec<Member>,
}

impl Structure {
    pub fn has_trait(&self, t: Trait) -> bool {
        self.traits.contains(t)
    }

    /// Own fields (plain and overriding) with their member index.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.members
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.field().map(|f| (i, f)))
    }

    pub fn alters(&self) -> impl Iterator<Item = &Alter> {
        self.members.iter().filter_map(|m| match m {
            Member::Alter(a) => Some(a),
            _ => None,
        })
    }

    pub fn nested_enumerations(&self) -> impl Iterator<Item = EnumerationId> + '_ {
        self.members.iter().filter_map(|m| match m {
            Member::Enumeration(id) => Some(*id),
            _ => None,
        })
    }

    /// Next free bitmask slot.
    pub(crate) fn next_bitmask(&self) -> u32 {
        self.fields().count() as u32
    }

    /// A structure can be instantiated by generated code unless abstract.
    pub fn is_buildable(&self) -> bool {
        !self.has_trait(Trait::Abstract)
    }
}

impl Object for Structure {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Structure
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

impl Object for Field {
    fn object_kind(&self) -> ObjectKind {
        ObjectKind::Field
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }
}

/// Entry of [`Document::combined_fields`].
#[derive(Clone, Copy, Debug)]
pub struct CombinedField<'a> {
    pub field: &'a Field,
    pub owner: FieldRef,
    /// Effective default after alters of derived structures.
    pub default: Option<&'a DefaultValue>,
}

// ============================================================================
// FIELD QUERIES
// ============================================================================

impl Document {
    /// The base chain of `id`, starting with its direct base.
    pub fn ancestors(&self, id: StructureId) -> impl Iterator<Item = StructureId> + '_ {
        std::iter::successors(self.structure(id).base, |b| self.structure(*b).base)
    }

    pub fn field(&self, field: FieldRef) -> Option<&Field> {
        self.structure(field.structure)
            .members
            .get(field.member)
            .and_then(Member::field)
    }

    /// Find a field by name: own fields first, then the base chain.
    pub fn find_field(&self, id: StructureId, name: &str) -> Option<FieldRef> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|structure| {
                self.structure(structure)
                    .fields()
                    .find(|(_, f)| f.name == name)
                    .map(|(member, _)| FieldRef { structure, member })
            })
    }

    /// All fields visible in `id`, base first.
    ///
    /// Overriding fields take the place of the field they override and
    /// alters replace the effective default, so every name appears once.
    pub fn combined_fields(&self, id: StructureId) -> Vec<CombinedField<'_>> {
        let mut chain: Vec<_> = std::iter::once(id).chain(self.ancestors(id)).collect();
        chain.reverse();

        let mut combined: Vec<CombinedField<'_>> = Vec::new();
        for structure in chain {
            let s = self.structure(structure);
            for (member, m) in s.members.iter().enumerate() {
                let owner = FieldRef { structure, member };
                match m {
                    Member::Field(field) => combined.push(CombinedField {
                        field,
                        owner,
                        default: field.default.as_ref(),
                    }),
                    Member::FieldOverride(o) => {
                        let entry = CombinedField {
                            field: &o.field,
                            owner,
                            default: o.field.default.as_ref(),
                        };
                        match combined.iter_mut().find(|c| c.owner == o.overridden) {
                            Some(slot) => *slot = entry,
                            None => combined.push(entry),
                        }
                    }
                    Member::Alter(a) => {
                        if let Some(slot) = combined.iter_mut().find(|c| c.owner == a.field) {
                            slot.default = Some(&a.default);
                        }
                    }
                    _ => {}
                }
            }
        }
        combined
    }

    /// Whether `id` is `candidate` or derives from it.
    pub fn is_recursively_inherit(&self, id: StructureId, candidate: StructureId) -> bool {
        id == candidate || self.ancestors(id).any(|a| a == candidate)
    }

    /// Whether one of the two structures derives from the other.
    pub fn is_recursively_related_to(&self, a: StructureId, b: StructureId) -> bool {
        self.is_recursively_inherit(a, b) || self.is_recursively_inherit(b, a)
    }

    /// Whether `id` overrides `field` with its own declaration.
    pub fn is_overriden(&self, id: StructureId, field: FieldRef) -> bool {
        self.structure(id).members.iter().any(|m| match m {
            Member::FieldOverride(o) => o.overridden == field,
            _ => false,
        })
    }

    pub fn has_operator(&self, id: StructureId, action: OperatorAction) -> bool {
        self.structure(id).members.iter().any(|m| match m {
            Member::Operator(op) => op.action == action,
            _ => false,
        })
    }

    /// Identification declared by `id` or the nearest base declaring one.
    pub fn identification(&self, id: StructureId) -> Option<&Identification> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|s| {
                self.structure(s).members.iter().find_map(|m| match m {
                    Member::Identification(i) => Some(i),
                    _ => None,
                })
            })
    }

    pub fn has_runtime_identification(&self, id: StructureId) -> bool {
        self.identification(id)
            .is_some_and(|i| i.kind == IdentificationKind::Runtime)
    }
}
