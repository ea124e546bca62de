//! The typed document model.
//!
//! ```text
//! Document
//!   ├── structures    ── members: Field | FieldOverride | Alter | Enumeration
//!   │                             | Identification | Upcopy | Operator
//!   ├── enumerations  ── values: Absolute | Composed
//!   ├── identifiers, specimens, factories
//!   ├── interfaces    ── methods ── parameters
//!   └── templates     (reference<T>, vector<T> instances)
//! ```
//!
//! Nodes are owned by the document's arenas and refer to each other by
//! typed ids ([`StructureId`], [`EnumerationId`], ...). Type references are
//! the closed sum [`TypeRef`].

mod declaration;
mod document;
mod enumeration;
mod ids;
mod interface;
mod object;
mod package;
mod structure;
mod types;

pub use declaration::{Factory, FactoryType, File, Filter, Identifier, Import, Specimen};
pub(crate) use document::Checkpoint;
pub use document::{Declaration, Document};
pub use enumeration::{Enumeration, EnumerationValue, EnumerationValueKind};
pub use ids::{
    EnumerationId, FactoryId, IdentifierId, InterfaceId, SpecimenId, StructureId, TemplateId,
};
pub use interface::{Direction, Interface, Method, Parameter};
pub use object::{Comment, Name, Object, ObjectKind};
pub use package::{Package, PackageElement};
pub use structure::{
    Alter, CombinedField, DefaultValue, Field, FieldOverride, FieldRef, Identification,
    IdentificationKind, Member, Operator, OperatorAction, OperatorImplementation, Structure, Trait,
    Traits, Upcopy,
};
pub use types::{Builtin, Cast, KindClass, Literal, TemplateInstance, TemplateKind, TypeRef};
