//! Semantic validators run against fully built nodes.
//!
//! The parser runs the configured [`Validators`] on every completed
//! declaration and, for the root source, once on the whole document. Every
//! validator sees every node; each one decides whether the node concerns
//! it and returns `true` for nodes it does not check.

mod declarations;
mod enumeration;
mod parameter_type;
mod structure;

use std::fmt;

pub use declarations::DuplicateDeclarationValidator;
pub use enumeration::EnumerationValuesValidator;
pub use parameter_type::{ParameterTarget, ParameterTypeValidator};
pub use structure::{StructureFieldsValidator, StructureSharableValidator};

use crate::diagnostics::{Message, MessageCollector, MessageKind};
use crate::model::{
    Declaration, Document, EnumerationId, FactoryId, IdentifierId, InterfaceId, Object, SpecimenId,
    StructureId,
};

/// What a validator is asked to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    Structure(StructureId),
    Enumeration(EnumerationId),
    Identifier(IdentifierId),
    Specimen(SpecimenId),
    Interface(InterfaceId),
    Factory(FactoryId),
    /// The whole document, after the root source is parsed.
    Document,
}

impl Node {
    /// The declaration this node stands for, if any.
    pub fn declaration(self) -> Option<Declaration> {
        match self {
            Node::Structure(id) => Some(Declaration::Structure(id)),
            Node::Enumeration(id) => Some(Declaration::Enumeration(id)),
            Node::Identifier(id) => Some(Declaration::Identifier(id)),
            Node::Specimen(id) => Some(Declaration::Specimen(id)),
            Node::Interface(id) => Some(Declaration::Interface(id)),
            Node::Factory(id) => Some(Declaration::Factory(id)),
            Node::Document => None,
        }
    }
}

impl From<Declaration> for Node {
    fn from(declaration: Declaration) -> Self {
        match declaration {
            Declaration::Structure(id) => Node::Structure(id),
            Declaration::Enumeration(id) => Node::Enumeration(id),
            Declaration::Identifier(id) => Node::Identifier(id),
            Declaration::Specimen(id) => Node::Specimen(id),
            Declaration::Interface(id) => Node::Interface(id),
            Declaration::Factory(id) => Node::Factory(id),
        }
    }
}

pub trait Validator {
    /// Check `node`, adding one message per problem. Returns `false` if an
    /// error was reported.
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool;

    /// Whether the outcome depends on types that may be bound late. Such
    /// validators run again on a completed declaration once one of its
    /// pending types is filled in.
    fn checks_late_types(&self) -> bool {
        false
    }
}

/// Ordered validator list of a parse session.
pub struct Validators {
    validators: Vec<Box<dyn Validator>>,
}

impl Validators {
    pub fn empty() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// The built-in checks, in the order they run.
    pub fn standard() -> Self {
        let mut validators = Self::empty();
        validators.push(ParameterTypeValidator::enumeration());
        validators.push(ParameterTypeValidator::identifier());
        validators.push(StructureFieldsValidator);
        validators.push(StructureSharableValidator);
        validators.push(EnumerationValuesValidator);
        validators.push(DuplicateDeclarationValidator);
        validators
    }

    pub fn push(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Box::new(validator));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator; a failing one does not stop the others.
    pub fn validate(
        &self,
        node: Node,
        document: &Document,
        messages: &mut MessageCollector,
    ) -> bool {
        self.validators
            .iter()
            .fold(true, |ok, v| v.validate(node, document, messages) && ok)
    }

    /// Run only the validators whose outcome depends on late-bound types.
    pub fn validate_late_types(
        &self,
        node: Node,
        document: &Document,
        messages: &mut MessageCollector,
    ) -> bool {
        self.validators
            .iter()
            .filter(|v| v.checks_late_types())
            .fold(true, |ok, v| v.validate(node, document, messages) && ok)
    }
}

impl Default for Validators {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Validators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validators")
            .field("len", &self.validators.len())
            .finish()
    }
}

fn message_at(kind: MessageKind, object: &dyn Object) -> Message {
    Message::new(kind, object.location().clone())
}
