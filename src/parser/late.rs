//! Late type resolution.
//!
//! A type name that does not resolve when it is read becomes a
//! [`LateBinding`]: the name as written plus the [`Slot`] that should
//! receive the type. Pending bindings are settled
//! - when a top-level type with that name is registered,
//! - for names inside a structure, against its nested enumerations once
//!   the structure body is complete,
//! - after each import is merged, by looking every pending name up again.
//!
//! Until the root source is finished, an unqualified name only binds to a
//! type of its own package; a type of another package is taken once
//! nothing else can be declared. Whatever is still pending then is
//! reported as an unknown type at the place it was written.
//!
//! Binding a type re-runs the checks that depend on it: defaults of the
//! field and its alters, and the late-type validators of the declaration
//! that holds the slot.

use std::mem;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::trace;

use crate::base::{Location, SourceId};
use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{
    EnumerationId, FactoryId, FieldRef, IdentifierId, InterfaceId, Package, SpecimenId,
    StructureId, TemplateId, TypeRef,
};
use crate::syntax::Token;
use crate::validate::Node;

use super::Parser;
use super::types::TypeName;

/// Where a late-bound type goes once it is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Field(FieldRef),
    EnumerationParameter(EnumerationId),
    IdentifierParameter(IdentifierId),
    SpecimenParameter(SpecimenId),
    FactoryParameter(FactoryId),
    TemplateParameter(TemplateId),
    MethodParameter {
        interface: InterfaceId,
        method: usize,
        parameter: usize,
    },
}

/// A type name waiting for its declaration.
#[derive(Debug, Clone)]
pub(crate) struct LateBinding {
    /// Last segment of the name, matched against declared names.
    pub(crate) token: Token,
    /// First segment; diagnostics point here.
    pub(crate) first: Token,
    /// Qualifying segments before the last one.
    pub(crate) path: Vec<SmolStr>,
    pub(crate) classifier: &'static str,
    /// Structure whose nested enumerations are visible to the name.
    pub(crate) scope: Option<StructureId>,
    /// Package in effect where the name was written.
    pub(crate) package: Option<Arc<Package>>,
    /// Source the name was written in.
    pub(crate) source: Option<Arc<SourceId>>,
    pub(crate) slot: Slot,
}

impl LateBinding {
    fn display_name(&self) -> String {
        self.path
            .iter()
            .map(SmolStr::as_str)
            .chain([self.token.text.as_str()])
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether a type called `name`, declared in `package`, satisfies this
    /// binding.
    fn accepts(&self, name: &str, package: Option<&Package>) -> bool {
        self.token.text == name
            && (self.path.is_empty() || package.is_some_and(|p| p.matches(self.path.as_slice())))
    }

    /// Whether a type declared in `package` may be bound before the parse
    /// is finished: qualified names always, unqualified ones only within
    /// their own package.
    fn binds_early(&self, package: Option<&Package>) -> bool {
        !self.path.is_empty() || Package::same(self.package.as_deref(), package)
    }

    /// The node to check again once this binding is filled in.
    fn owner(&self) -> Option<Node> {
        match self.slot {
            Slot::Field(field) => Some(Node::Structure(field.structure)),
            Slot::EnumerationParameter(id) => Some(Node::Enumeration(id)),
            Slot::IdentifierParameter(id) => Some(Node::Identifier(id)),
            Slot::SpecimenParameter(id) => Some(Node::Specimen(id)),
            Slot::FactoryParameter(id) => Some(Node::Factory(id)),
            Slot::TemplateParameter(_) => self.scope.map(Node::Structure),
            Slot::MethodParameter { interface, .. } => Some(Node::Interface(interface)),
        }
    }
}

impl Parser<'_, '_> {
    /// Park `name` until its type is declared.
    pub(super) fn defer(
        &mut self,
        name: TypeName,
        classifier: &'static str,
        scope: Option<StructureId>,
        slot: Slot,
    ) {
        trace!(name = %name.token.text, classifier, ?slot, "type deferred");
        self.pending.push(LateBinding {
            token: name.token,
            first: name.first,
            path: name.path,
            classifier,
            scope,
            package: self.package.clone(),
            source: self.source.clone(),
            slot,
        });
    }

    /// A top-level type was registered: bind every pending name it matches.
    pub(super) fn resolve_registered(&mut self, ty: TypeRef) {
        let document = &self.cx.document;
        let name = document.type_name(ty);
        let package = document.type_package(ty).cloned();

        let (matched, rest): (Vec<_>, Vec<_>) =
            mem::take(&mut self.pending).into_iter().partition(|binding| {
                binding.accepts(&name, package.as_deref())
                    && binding.binds_early(package.as_deref())
            });
        self.pending = rest;
        for binding in matched {
            self.bind(&binding, ty);
        }
    }

    /// A structure body is complete: bind names used inside it to its
    /// nested enumerations.
    pub(super) fn resolve_scope(&mut self, scope: StructureId) {
        let (local, rest): (Vec<_>, Vec<_>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|binding| binding.scope == Some(scope) && binding.path.is_empty());
        self.pending = rest;

        for binding in local {
            let nested = {
                let document = &self.cx.document;
                document
                    .structure(scope)
                    .nested_enumerations()
                    .find(|id| document.enumeration(*id).name == binding.token.text.as_str())
            };
            match nested {
                Some(id) => self.bind(&binding, TypeRef::Enumeration(id)),
                None => self.pending.push(binding),
            }
        }
    }

    /// Look every pending name up again, after an import brought in new
    /// declarations. With `last` nothing more will be declared, and a type
    /// of another package is accepted.
    pub(super) fn rescan_pending(&mut self, last: bool) {
        let pending = mem::take(&mut self.pending);
        for binding in pending {
            let document = &self.cx.document;
            let found = document
                .find_type(
                    binding.package.as_deref(),
                    binding.path.as_slice(),
                    binding.scope,
                    &binding.token.text,
                )
                .filter(|ty| {
                    last || binding.binds_early(document.type_package(*ty).map(Arc::as_ref))
                });
            match found {
                Some(ty) => self.bind(&binding, ty),
                None => self.pending.push(binding),
            }
        }
    }

    /// Report every name that never got a declaration.
    pub(super) fn report_unresolved(&mut self) {
        for binding in mem::take(&mut self.pending) {
            let location = Location::new(
                binding.source.clone(),
                binding.first.line,
                binding.first.start_column,
            );
            let message = Message::new(MessageKind::UnknownClassifierType, location)
                .with(ParamKey::Classifier, binding.classifier)
                .with(ParamKey::Type, binding.display_name());
            self.cx.messages.add(message);
        }
    }

    fn bind(&mut self, binding: &LateBinding, ty: TypeRef) {
        trace!(name = %binding.token.text, slot = ?binding.slot, "type bound");
        let document = &mut self.cx.document;
        match binding.slot {
            Slot::Field(field) => {
                let slot = document
                    .structure_mut(field.structure)
                    .members
                    .get_mut(field.member)
                    .and_then(|member| member.field_mut());
                if let Some(slot) = slot {
                    slot.ty = Some(ty);
                }
                self.check_late_defaults(field);
            }
            Slot::EnumerationParameter(id) => {
                document.enumeration_mut(id).parameter = Some(ty);
            }
            Slot::IdentifierParameter(id) => {
                document.identifier_mut(id).parameter = Some(ty);
            }
            Slot::SpecimenParameter(id) => {
                document.specimen_mut(id).parameter = Some(ty);
            }
            Slot::FactoryParameter(id) => {
                document.factory_mut(id).parameter = Some(ty);
            }
            Slot::TemplateParameter(id) => {
                document.template_mut(id).parameter = Some(ty);
            }
            Slot::MethodParameter {
                interface,
                method,
                parameter,
            } => {
                let slot = document
                    .interface_mut(interface)
                    .methods
                    .get_mut(method)
                    .and_then(|m| m.parameters.get_mut(parameter));
                if let Some(slot) = slot {
                    slot.ty = Some(ty);
                }
            }
        }
        if let Some(owner) = binding.owner() {
            self.revalidate(owner);
        }
    }
}
