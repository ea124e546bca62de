use rustc_hash::FxHashSet;

use crate::diagnostics::{Message, MessageCollector, MessageKind, ParamKey};
use crate::model::{Document, Member, Trait, TypeRef};

use super::{Node, Validator, message_at};

/// Field-set consistency of a structure:
/// - own field names are unique,
/// - a plain field does not hide a base field (that needs `override`),
/// - at most one identification,
/// - each operator is declared once.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructureFieldsValidator;

impl Validator for StructureFieldsValidator {
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool {
        let Node::Structure(id) = node else {
            return true;
        };
        let structure = document.structure(id);
        let mut ok = true;
        let mut names = FxHashSet::default();
        let mut operators = FxHashSet::default();
        let mut identified = false;

        for member in &structure.members {
            match member {
                Member::Field(_) | Member::FieldOverride(_) => {
                    let Some(field) = member.field() else {
                        continue;
                    };
                    if !names.insert(field.name.value.clone()) {
                        messages.add(
                            message_at(MessageKind::DuplicateField, field)
                                .with(ParamKey::Name, field.name.value.clone()),
                        );
                        ok = false;
                        continue;
                    }
                    if !matches!(member, Member::Field(_)) {
                        continue;
                    }
                    let hidden = structure
                        .base
                        .and_then(|base| document.find_field(base, &field.name.value));
                    if let Some(hidden) = hidden {
                        let owner = &document.structure(hidden.structure).name;
                        messages.add(
                            message_at(MessageKind::FieldShadowsBase, field)
                                .with(ParamKey::Name, field.name.value.clone())
                                .with(ParamKey::Type, owner.value.clone()),
                        );
                        ok = false;
                    }
                }
                Member::Identification(identification) => {
                    if identified {
                        messages.add(
                            Message::new(
                                MessageKind::DuplicateIdentification,
                                identification.location.clone(),
                            )
                            .with(ParamKey::Name, structure.name.value.clone()),
                        );
                        ok = false;
                    }
                    identified = true;
                }
                Member::Operator(operator) => {
                    if !operators.insert(operator.action) {
                        messages.add(
                            Message::new(MessageKind::DuplicateOperator, operator.location.clone())
                                .with(ParamKey::Token, operator.action.symbol()),
                        );
                        ok = false;
                    }
                }
                Member::Alter(_) | Member::Enumeration(_) | Member::Upcopy(_) => {}
            }
        }
        ok
    }
}

/// A sharable structure may only hold sharable structures (directly or
/// through reference/vector), and a structure deriving from a sharable one
/// must be sharable itself.
///
/// Fields whose type is still pending pass and are checked once bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructureSharableValidator;

impl StructureSharableValidator {
    fn is_compatible(document: &Document, ty: TypeRef) -> bool {
        match ty {
            TypeRef::Structure(id) => document.structure(id).has_trait(Trait::Sharable),
            TypeRef::Template(id) => document
                .template(id)
                .parameter
                .is_none_or(|p| Self::is_compatible(document, p)),
            TypeRef::Builtin(_)
            | TypeRef::Enumeration(_)
            | TypeRef::Identifier(_)
            | TypeRef::Specimen(_) => true,
        }
    }
}

impl Validator for StructureSharableValidator {
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool {
        let Node::Structure(id) = node else {
            return true;
        };
        let structure = document.structure(id);
        let mut ok = true;

        if !structure.has_trait(Trait::Sharable) {
            if let Some(base) = structure.base {
                let base = document.structure(base);
                if base.has_trait(Trait::Sharable) {
                    messages.add(
                        message_at(MessageKind::NonSharableDerived, structure)
                            .with(ParamKey::Name, structure.name.value.clone())
                            .with(ParamKey::Type, base.name.value.clone()),
                    );
                    ok = false;
                }
            }
            return ok;
        }

        for (_, field) in structure.fields() {
            let Some(ty) = field.ty else {
                continue;
            };
            if !Self::is_compatible(document, ty) {
                messages.add(
                    message_at(MessageKind::NonSharableField, field)
                        .with(ParamKey::Name, field.name.value.clone())
                        .with(ParamKey::Type, document.type_name(ty)),
                );
                ok = false;
            }
        }
        ok
    }

    fn checks_late_types(&self) -> bool {
        true
    }
}
