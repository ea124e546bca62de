use rustc_hash::FxHashSet;

use crate::diagnostics::{MessageCollector, MessageKind, ParamKey};
use crate::model::{Document, EnumerationValueKind};

use super::{Node, Validator, message_at};

/// Value names are unique within an enumeration. Composed values outside
/// a flags enumeration are legal but suspicious and only warned about.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumerationValuesValidator;

impl Validator for EnumerationValuesValidator {
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool {
        let Node::Enumeration(id) = node else {
            return true;
        };
        let enumeration = document.enumeration(id);
        let mut ok = true;
        let mut names = FxHashSet::default();

        for value in &enumeration.values {
            if !names.insert(value.name.value.clone()) {
                messages.add(
                    message_at(MessageKind::DuplicateEnumerationValue, value)
                        .with(ParamKey::Name, value.name.value.clone()),
                );
                ok = false;
            }
            if !enumeration.flags && matches!(value.kind, EnumerationValueKind::Composed { .. }) {
                messages.add(
                    message_at(MessageKind::ComposedValueInNonFlags, value)
                        .with(ParamKey::Name, value.name.value.clone()),
                );
            }
        }
        ok
    }
}
