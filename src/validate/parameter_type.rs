use crate::diagnostics::{MessageCollector, MessageKind, ParamKey};
use crate::model::{Builtin, Document, Object, TypeRef};

use super::{Node, Validator, message_at};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterTarget {
    Enumeration,
    Identifier,
}

impl ParameterTarget {
    fn classifier(self) -> &'static str {
        match self {
            ParameterTarget::Enumeration => "enumeration",
            ParameterTarget::Identifier => "identifier",
        }
    }
}

/// Restricts the underlying type of enumerations or identifiers to an
/// allow-list of builtins. A parameter still waiting for late resolution
/// passes; it is checked again once bound.
#[derive(Clone, Debug)]
pub struct ParameterTypeValidator {
    target: ParameterTarget,
    allowed: Vec<Builtin>,
}

impl ParameterTypeValidator {
    pub fn new(target: ParameterTarget, allowed: impl IntoIterator<Item = Builtin>) -> Self {
        Self {
            target,
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn enumeration() -> Self {
        Self::new(
            ParameterTarget::Enumeration,
            [Builtin::Small, Builtin::Short, Builtin::Integer],
        )
    }

    pub fn identifier() -> Self {
        Self::new(
            ParameterTarget::Identifier,
            [
                Builtin::Small,
                Builtin::Short,
                Builtin::Integer,
                Builtin::Long,
                Builtin::Byte,
                Builtin::Word,
                Builtin::Dword,
                Builtin::Qword,
            ],
        )
    }

    fn check(
        &self,
        parameter: Option<TypeRef>,
        node: &dyn Object,
        document: &Document,
        messages: &mut MessageCollector,
    ) -> bool {
        let Some(parameter) = parameter else {
            return true;
        };
        if parameter
            .as_builtin()
            .is_some_and(|b| self.allowed.contains(&b))
        {
            return true;
        }
        let options: Vec<_> = self.allowed.iter().map(|b| b.keyword()).collect();
        messages.add(
            message_at(MessageKind::InvalidParameterType, node)
                .with(ParamKey::Classifier, self.target.classifier())
                .with(ParamKey::Type, document.type_name(parameter))
                .with(ParamKey::Options, options.join(", ")),
        );
        false
    }
}

impl Validator for ParameterTypeValidator {
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool {
        match (self.target, node) {
            (ParameterTarget::Enumeration, Node::Enumeration(id)) => {
                let enumeration = document.enumeration(id);
                self.check(enumeration.parameter, enumeration, document, messages)
            }
            (ParameterTarget::Identifier, Node::Identifier(id)) => {
                let identifier = document.identifier(id);
                self.check(identifier.parameter, identifier, document, messages)
            }
            _ => true,
        }
    }

    fn checks_late_types(&self) -> bool {
        true
    }
}
