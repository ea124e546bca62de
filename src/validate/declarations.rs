use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::diagnostics::{Message, MessageCollector, MessageKind, ParamKey};
use crate::model::Document;

use super::{Node, Validator};

/// Two top-level declarations may not share a name within one package.
///
/// Runs once per document, after all sources are parsed, so that a
/// duplicate coming from an import is caught as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuplicateDeclarationValidator;

impl Validator for DuplicateDeclarationValidator {
    fn validate(&self, node: Node, document: &Document, messages: &mut MessageCollector) -> bool {
        if node != Node::Document {
            return true;
        }
        let mut seen: FxHashSet<(SmolStr, String)> = FxHashSet::default();
        let mut ok = true;

        for declaration in document.declarations() {
            let name = document.declaration_name(*declaration);
            let package = document
                .declaration_package(*declaration)
                .map(|p| p.levels_path().collect::<Vec<_>>().join("."))
                .unwrap_or_default();
            if !seen.insert((name.value.clone(), package)) {
                messages.add(
                    Message::new(MessageKind::DuplicateDeclaration, name.location.clone())
                        .with(ParamKey::Name, name.value.clone()),
                );
                ok = false;
            }
        }
        ok
    }
}
