//! Enumerations.

use tracing::trace;

use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{
    Builtin, Cast, Comment, Enumeration, EnumerationId, EnumerationValue, EnumerationValueKind,
    StructureId, TypeRef,
};
use crate::syntax::{Token, TokenKind};

use super::late::Slot;
use super::modifiers::Modifiers;
use super::types::TypeResolution;
use super::{PResult, Parser};

pub(super) fn cast_of(modifiers: &mut Modifiers) -> Cast {
    match modifiers.take_any(&["strong", "weak"]) {
        Some(token) if token.text == "strong" => Cast::Strong,
        _ => Cast::Weak,
    }
}

impl Parser<'_, '_> {
    /// `[strong|weak] [flags] enum [<T>] Name [flags] { value; value = a | b; }`
    ///
    /// `structure` is the enclosing structure of a nested enumeration.
    pub(super) fn parse_enumeration(
        &mut self,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
        structure: Option<StructureId>,
    ) -> PResult<EnumerationId> {
        let keyword = self.expect_keyword("enum")?;
        let cast = cast_of(modifiers);
        let mut flags = modifiers.take("flags").is_some();
        let parameter = self
            .parse_type_parameter("enumeration parameter", structure)?
            .unwrap_or(TypeResolution::Resolved(TypeRef::Builtin(Builtin::Integer)));
        let name = self.expect_name("enumeration")?;
        if self.at_keyword("flags") {
            flags = true;
            self.advance();
        }

        let (bound, pending) = parameter.split();
        let id = self.cx.document.insert_enumeration(Enumeration {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            parameter: bound,
            flags,
            cast,
            values: Vec::new(),
            structure,
        });
        if let Some(pending) = pending {
            self.defer(
                pending,
                "enumeration parameter",
                structure,
                Slot::EnumerationParameter(id),
            );
        }

        self.open_body("enumeration")?;
        while let Some((comment, token)) = self.body_item("enumeration")? {
            if self.parse_enumeration_value(id, comment, &token).is_err() {
                self.recover();
            }
        }

        let enumeration = self.cx.document.enumeration_mut(id);
        enumeration.assign_values();
        trace!(
            enumeration = %enumeration.name,
            values = enumeration.values.len(),
            "enumeration parsed"
        );
        Ok(id)
    }

    /// `name;` or `name = earlier | earlier;`
    fn parse_enumeration_value(
        &mut self,
        id: EnumerationId,
        comment: Option<Comment>,
        first: &Token,
    ) -> PResult<()> {
        if first.kind != TokenKind::Identifier {
            return Err(self.unexpected("enumeration"));
        }
        let name = self.expect_name("enumeration value")?;
        let kind = if self.at(TokenKind::Operator, "=") {
            self.advance();
            let mut values = Vec::new();
            loop {
                let part = self.expect_name("enumeration value")?;
                let Some(index) = self.cx.document.enumeration(id).position(&part.value) else {
                    return Err(self.report(
                        Message::new(MessageKind::UnknownEnumerationValue, part.location)
                            .with(ParamKey::Name, part.value),
                    ));
                };
                values.push(index);
                if !self.at(TokenKind::BitwiseOperator, "|") {
                    break;
                }
                self.advance();
            }
            EnumerationValueKind::Composed { values, value: 0 }
        } else {
            EnumerationValueKind::Absolute { value: 0 }
        };
        self.expect_semicolon()?;

        let location = name.location.clone();
        self.cx
            .document
            .enumeration_mut(id)
            .values
            .push(EnumerationValue {
                name,
                location,
                comment,
                enumeration: id,
                kind,
            });
        Ok(())
    }
}
