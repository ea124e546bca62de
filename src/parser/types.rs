//! Type expressions and default-value literals.

use smol_str::SmolStr;
use tracing::debug;

use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{
    Declaration, DefaultValue, Document, FieldRef, Literal, StructureId, TypeRef,
};
use crate::syntax::{Token, TokenKind};

use super::late::Slot;
use super::{PResult, Parser};

/// A possibly qualified type name as written: `Point`, `geo.Point`,
/// `Shape.Kind`.
#[derive(Debug, Clone)]
pub(crate) struct TypeName {
    /// Last segment, the name looked up.
    pub(crate) token: Token,
    pub(crate) path: Vec<SmolStr>,
    /// First segment; diagnostics about the whole name point here.
    pub(crate) first: Token,
}

impl TypeName {
    pub(crate) fn display(&self) -> String {
        let mut text = self.path.join(".");
        if !text.is_empty() {
            text.push('.');
        }
        text.push_str(&self.token.text);
        text
    }
}

/// Outcome of reading a type: known now, or to be bound later.
#[derive(Debug, Clone)]
pub(crate) enum TypeResolution {
    Resolved(TypeRef),
    Pending(TypeName),
}

impl TypeResolution {
    pub(crate) fn split(self) -> (Option<TypeRef>, Option<TypeName>) {
        match self {
            TypeResolution::Resolved(ty) => (Some(ty), None),
            TypeResolution::Pending(name) => (None, Some(name)),
        }
    }
}

/// Whether `value`, lexed as `token`, is a literal of type `ty`.
///
/// Unknown while the literal class depends on a pending parameter, in
/// which case the value is accepted.
pub(crate) fn accepts_literal(
    document: &Document,
    ty: TypeRef,
    token: TokenKind,
    value: &str,
) -> bool {
    let Some(literal) = document.literal(ty) else {
        return true;
    };
    match literal {
        Literal::Boolean => token == TokenKind::Identifier && matches!(value, "true" | "false"),
        Literal::Integer => token == TokenKind::IntegerLiteral,
        Literal::Real => matches!(token, TokenKind::RealLiteral | TokenKind::IntegerLiteral),
        Literal::String | Literal::Binary => token == TokenKind::StringLiteral,
        Literal::Identifier => {
            token == TokenKind::Identifier
                && ty
                    .as_enumeration()
                    .is_none_or(|id| document.enumeration(id).value(value).is_some())
        }
        Literal::Structure | Literal::Reference | Literal::Vector => false,
    }
}

impl Parser<'_, '_> {
    /// `name(.name)*`
    pub(super) fn parse_type_name(&mut self, classifier: &str) -> PResult<TypeName> {
        let mut path = Vec::new();
        let mut first = None;
        loop {
            let token = match self.current() {
                Some(token) if token.kind == TokenKind::Identifier => token.clone(),
                _ => {
                    return Err(self.report(
                        self.message(MessageKind::ExpectType)
                            .with(ParamKey::Classifier, classifier),
                    ));
                }
            };
            self.advance();
            if !self.at(TokenKind::Dot, ".") {
                let first = first.unwrap_or_else(|| token.clone());
                return Ok(TypeName { token, path, first });
            }
            self.advance();
            first.get_or_insert_with(|| token.clone());
            path.push(token.text);
        }
    }

    /// Look a name up as seen from the current source and `scope`.
    pub(super) fn lookup(&self, name: &TypeName, scope: Option<StructureId>) -> Option<TypeRef> {
        self.cx.document.find_type(
            self.package.as_deref(),
            name.path.as_slice(),
            scope,
            &name.token.text,
        )
    }

    /// A name that has to be known already, such as a base or an upcopy
    /// source.
    pub(super) fn resolve_now(
        &mut self,
        classifier: &str,
        scope: Option<StructureId>,
    ) -> PResult<(TypeName, TypeRef)> {
        let name = self.parse_type_name(classifier)?;
        match self.lookup(&name, scope) {
            Some(ty) => Ok((name, ty)),
            None => Err(self.report(
                self.message_at(MessageKind::UnknownClassifierType, &name.first)
                    .with(ParamKey::Classifier, classifier)
                    .with(ParamKey::Type, name.display()),
            )),
        }
    }

    /// A type name or a template instance: `reference<T>`, `vector<T>`,
    /// nested as deep as needed. `weak` marks a reference as weak.
    pub(super) fn parse_type_expression(
        &mut self,
        classifier: &'static str,
        scope: Option<StructureId>,
        weak: bool,
    ) -> PResult<TypeResolution> {
        let name = self.parse_type_name(classifier)?;
        let template = if name.path.is_empty() {
            self.cx.document.find_unfinished_unary_template(&name.token.text)
        } else {
            None
        };
        let Some(template) = template else {
            return Ok(match self.lookup(&name, scope) {
                Some(ty) => TypeResolution::Resolved(ty),
                None => TypeResolution::Pending(name),
            });
        };

        self.expect_token(TokenKind::RelationalOperator, "<")?;
        let parameter = self.parse_type_expression(classifier, scope, false)?;
        self.expect_token(TokenKind::RelationalOperator, ">")?;

        let (bound, pending) = parameter.split();
        let id = self.cx.document.instantiate(template, bound, weak);
        if let Some(pending) = pending {
            self.defer(pending, classifier, scope, Slot::TemplateParameter(id));
        }
        Ok(TypeResolution::Resolved(TypeRef::Template(id)))
    }

    /// Optional `<T>` after a declaration keyword.
    pub(super) fn parse_type_parameter(
        &mut self,
        classifier: &'static str,
        scope: Option<StructureId>,
    ) -> PResult<Option<TypeResolution>> {
        if !self.at(TokenKind::RelationalOperator, "<") {
            return Ok(None);
        }
        self.advance();
        let parameter = self.parse_type_expression(classifier, scope, false)?;
        self.expect_token(TokenKind::RelationalOperator, ">")?;
        Ok(Some(parameter))
    }

    /// `optional` or a literal, after the `=`.
    pub(super) fn parse_default(&mut self, statement: &str) -> PResult<DefaultValue> {
        let token = match self.current() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Identifier
                        | TokenKind::IntegerLiteral
                        | TokenKind::RealLiteral
                        | TokenKind::StringLiteral
                ) =>
            {
                token.clone()
            }
            _ => {
                return Err(self.report(
                    self.message(MessageKind::ExpectValue)
                        .with(ParamKey::Type, "literal")
                        .with(ParamKey::Statement, statement),
                ));
            }
        };
        self.advance();
        let location = self.location_of(&token);
        if token.is_keyword("optional") {
            return Ok(DefaultValue::Optional { location });
        }
        Ok(DefaultValue::Value {
            value: token.value(),
            token: token.kind,
            location,
        })
    }

    /// Report a default that is not a literal of `ty`.
    pub(super) fn check_default(
        &mut self,
        ty: TypeRef,
        default: &DefaultValue,
        statement: &str,
    ) -> PResult<()> {
        let DefaultValue::Value {
            value,
            token,
            location,
        } = default
        else {
            return Ok(());
        };
        if accepts_literal(&self.cx.document, ty, *token, value) {
            return Ok(());
        }
        let expected = self
            .cx
            .document
            .literal(ty)
            .map_or("literal", Literal::describe);
        let message = Message::new(MessageKind::ExpectValue, location.clone())
            .with(ParamKey::Type, expected)
            .with(ParamKey::Statement, statement);
        Err(self.report(message))
    }

    /// Check the defaults that depend on a field whose late-bound type just
    /// became known: its own default, then every `alter` of it.
    ///
    /// A bad field default is reported and removed; the field stays, as
    /// members of a completed structure are not renumbered. A structure
    /// with a bad alter is withdrawn from lookup, as it would have been
    /// rejected had the type been known while parsing it.
    pub(super) fn check_late_defaults(&mut self, field: FieldRef) {
        let Some(found) = self.cx.document.field(field) else {
            return;
        };
        let Some(ty) = found.ty else {
            return;
        };
        if let Some(default) = found.default.clone() {
            if self.check_default(ty, &default, "field").is_err() {
                let member = self
                    .cx
                    .document
                    .structure_mut(field.structure)
                    .members
                    .get_mut(field.member)
                    .and_then(|member| member.field_mut());
                if let Some(member) = member {
                    debug!(field = %member.name.value, "default dropped");
                    member.default = None;
                }
            }
        }

        let document = &self.cx.document;
        let alters: Vec<(StructureId, DefaultValue)> = document
            .structures()
            .flat_map(|id| {
                document
                    .structure(id)
                    .alters()
                    .filter(|alter| alter.field == field)
                    .map(move |alter| (id, alter.default.clone()))
            })
            .collect();
        let mut rejected: Vec<StructureId> = Vec::new();
        for (id, default) in alters {
            if self.check_default(ty, &default, "alter").is_err() && !rejected.contains(&id) {
                rejected.push(id);
            }
        }
        for id in rejected {
            debug!(structure = %self.cx.document.structure(id).name, "structure withdrawn");
            self.cx.document.unregister(Declaration::Structure(id));
        }
    }
}
