//! Structures and their members.

use tracing::trace;

use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{
    Alter, Comment, EnumerationId, Field, FieldOverride, FieldRef, Identification,
    IdentificationKind, Member, Operator, OperatorAction, OperatorImplementation, Structure,
    StructureId, Trait, Traits, TypeRef, Upcopy,
};
use crate::syntax::{Token, TokenKind};
use crate::validate::Node;

use super::late::Slot;
use super::modifiers::{MEMBER_MODIFIERS, Modifiers};
use super::types::TypeResolution;
use super::{PResult, Parser};

const MEMBER_IMPLEMENTATIONS: &[&str] = &["native", "function", "functor"];
const IDENTIFICATION_KINDS: &[&str] = &["runtime", "inproc"];

fn identification_kind(keyword: &str) -> IdentificationKind {
    if keyword == "inproc" {
        IdentificationKind::Inproc
    } else {
        IdentificationKind::Runtime
    }
}

impl Parser<'_, '_> {
    /// `[traits] structure Name [inherit Base [alter f = v, ...]] { members }`
    pub(super) fn parse_structure(
        &mut self,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<StructureId> {
        let keyword = self.expect_keyword("structure")?;
        let mut traits = Traits::default();
        for t in Trait::ALL {
            if modifiers.take(t.keyword()).is_some() {
                traits.insert(t);
            }
        }
        let name = self.expect_name("structure")?;
        let id = self.cx.document.insert_structure(Structure {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            base: None,
            traits,
            members: Vec::new(),
        });

        if self.at_keyword("inherit") {
            self.advance();
            let base = self.parse_structure_base()?;
            self.cx.document.structure_mut(id).base = Some(base);
            if self.at_keyword("alter") {
                self.parse_alters(id, base)?;
            }
        }

        self.open_body("structure")?;
        while let Some((comment, token)) = self.body_item("structure")? {
            let checkpoint = self.checkpoint();
            match self.parse_member(id, comment, &token) {
                Ok(None) => {}
                Ok(Some(enumeration)) => {
                    if self.validate(Node::Enumeration(enumeration)) {
                        self.cx
                            .document
                            .structure_mut(id)
                            .members
                            .push(Member::Enumeration(enumeration));
                    } else {
                        self.rollback(checkpoint);
                    }
                }
                Err(_) => {
                    self.rollback(checkpoint);
                    self.recover();
                }
            }
        }
        self.resolve_scope(id);
        trace!(structure = %self.cx.document.structure(id).name, "structure parsed");
        Ok(id)
    }

    fn parse_structure_base(&mut self) -> PResult<StructureId> {
        let (name, ty) = self.resolve_now("base", None)?;
        match ty {
            TypeRef::Structure(base) => Ok(base),
            _ => Err(self.report(
                self.message_at(MessageKind::ExpectAppropriateType, &name.first)
                    .with(ParamKey::Classifier, "base")
                    .with(ParamKey::Options, "structure"),
            )),
        }
    }

    /// `alter field = value, field = value`
    fn parse_alters(&mut self, id: StructureId, base: StructureId) -> PResult<()> {
        loop {
            // `alter` or `,`
            self.advance();
            let name = self.expect_name("altered field")?;
            let Some(field) = self.cx.document.find_field(base, &name.value) else {
                return Err(self.report(
                    Message::new(MessageKind::UnknownBaseField, name.location.clone())
                        .with(ParamKey::Name, name.value.clone()),
                ));
            };
            self.expect_token(TokenKind::Operator, "=")?;
            let default = self.parse_default("alter")?;
            let ty = self.cx.document.field(field).and_then(|f| f.ty);
            if let Some(ty) = ty {
                self.check_default(ty, &default, "alter")?;
            }
            let location = name.location.clone();
            self.cx
                .document
                .structure_mut(id)
                .members
                .push(Member::Alter(Alter {
                    field,
                    name,
                    default,
                    location,
                }));
            if !self.at(TokenKind::Delimiter, ",") {
                return Ok(());
            }
        }
    }

    /// One member. A nested enumeration is returned to the caller, which
    /// validates it before adding it to the structure.
    fn parse_member(
        &mut self,
        id: StructureId,
        comment: Option<Comment>,
        first: &Token,
    ) -> PResult<Option<EnumerationId>> {
        if first.kind != TokenKind::Identifier {
            return Err(self.unexpected("structure"));
        }
        let mut modifiers = self.collect_modifiers(MEMBER_MODIFIERS);
        let keyword = self.current().map(|t| t.text.clone()).unwrap_or_default();
        let nested = match keyword.as_str() {
            "identification" => {
                self.parse_identification(id, comment, &mut modifiers)?;
                None
            }
            "upcopy" => {
                self.parse_upcopy(id, comment)?;
                None
            }
            "operator" => {
                self.parse_operator(id, comment, &mut modifiers)?;
                None
            }
            "enum" => Some(self.parse_enumeration(comment, &mut modifiers, Some(id))?),
            _ => {
                self.parse_field(id, comment, &mut modifiers)?;
                None
            }
        };
        self.report_unclaimed(modifiers);
        Ok(nested)
    }

    /// `[runtime|inproc] identification [runtime|inproc];`
    fn parse_identification(
        &mut self,
        id: StructureId,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<()> {
        let keyword = self.expect_keyword("identification")?;
        let mut kind = modifiers
            .take_any(IDENTIFICATION_KINDS)
            .map(|t| identification_kind(&t.text));
        if let Some(token) = self
            .current()
            .filter(|t| IDENTIFICATION_KINDS.contains(&t.text.as_str()))
        {
            kind = Some(identification_kind(&token.text));
            self.advance();
        }
        self.expect_semicolon()?;
        let identification = Identification {
            kind: kind.unwrap_or(IdentificationKind::Runtime),
            location: self.location_of(&keyword),
            comment,
            structure: id,
        };
        self.cx
            .document
            .structure_mut(id)
            .members
            .push(Member::Identification(identification));
        Ok(())
    }

    /// `upcopy from Ancestor;`
    fn parse_upcopy(&mut self, id: StructureId, comment: Option<Comment>) -> PResult<()> {
        let keyword = self.expect_keyword("upcopy")?;
        self.expect_keyword("from")?;
        let name = self.parse_type_name("upcopy")?;
        // the enclosing structure is not registered yet
        let own = name.path.is_empty()
            && self.cx.document.structure(id).name == name.token.text.as_str();
        let ty = if own {
            Some(TypeRef::Structure(id))
        } else {
            self.lookup(&name, None)
        };
        let Some(ty) = ty else {
            return Err(self.report(
                self.message_at(MessageKind::UnknownClassifierType, &name.first)
                    .with(ParamKey::Classifier, "upcopy")
                    .with(ParamKey::Type, name.display()),
            ));
        };
        let TypeRef::Structure(base) = ty else {
            return Err(self.report(
                self.message_at(MessageKind::ExpectAppropriateType, &name.first)
                    .with(ParamKey::Classifier, "upcopy")
                    .with(ParamKey::Options, "structure"),
            ));
        };
        let document = &self.cx.document;
        if base == id || !document.is_recursively_inherit(id, base) {
            let message = self
                .message_at(MessageKind::UpcopyFromNonAncestor, &name.first)
                .with(ParamKey::Type, document.structure(base).name.value.clone())
                .with(ParamKey::Name, document.structure(id).name.value.clone());
            return Err(self.report(message));
        }
        self.expect_semicolon()?;
        let upcopy = Upcopy {
            base,
            location: self.location_of(&keyword),
            comment,
            structure: id,
        };
        self.cx
            .document
            .structure_mut(id)
            .members
            .push(Member::Upcopy(upcopy));
        Ok(())
    }

    /// `[native|function|functor] operator ==|<;`
    fn parse_operator(
        &mut self,
        id: StructureId,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<()> {
        let keyword = self.expect_keyword("operator")?;
        let implementation = modifiers
            .take_any(MEMBER_IMPLEMENTATIONS)
            .and_then(|t| OperatorImplementation::from_keyword(&t.text))
            .unwrap_or_default();
        let action = match self.current() {
            Some(token) if token.kind == TokenKind::RelationalOperator => {
                OperatorAction::from_token(&token.text)
            }
            _ => None,
        };
        let Some(action) = action else {
            return Err(self.report(
                self.message(MessageKind::ExpectAppropriateType)
                    .with(ParamKey::Classifier, "operator")
                    .with(ParamKey::Options, "'==' or '<'"),
            ));
        };
        self.advance();
        self.expect_semicolon()?;
        let operator = Operator {
            action,
            implementation,
            location: self.location_of(&keyword),
            comment,
            structure: id,
        };
        self.cx
            .document
            .structure_mut(id)
            .members
            .push(Member::Operator(operator));
        Ok(())
    }

    /// `[override] [weak] type name [= default];`
    fn parse_field(
        &mut self,
        id: StructureId,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<()> {
        let overriding = modifiers.take("override");
        let weak = self.at_keyword("reference") && modifiers.take("weak").is_some();
        let location = self.here();
        let ty = self.parse_type_expression("field", Some(id), weak)?;
        let name = self.expect_name("field")?;
        let default = if self.at(TokenKind::Operator, "=") {
            self.advance();
            Some(self.parse_default("field")?)
        } else {
            None
        };
        if let (TypeResolution::Resolved(ty), Some(default)) = (&ty, &default) {
            self.check_default(*ty, default, "field")?;
        }

        let overridden = match &overriding {
            Some(token) => Some(self.overridden_field(id, token, &name.value)?),
            None => None,
        };
        self.expect_semicolon()?;

        let (bound, pending) = ty.split();
        let structure = self.cx.document.structure(id);
        let member = structure.members.len();
        let field = Field {
            name,
            location,
            comment,
            ty: bound,
            bitmask: structure.next_bitmask(),
            default,
            structure: id,
        };
        let member_node = match overridden {
            Some(overridden) => Member::FieldOverride(FieldOverride { field, overridden }),
            None => Member::Field(field),
        };
        self.cx.document.structure_mut(id).members.push(member_node);
        if let Some(pending) = pending {
            let slot = Slot::Field(FieldRef {
                structure: id,
                member,
            });
            self.defer(pending, "field", Some(id), slot);
        }
        Ok(())
    }

    fn overridden_field(
        &mut self,
        id: StructureId,
        keyword: &Token,
        name: &str,
    ) -> PResult<FieldRef> {
        let Some(base) = self.cx.document.structure(id).base else {
            return Err(self.report(
                self.message_at(MessageKind::OverrideWithoutBase, keyword)
                    .with(ParamKey::Name, name),
            ));
        };
        match self.cx.document.find_field(base, name) {
            Some(field) => Ok(field),
            None => Err(self.report(
                self.message_at(MessageKind::UnknownBaseField, keyword)
                    .with(ParamKey::Name, name),
            )),
        }
    }
}
