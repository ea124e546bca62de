//! Identifiers, specimens, factories and interfaces.

use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{
    Builtin, Comment, Direction, Factory, FactoryId, FactoryType, Filter, Identifier,
    IdentifierId, Interface, InterfaceId, Method, Parameter, Specimen, SpecimenId, TypeRef,
};
use crate::syntax::{Token, TokenKind};

use super::enumeration::cast_of;
use super::late::Slot;
use super::modifiers::Modifiers;
use super::types::TypeResolution;
use super::{PResult, Parser, Reported};

const FACTORY_TYPES: &[&str] = &["hierarchy", "object", "plugin"];

impl Parser<'_, '_> {
    /// `[strong|weak] identifier [<T>] Name { }`
    pub(super) fn parse_identifier(
        &mut self,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<IdentifierId> {
        let keyword = self.expect_keyword("identifier")?;
        let cast = cast_of(modifiers);
        let parameter = self
            .parse_type_parameter("identifier parameter", None)?
            .unwrap_or(TypeResolution::Resolved(TypeRef::Builtin(Builtin::Integer)));
        let name = self.expect_name("identifier")?;
        self.empty_body("identifier")?;

        let (bound, pending) = parameter.split();
        let id = self.cx.document.insert_identifier(Identifier {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            parameter: bound,
            cast,
        });
        if let Some(pending) = pending {
            self.defer(pending, "identifier parameter", None, Slot::IdentifierParameter(id));
        }
        Ok(id)
    }

    /// `[strong|weak] specimen [<T>] Name [inherit Base] { }`
    ///
    /// Without an explicit parameter a specimen takes its base's, or
    /// `string`.
    pub(super) fn parse_specimen(
        &mut self,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<SpecimenId> {
        let keyword = self.expect_keyword("specimen")?;
        let cast = cast_of(modifiers);
        let parameter = self.parse_type_parameter("specimen parameter", None)?;
        let name = self.expect_name("specimen")?;

        let base = if self.at_keyword("inherit") {
            self.advance();
            let (base_name, ty) = self.resolve_now("base", None)?;
            let TypeRef::Specimen(base) = ty else {
                return Err(self.report(
                    self.message_at(MessageKind::ExpectAppropriateType, &base_name.first)
                        .with(ParamKey::Classifier, "base")
                        .with(ParamKey::Options, "specimen"),
                ));
            };
            Some(base)
        } else {
            None
        };
        self.empty_body("specimen")?;

        let (bound, pending) = match parameter {
            Some(parameter) => parameter.split(),
            None => {
                let inherited = base.and_then(|b| self.cx.document.specimen(b).parameter);
                (Some(inherited.unwrap_or(TypeRef::Builtin(Builtin::String))), None)
            }
        };
        let id = self.cx.document.insert_specimen(Specimen {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            parameter: bound,
            base,
            cast,
        });
        if let Some(pending) = pending {
            self.defer(pending, "specimen parameter", None, Slot::SpecimenParameter(id));
        }
        Ok(id)
    }

    /// `[function] hierarchy|object|plugin factory <T> Name { filter field with method; }`
    pub(super) fn parse_factory(
        &mut self,
        comment: Option<Comment>,
        modifiers: &mut Modifiers,
    ) -> PResult<FactoryId> {
        let keyword = self.expect_keyword("factory")?;
        let Some(factory_type) = modifiers
            .take_any(FACTORY_TYPES)
            .and_then(|t| FactoryType::from_keyword(&t.text))
        else {
            return Err(self.report(
                self.message_at(MessageKind::ExpectAppropriateType, &keyword)
                    .with(ParamKey::Classifier, "factory")
                    .with(ParamKey::Options, "hierarchy, object or plugin"),
            ));
        };
        let function = match modifiers.take("function") {
            Some(token) if factory_type != FactoryType::Object => {
                let message = self.message_at(MessageKind::FunctionInNonObjectFactory, &token);
                return Err(self.report(message));
            }
            Some(_) => true,
            None => false,
        };
        let Some(parameter) = self.parse_type_parameter("factory parameter", None)? else {
            let message = self.message(MessageKind::ExpectToken).with(ParamKey::Token, "<");
            return Err(self.report(message));
        };
        let name = self.expect_name("factory")?;

        let (bound, pending) = parameter.split();
        let id = self.cx.document.insert_factory(Factory {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            factory_type,
            function,
            parameter: bound,
            filters: Vec::new(),
        });
        if let Some(pending) = pending {
            self.defer(pending, "factory parameter", None, Slot::FactoryParameter(id));
        }

        self.open_body("factory")?;
        while let Some((comment, token)) = self.body_item("factory")? {
            let parsed = if token.is_keyword("filter") {
                self.attempt(|p| p.parse_filter(id, comment, &token))
            } else {
                Err(self.unknown_statement(&token, "factory", "filter"))
            };
            if parsed.is_err() {
                self.recover();
            }
        }
        Ok(id)
    }

    /// `filter field with method;`
    fn parse_filter(
        &mut self,
        id: FactoryId,
        comment: Option<Comment>,
        keyword: &Token,
    ) -> PResult<()> {
        self.expect_keyword("filter")?;
        let factory = self.cx.document.factory(id);
        let (factory_type, parameter) = (factory.factory_type, factory.parameter);
        if factory_type != FactoryType::Object {
            let message = self.message_at(MessageKind::FilterInNonObjectFactory, keyword);
            return Err(self.report(message));
        }
        let Some(TypeRef::Structure(structure)) = parameter else {
            return Err(self.report(
                self.message_at(MessageKind::FilterInFactoryForNonStructure, keyword),
            ));
        };
        let field_name = self.expect_name("filter field")?;
        let Some(field) = self.cx.document.find_field(structure, &field_name.value) else {
            let message = Message::new(MessageKind::UnknownField, field_name.location.clone())
                .with(ParamKey::Name, field_name.value.clone())
                .with(ParamKey::Type, self.cx.document.structure(structure).name.value.clone());
            return Err(self.report(message));
        };
        self.expect_keyword("with")?;
        let method = self.expect_name("filter method")?;
        self.expect_semicolon()?;
        let filter = Filter {
            field,
            method,
            location: self.location_of(keyword),
            comment,
        };
        self.cx.document.factory_mut(id).filters.push(filter);
        Ok(())
    }

    /// `interface Name { method name { -->|<--|<-> type name; } }`
    pub(super) fn parse_interface(&mut self, comment: Option<Comment>) -> PResult<InterfaceId> {
        let keyword = self.expect_keyword("interface")?;
        let name = self.expect_name("interface")?;
        let id = self.cx.document.insert_interface(Interface {
            name,
            location: self.location_of(&keyword),
            comment,
            package: self.package.clone(),
            methods: Vec::new(),
        });

        self.open_body("interface")?;
        while let Some((comment, token)) = self.body_item("interface")? {
            let parsed = if token.is_keyword("method") {
                self.attempt(|p| p.parse_method(id, comment))
            } else {
                Err(self.unknown_statement(&token, "interface", "method"))
            };
            if parsed.is_err() {
                self.recover();
            }
        }
        Ok(id)
    }

    fn parse_method(&mut self, id: InterfaceId, comment: Option<Comment>) -> PResult<()> {
        let keyword = self.expect_keyword("method")?;
        let name = self.expect_name("method")?;
        self.open_body("method")?;
        let location = self.location_of(&keyword);
        let methods = &mut self.cx.document.interface_mut(id).methods;
        let method = methods.len();
        methods.push(Method {
            name,
            location,
            comment,
            parameters: Vec::new(),
        });

        while let Some((comment, token)) = self.body_item("method")? {
            let parsed = if token.kind == TokenKind::ArrowOperator {
                self.attempt(|p| p.parse_parameter(id, method, comment, &token))
            } else {
                Err(self.unknown_statement(&token, "method", "-->, <-- or <->"))
            };
            if parsed.is_err() {
                self.recover();
            }
        }
        Ok(())
    }

    /// `direction type name;`
    fn parse_parameter(
        &mut self,
        id: InterfaceId,
        method: usize,
        comment: Option<Comment>,
        arrow: &Token,
    ) -> PResult<()> {
        let direction = Direction::from_arrow(&arrow.text).unwrap_or(Direction::In);
        self.advance();
        let ty = self.parse_type_expression("parameter", None, false)?;
        let name = self.expect_name("parameter")?;
        self.expect_semicolon()?;

        let (bound, pending) = ty.split();
        let location = self.location_of(arrow);
        let Some(parameters) = self
            .cx
            .document
            .interface_mut(id)
            .methods
            .get_mut(method)
            .map(|m| &mut m.parameters)
        else {
            return Ok(());
        };
        let parameter = parameters.len();
        parameters.push(Parameter {
            name,
            location,
            comment,
            direction,
            ty: bound,
        });
        if let Some(pending) = pending {
            let slot = Slot::MethodParameter {
                interface: id,
                method,
                parameter,
            };
            self.defer(pending, "parameter", None, slot);
        }
        Ok(())
    }

    fn unknown_statement(&mut self, token: &Token, context: &str, options: &str) -> Reported {
        self.report(
            self.message_at(MessageKind::UnknownStatement, token)
                .with(ParamKey::Context, context)
                .with(ParamKey::Options, options),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cast, Declaration};
    use crate::parser::parse_str;

    #[test]
    fn test_identifier_defaults_to_integer() {
        let parse = parse_str("identifier Key { } identifier<qword> Wide { }");
        assert!(parse.ok(), "{:?}", parse.messages);
        let document = &parse.document;
        let parameters: Vec<_> = document
            .declarations()
            .iter()
            .filter_map(|d| match d {
                Declaration::Identifier(id) => document.identifier(*id).parameter,
                _ => None,
            })
            .collect();
        assert_eq!(
            parameters,
            vec![TypeRef::Builtin(Builtin::Integer), TypeRef::Builtin(Builtin::Qword)]
        );
    }

    #[test]
    fn test_identifier_body_must_be_empty() {
        let parse = parse_str("identifier Key { integer x; }");
        assert_eq!(parse.errors().count(), 1);
        assert!(parse.document.declarations().is_empty());
    }

    #[test]
    fn test_specimen_inherits_parameter() {
        let parse = parse_str("specimen<integer> Age { } strong specimen Adult inherit Age { } specimen Text { }");
        assert!(parse.ok(), "{:?}", parse.messages);
        let document = &parse.document;
        let specimens: Vec<_> = document
            .declarations()
            .iter()
            .filter_map(|d| match d {
                Declaration::Specimen(id) => Some(document.specimen(*id)),
                _ => None,
            })
            .collect();
        assert_eq!(specimens[1].parameter, Some(TypeRef::Builtin(Builtin::Integer)));
        assert!(specimens[1].base.is_some());
        assert_eq!(specimens[1].cast, Cast::Strong);
        assert_eq!(specimens[2].parameter, Some(TypeRef::Builtin(Builtin::String)));
    }

    #[test]
    fn test_factory_requires_a_type() {
        let parse = parse_str("factory<integer> F { }");
        let errors: Vec<_> = parse.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), MessageKind::ExpectAppropriateType);
        assert_eq!(errors[0].param(ParamKey::Classifier), Some("factory"));
    }

    #[test]
    fn test_function_only_in_object_factory() {
        let parse = parse_str("structure S { } function plugin factory<S> F { }");
        let errors: Vec<_> = parse.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), MessageKind::FunctionInNonObjectFactory);
    }

    #[test]
    fn test_filters() {
        let parse = parse_str(
            "structure S { integer id; string name; }
             function object factory<S> Make { filter id with byId; }
             hierarchy factory<S> Tree { filter id with byId; }
             object factory<S> Bad { filter missing with none; }",
        );
        let kinds: Vec<_> = parse.errors().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![MessageKind::FilterInNonObjectFactory, MessageKind::UnknownField]
        );
        let make = parse.document.factories().next().expect("Make");
        let factory = parse.document.factory(make);
        assert!(factory.function);
        assert_eq!(factory.filters.len(), 1);
        assert_eq!(factory.filters[0].method, "byId");
    }

    #[test]
    fn test_interface_methods_and_parameters() {
        let parse = parse_str(
            "interface Shop {
                method buy { --> Item item; <-- integer price; <-> vector<Item> cart; }
                method close { }
             }
             structure Item { }",
        );
        assert!(parse.ok(), "{:?}", parse.messages);
        let document = &parse.document;
        let shop = document.interfaces().next().expect("Shop");
        let interface = document.interface(shop);
        let buy = interface.method("buy").expect("buy");
        let directions: Vec<_> = buy.parameters.iter().map(|p| p.direction).collect();
        assert_eq!(directions, vec![Direction::In, Direction::Out, Direction::InOut]);
        let item = document.find_structure("Item").expect("Item");
        assert_eq!(buy.parameters[0].ty, Some(TypeRef::Structure(item)));
        let cart = buy.parameters[2].ty.expect("cart bound");
        assert_eq!(document.type_name(cart).as_str(), "vector<Item>");
        assert!(interface.method("close").is_some_and(|m| m.parameters.is_empty()));
    }

    #[test]
    fn test_unknown_interface_statement() {
        let parse = parse_str("interface I { function f; method m { } }");
        let errors: Vec<_> = parse.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), MessageKind::UnknownStatement);
        assert_eq!(errors[0].param(ParamKey::Context), Some("interface"));
        let id = parse.document.interfaces().next().expect("I");
        assert!(parse.document.interface(id).method("m").is_some());
    }
}
