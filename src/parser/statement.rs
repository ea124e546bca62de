//! Source-level statements: imports, the package declaration and the
//! dispatch of top-level declarations.

use std::path::Component;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::diagnostics::{Message, MessageKind, ParamKey};
use crate::model::{Comment, Declaration, File, Import, Package, PackageElement};
use crate::syntax::{Token, TokenKind, Tokenizer};
use crate::validate::Node;

use super::modifiers::{DECLARATION_MODIFIERS, Modifiers};
use super::{Checkpoint, Fatal, PResult, Parser};

const DECLARATION_KEYWORDS: &str = "structure, interface, enum, specimen, identifier or factory";

/// How far into a source the parser has come; imports and the package
/// must precede declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Imports,
    Package,
    Declarations,
}

impl Parser<'_, '_> {
    /// Parse a whole source: `import* package? declaration*`.
    ///
    /// Fails only when an import cannot be loaded; every other problem is
    /// reported and recovered from.
    pub(crate) fn parse_document(&mut self) -> Result<(), Fatal> {
        debug!(source = %self.source_name(), main = self.main, "parsing source");
        if self.main {
            let file = File {
                location: self.location(1, 1),
                comment: None,
            };
            self.cx.document.set_main_file(self.source.clone(), file);
        }

        let mut section = Section::Imports;
        loop {
            let comment = self.leading_comment();
            let Some(token) = self.current().cloned() else {
                self.misplaced(comment);
                break;
            };

            if token.is_keyword("import") && section == Section::Imports {
                self.parse_import(comment)?;
                continue;
            }
            if token.is_keyword("package") && section < Section::Package {
                section = Section::Package;
                if self.parse_package().is_err() {
                    self.recover_top_level();
                }
                continue;
            }
            section = Section::Declarations;

            match token.kind {
                TokenKind::Delimiter if token.text == ";" => {
                    self.misplaced(comment);
                    self.tokens.shift();
                }
                TokenKind::Identifier => self.top_level_declaration(comment),
                _ => {
                    self.misplaced(comment);
                    self.skip_garbage(&token);
                }
            }
        }

        debug!(
            source = %self.source_name(),
            pending = self.pending.len(),
            "source parsed"
        );
        Ok(())
    }

    /// One diagnostic for a run of tokens that cannot start a statement.
    fn skip_garbage(&mut self, first: &Token) {
        let message = self
            .message_at(MessageKind::UnexpectedToken, first)
            .with(ParamKey::Token, first.text.clone());
        self.cx.messages.add(message);
        self.tokens.shift();
        while self
            .current()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Identifier | TokenKind::Comment))
        {
            self.tokens.shift();
        }
    }

    /// Recovery at source level also drops a stray `}`.
    fn recover_top_level(&mut self) {
        self.recover();
        while self.at(TokenKind::Bracket, "}") {
            self.tokens.shift();
        }
    }

    // ------------------------------------------------------------------
    // declarations
    // ------------------------------------------------------------------

    fn top_level_declaration(&mut self, comment: Option<Comment>) {
        let checkpoint = self.checkpoint();
        match self.parse_declaration(comment) {
            Ok(declaration) => self.complete(declaration, checkpoint),
            Err(_) => {
                self.rollback(checkpoint);
                self.recover_top_level();
            }
        }
    }

    fn parse_declaration(&mut self, comment: Option<Comment>) -> PResult<Declaration> {
        let mut modifiers = self.collect_modifiers(DECLARATION_MODIFIERS);
        let keyword = self.current().map(|t| t.text.clone()).unwrap_or_default();
        let declaration = match keyword.as_str() {
            "structure" => Declaration::Structure(self.parse_structure(comment, &mut modifiers)?),
            "interface" => Declaration::Interface(self.parse_interface(comment)?),
            "enum" => {
                Declaration::Enumeration(self.parse_enumeration(comment, &mut modifiers, None)?)
            }
            "identifier" => {
                Declaration::Identifier(self.parse_identifier(comment, &mut modifiers)?)
            }
            "specimen" => Declaration::Specimen(self.parse_specimen(comment, &mut modifiers)?),
            "factory" => Declaration::Factory(self.parse_factory(comment, &mut modifiers)?),
            _ => {
                let message = match self.current() {
                    Some(token) => self.message_at(MessageKind::UnknownStatement, token),
                    None => self.message(MessageKind::UnknownStatement),
                };
                return Err(self.report(
                    message
                        .with(ParamKey::Context, "source")
                        .with(ParamKey::Options, DECLARATION_KEYWORDS),
                ));
            }
        };
        self.report_unclaimed(modifiers);
        Ok(declaration)
    }

    /// Validate a parsed declaration and make it visible to lookup.
    /// A declaration failing validation is dropped.
    fn complete(&mut self, declaration: Declaration, checkpoint: Checkpoint) {
        if !self.validate(Node::from(declaration)) {
            debug!(name = %self.cx.document.declaration_name(declaration), "declaration rejected");
            self.rollback(checkpoint);
            return;
        }
        self.cx.document.register(declaration);
        if let Some(ty) = declaration.as_type() {
            self.resolve_registered(ty);
        }
    }

    /// Gather modifier keywords in front of a construct.
    pub(super) fn collect_modifiers(&mut self, allowed: &[&str]) -> Modifiers {
        let mut modifiers = Modifiers::default();
        while let Some(token) = self
            .current()
            .filter(|t| t.kind == TokenKind::Identifier && allowed.contains(&t.text.as_str()))
        {
            modifiers.push(token.clone());
            self.advance();
        }
        modifiers
    }

    pub(super) fn report_unclaimed(&mut self, modifiers: Modifiers) {
        for token in modifiers.into_unclaimed() {
            let message = self
                .message_at(MessageKind::UnexpectedModifier, &token)
                .with(ParamKey::Modifier, token.text.clone());
            self.cx.messages.add(message);
        }
    }

    // ------------------------------------------------------------------
    // import
    // ------------------------------------------------------------------

    /// `import "source";`
    ///
    /// The imported source is parsed right away into the same document.
    /// A source already parsed in this session (a diamond or a cycle) is
    /// not parsed again.
    fn parse_import(&mut self, comment: Option<Comment>) -> Result<(), Fatal> {
        let keyword = self.current().cloned();
        self.advance();
        let source = match self.current() {
            Some(token) if token.kind == TokenKind::StringLiteral => token.clone(),
            _ => {
                let message = self.message(MessageKind::ExpectImportSource);
                self.cx.messages.add(message);
                self.recover_top_level();
                return Ok(());
            }
        };
        self.advance();
        if self.expect_semicolon().is_err() {
            self.recover_top_level();
            return Ok(());
        }

        let location = match &keyword {
            Some(token) => self.location_of(token),
            None => self.here(),
        };
        let mut import = Import {
            source: source.value(),
            location: location.clone(),
            comment,
            resolved: None,
        };

        let Some(provider) = self.cx.provider else {
            self.cx
                .messages
                .add(Message::new(MessageKind::ImportWithoutSourceProvider, location));
            self.cx.document.add_import(import);
            return Ok(());
        };

        let Some(id) = provider.resolve(self.source.as_ref(), &import.source) else {
            let message = Message::new(MessageKind::SourceNotFound, location)
                .with(ParamKey::Source, import.source.clone());
            self.cx.messages.add(message);
            self.cx.document.add_import(import);
            return Err(Fatal);
        };
        let id = id.with_parent(self.source.clone());

        if let Some(existing) = self.cx.sources.get(id.value()).cloned() {
            if self
                .source
                .as_ref()
                .is_some_and(|s| s.is_on_chain(id.value()))
            {
                debug!(source = %id.value(), "cyclic import skipped");
            } else {
                debug!(source = %id.value(), "import already parsed");
            }
            import.resolved = Some(existing);
            self.cx.document.add_import(import);
            return Ok(());
        }

        let limit = self.cx.max_import_depth;
        if id.depth() > limit {
            warn!(source = %id.value(), limit, "import depth exceeded");
            let message = Message::new(MessageKind::ImportDepthExceeded, location)
                .with(ParamKey::Source, import.source.clone())
                .with(ParamKey::Depth, limit.to_string());
            self.cx.messages.add(message);
            return Err(Fatal);
        }

        let text = match provider.open(&id) {
            Ok(text) => text,
            Err(error) => {
                debug!(source = %id.value(), %error, "cannot open import");
                let message = Message::new(MessageKind::OpenSourceFailed, location)
                    .with(ParamKey::Source, import.source.clone());
                self.cx.messages.add(message);
                self.cx.document.add_import(import);
                return Err(Fatal);
            }
        };

        let id = self.cx.sources.register(id);
        import.resolved = Some(id.clone());
        self.cx.document.add_import(import);

        let mut child = Parser::new(&mut *self.cx, Tokenizer::new(&text), Some(id), false);
        let result = child.parse_document();
        let leftovers = std::mem::take(&mut child.pending);
        self.pending.extend(leftovers);
        result?;
        self.rescan_pending(false);
        Ok(())
    }

    // ------------------------------------------------------------------
    // package
    // ------------------------------------------------------------------

    /// `package short.path [| levels.path];`
    fn parse_package(&mut self) -> PResult<()> {
        let keyword = self.expect_keyword("package")?;
        let short = self.parse_package_path()?;
        let levels = if self.at(TokenKind::BitwiseOperator, "|") {
            self.advance();
            self.parse_package_path()?
        } else {
            short.clone()
        };
        self.expect_semicolon()?;

        let package = Arc::new(Package {
            short,
            levels,
            location: self.location_of(&keyword),
        });
        debug!(package = %package, "package declared");
        if self.main {
            self.cx.document.set_package(Arc::clone(&package));
        }
        self.package = Some(package);
        Ok(())
    }

    /// Dotted elements; `*` takes the directory at that position of the
    /// path the source was imported by.
    fn parse_package_path(&mut self) -> PResult<Vec<PackageElement>> {
        let mut elements = Vec::new();
        loop {
            let token = match self.current() {
                Some(token)
                    if matches!(token.kind, TokenKind::Identifier | TokenKind::Asterisk) =>
                {
                    token.clone()
                }
                _ => return Err(self.report(self.message(MessageKind::ExpectPackageElement))),
            };
            let location = self.location_of(&token);
            let element = if token.kind == TokenKind::Asterisk {
                let position = elements.len();
                let Some(value) = self.inherited_package_element(position) else {
                    return Err(self.report(
                        self.message_at(MessageKind::UnresolvedPackageElement, &token)
                            .with(ParamKey::Position, (position + 1).to_string()),
                    ));
                };
                PackageElement {
                    value,
                    location,
                    inherited: true,
                }
            } else {
                PackageElement {
                    value: token.text.clone(),
                    location,
                    inherited: false,
                }
            };
            elements.push(element);
            self.advance();
            if !self.at(TokenKind::Dot, ".") {
                return Ok(elements);
            }
            self.advance();
        }
    }

    /// Directory `position` of the current source, counted from the
    /// directory of the root source.
    fn inherited_package_element(&self, position: usize) -> Option<SmolStr> {
        let source = self.source.as_ref()?;
        let relative = source.relative_to_root();
        relative
            .parent()?
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .nth(position)
            .map(SmolStr::new)
    }
}
