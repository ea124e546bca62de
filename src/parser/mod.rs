//! Recursive-descent parser building a [`Document`] from IDL text.
//!
//! ## Overview
//!
//! A [`ParseSession`] parses one root source together with everything it
//! imports into a single document. Each source gets its own `Parser`
//! over its own token stream; all of them share one `Context` holding the
//! document, the diagnostics and the registry of parsed sources.
//!
//! ```text
//! ParseSession::parse_source
//!   └── Parser (root)     imports → package → declarations
//!         └── Parser (import, depth + 1) ...
//!   └── finish            unresolved types, document validation
//! ```
//!
//! ## Error handling
//!
//! Grammar routines return `Result<T, Reported>`: the error marker means a
//! diagnostic was already recorded. The caller discards what the failed
//! construct added to the document, skips to a synchronization point and
//! carries on. Problems loading an import are fatal and stop the whole
//! parse.
//!
//! ## Late type resolution
//!
//! Type names may be used before they are declared. An unresolved name is
//! parked as a pending binding and filled in when a matching type gets
//! registered; see the `late` module.

mod declarations;
mod enumeration;
mod late;
mod modifiers;
mod statement;
mod structure;
mod types;

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, info};

use crate::base::{Location, SourceId, SourceRegistry};
use crate::diagnostics::{Message, MessageCollector, MessageKind, ParamKey, Severity};
use crate::model::{self, Comment, Document, Name, Package};
use crate::project::SourceProvider;
use crate::syntax::{Token, TokenKind, Tokenizer};
use crate::validate::{Node, Validators};

use late::LateBinding;

/// Import nesting allowed before a parse is aborted.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 64;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Knobs of a parse session.
#[derive(Debug)]
pub struct ParseOptions {
    pub max_import_depth: usize,
    pub validators: Validators,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            validators: Validators::standard(),
        }
    }
}

impl ParseOptions {
    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }
}

/// Result of parsing a root source.
///
/// The document is returned even when parsing failed; it then holds
/// whatever declarations survived error recovery.
#[derive(Debug)]
pub struct Parse {
    pub document: Document,
    pub messages: Vec<Message>,
    ok: bool,
}

impl Parse {
    /// `true` when no error was reported and no import failed.
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.severity() == Severity::Warning)
    }

    /// Highest severity reported, `None` for a clean parse.
    pub fn severity(&self) -> Option<Severity> {
        self.messages.iter().map(Message::severity).max()
    }
}

/// Parses a root source and its imports.
///
/// Without a provider, `import` statements are skipped with a warning.
#[derive(Default)]
pub struct ParseSession<'p> {
    provider: Option<&'p dyn SourceProvider>,
    options: ParseOptions,
}

impl fmt::Debug for ParseSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseSession")
            .field("provider", &self.provider.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl<'p> ParseSession<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_provider(mut self, provider: &'p dyn SourceProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Open `root` through the provider and parse it.
    pub fn parse_source(self, root: SourceId) -> Parse {
        let opened = match self.provider {
            Some(provider) => provider.open(&root).map_err(|error| {
                debug!(source = %root.value(), %error, "cannot open root source");
            }),
            None => Err(()),
        };
        match opened {
            Ok(text) => self.parse_text(Some(root), &text),
            Err(()) => {
                let location = Location::new(Some(Arc::new(root.clone())), 1, 1);
                let message = Message::new(MessageKind::OpenSourceFailed, location)
                    .with(ParamKey::Source, root.original());
                Parse {
                    document: Document::new(),
                    messages: vec![message],
                    ok: false,
                }
            }
        }
    }

    /// Parse `text` as the root source identified by `root`.
    pub fn parse_text(self, root: Option<SourceId>, text: &str) -> Parse {
        let mut cx = Context {
            provider: self.provider,
            document: Document::new(),
            messages: MessageCollector::new(),
            sources: SourceRegistry::new(),
            validators: self.options.validators,
            max_import_depth: self.options.max_import_depth,
        };
        let source = root.map(|root| cx.sources.register(root));

        let ok = {
            let mut parser = Parser::new(&mut cx, Tokenizer::new(text), source, true);
            parser.parse_document().is_ok() && parser.finish()
        };

        info!(
            name = cx.document.name().unwrap_or("<text>"),
            declarations = cx.document.declarations().len(),
            sources = cx.sources.len(),
            errors = cx.messages.error_count(),
            warnings = cx.messages.warning_count(),
            ok,
            "parsed document"
        );
        Parse {
            document: cx.document,
            messages: cx.messages.into_vec(),
            ok,
        }
    }
}

/// Parse a standalone text without imports.
pub fn parse_str(text: &str) -> Parse {
    ParseSession::new().parse_text(None, text)
}

// ============================================================================
// PARSER STATE
// ============================================================================

/// Marker: the failure was already reported, recover and continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reported;

/// Marker: an import could not be loaded, the parse stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fatal;

pub(crate) type PResult<T> = Result<T, Reported>;

/// State shared by the parsers of one session.
pub(crate) struct Context<'p> {
    pub(crate) provider: Option<&'p dyn SourceProvider>,
    pub(crate) document: Document,
    pub(crate) messages: MessageCollector,
    pub(crate) sources: SourceRegistry,
    pub(crate) validators: Validators,
    pub(crate) max_import_depth: usize,
}

/// Where to roll back to when a construct fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    document: model::Checkpoint,
    pending: usize,
}

/// Parser of one source.
pub(crate) struct Parser<'c, 'p> {
    cx: &'c mut Context<'p>,
    tokens: Tokenizer,
    source: Option<Arc<SourceId>>,
    package: Option<Arc<Package>>,
    pending: Vec<LateBinding>,
    main: bool,
}

impl<'c, 'p> Parser<'c, 'p> {
    pub(crate) fn new(
        cx: &'c mut Context<'p>,
        tokens: Tokenizer,
        source: Option<Arc<SourceId>>,
        main: bool,
    ) -> Self {
        Self {
            cx,
            tokens,
            source,
            package: None,
            pending: Vec::new(),
            main,
        }
    }

    /// Steps run once the root source and all its imports are parsed.
    ///
    /// Returns `false` if the parse as a whole failed.
    pub(crate) fn finish(&mut self) -> bool {
        self.rescan_pending(true);
        self.report_unresolved();
        if self.cx.messages.exceeds_warning() {
            return false;
        }
        self.cx
            .validators
            .validate(Node::Document, &self.cx.document, &mut self.cx.messages)
    }

    // ------------------------------------------------------------------
    // locations and messages
    // ------------------------------------------------------------------

    fn location(&self, line: u32, column: u32) -> Location {
        Location::new(self.source.clone(), line, column)
    }

    /// Location of the current token, or just past the input at the end.
    fn here(&self) -> Location {
        let (line, column) = self.tokens.position();
        self.location(line, column)
    }

    fn location_of(&self, token: &Token) -> Location {
        self.location(token.line, token.start_column)
    }

    fn name_of(&self, token: &Token) -> Name {
        Name::new(token.text.clone(), self.location_of(token))
    }

    /// A message at the current position.
    fn message(&self, kind: MessageKind) -> Message {
        Message::new(kind, self.here())
    }

    fn message_at(&self, kind: MessageKind, token: &Token) -> Message {
        Message::new(kind, self.location_of(token))
    }

    fn report(&mut self, message: Message) -> Reported {
        self.cx.messages.add(message);
        Reported
    }

    /// Error at the current token, or an end-of-input error in `statement`.
    fn unexpected(&mut self, statement: &str) -> Reported {
        let message = match self.tokens.current() {
            Some(token) => self
                .message_at(MessageKind::UnexpectedToken, token)
                .with(ParamKey::Token, token.text.clone()),
            None => self
                .message(MessageKind::UnexpectedEndOfInput)
                .with(ParamKey::Statement, statement),
        };
        self.report(message)
    }

    // ------------------------------------------------------------------
    // token cursor
    // ------------------------------------------------------------------

    fn current(&self) -> Option<&Token> {
        self.tokens.current()
    }

    fn at(&self, kind: TokenKind, text: &str) -> bool {
        self.tokens.check_text(kind, text)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.tokens.check_text(TokenKind::Identifier, keyword)
    }

    /// Move past the current token and any comments after it.
    fn advance(&mut self) {
        self.tokens.shift();
        self.tokens.skip_comments();
    }

    fn expect_keyword(&mut self, keyword: &str) -> PResult<Token> {
        match self.current() {
            Some(token) if token.is_keyword(keyword) => {
                let token = token.clone();
                self.advance();
                Ok(token)
            }
            _ => Err(self.report(
                self.message(MessageKind::ExpectKeyword)
                    .with(ParamKey::Keyword, keyword),
            )),
        }
    }

    fn expect_token(&mut self, kind: TokenKind, text: &str) -> PResult<Token> {
        match self.current() {
            Some(token) if token.is(kind, text) => {
                let token = token.clone();
                self.advance();
                Ok(token)
            }
            _ => {
                let message = self.message(MessageKind::ExpectToken).with(ParamKey::Token, text);
                Err(self.report(message))
            }
        }
    }

    /// Name of the construct being parsed.
    fn expect_name(&mut self, statement: &str) -> PResult<Name> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let name = self.name_of(token);
                self.advance();
                Ok(name)
            }
            _ => Err(self.report(
                self.message(MessageKind::ExpectStatementName)
                    .with(ParamKey::Statement, statement),
            )),
        }
    }

    /// Statement terminator. Leaves comments after it for the next
    /// statement to pick up.
    fn expect_semicolon(&mut self) -> PResult<()> {
        if self.at(TokenKind::Delimiter, ";") {
            self.tokens.shift();
            Ok(())
        } else {
            Err(self.report(self.message(MessageKind::ExpectSemicolon)))
        }
    }

    fn open_body(&mut self, statement: &str) -> PResult<()> {
        if self.at(TokenKind::Bracket, "{") {
            self.tokens.shift();
            Ok(())
        } else {
            Err(self.report(
                self.message(MessageKind::ExpectStatementBody)
                    .with(ParamKey::Statement, statement),
            ))
        }
    }

    /// Start of the next body item: its leading comment and first token.
    ///
    /// Returns `Ok(None)` after consuming the closing `}`. A comment right
    /// before the `}` belongs to nothing and is warned about.
    fn body_item(&mut self, statement: &str) -> PResult<Option<(Option<Comment>, Token)>> {
        loop {
            let comment = self.leading_comment();
            let Some(token) = self.current().cloned() else {
                return Err(self.report(
                    self.message(MessageKind::UnexpectedEndOfInput)
                        .with(ParamKey::Statement, statement),
                ));
            };
            if token.is(TokenKind::Bracket, "}") {
                self.misplaced(comment);
                self.tokens.shift();
                return Ok(None);
            }
            if token.is(TokenKind::Delimiter, ";") {
                self.misplaced(comment);
                self.tokens.shift();
                continue;
            }
            return Ok(Some((comment, token)));
        }
    }

    /// A body that must stay empty: `{ }`.
    fn empty_body(&mut self, statement: &str) -> PResult<()> {
        self.open_body(statement)?;
        let comment = self.leading_comment();
        if self.at(TokenKind::Bracket, "}") {
            self.misplaced(comment);
            self.tokens.shift();
            Ok(())
        } else {
            Err(self.report(self.message(MessageKind::ExpectToken).with(ParamKey::Token, "}")))
        }
    }

    // ------------------------------------------------------------------
    // comments
    // ------------------------------------------------------------------

    /// Collect the comments in front of the next construct.
    fn leading_comment(&mut self) -> Option<Comment> {
        let mut comment: Option<Comment> = None;
        while let Some(token) = self.current().filter(|t| t.kind == TokenKind::Comment) {
            let token = token.clone();
            let lines = token.comment_lines();
            match comment.as_mut() {
                Some(comment) => comment.lines.extend(lines),
                None => {
                    comment = Some(Comment {
                        lines,
                        location: self.location_of(&token),
                    })
                }
            }
            self.tokens.shift();
        }
        comment
    }

    fn misplaced(&mut self, comment: Option<Comment>) {
        if let Some(comment) = comment {
            self.cx
                .messages
                .add(Message::new(MessageKind::MisplacedComment, comment.location));
        }
    }

    // ------------------------------------------------------------------
    // recovery
    // ------------------------------------------------------------------

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            document: self.cx.document.checkpoint(),
            pending: self.pending.len(),
        }
    }

    /// Forget everything a failed construct added.
    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.cx.document.rollback(checkpoint.document);
        self.pending.truncate(checkpoint.pending);
    }

    /// Run `parse`, rolling back its additions if it fails.
    fn attempt<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let checkpoint = self.checkpoint();
        let result = parse(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    /// Skip to the next synchronization point after an error.
    ///
    /// Stops after a `;` or after a `{ ... }` block opened while skipping,
    /// or before a `}` closing the enclosing body.
    fn recover(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.current() {
            match (token.kind, token.text.as_str()) {
                (TokenKind::Delimiter, ";") if depth == 0 => {
                    self.tokens.shift();
                    return;
                }
                (TokenKind::Bracket, "{") => depth += 1,
                (TokenKind::Bracket, "}") => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.tokens.shift();
                        return;
                    }
                }
                _ => {}
            }
            self.tokens.shift();
        }
    }

    // ------------------------------------------------------------------
    // validation
    // ------------------------------------------------------------------

    fn validate(&mut self, node: Node) -> bool {
        self.cx
            .validators
            .validate(node, &self.cx.document, &mut self.cx.messages)
    }

    /// A type used by `node` was bound after `node` passed validation:
    /// run the checks that depend on it again. A declaration that fails is
    /// withdrawn from lookup; a nested enumeration is only reported.
    fn revalidate(&mut self, node: Node) {
        let document = &self.cx.document;
        let declaration = node.declaration();
        let validated = match (node, declaration) {
            (_, Some(declaration)) if document.is_registered(declaration) => true,
            (Node::Enumeration(id), _) => document.enumeration(id).structure.is_some_and(|owner| {
                document
                    .structure(owner)
                    .nested_enumerations()
                    .any(|nested| nested == id)
            }),
            _ => false,
        };
        if !validated {
            return;
        }
        let ok = self
            .cx
            .validators
            .validate_late_types(node, &self.cx.document, &mut self.cx.messages);
        if let (false, Some(declaration)) = (ok, declaration) {
            if self.cx.document.is_registered(declaration) {
                let name = &self.cx.document.declaration_name(declaration).value;
                debug!(name = %name, "declaration withdrawn");
                self.cx.document.unregister(declaration);
            }
        }
    }

    fn source_name(&self) -> SmolStr {
        self.source
            .as_ref()
            .map_or_else(|| SmolStr::new_static("<text>"), |s| SmolStr::new(s.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Builtin, TypeRef};

    #[test]
    fn test_empty_input_is_ok() {
        let parse = parse_str("");
        assert!(parse.ok());
        assert!(parse.messages.is_empty());
        assert!(parse.document.declarations().is_empty());
    }

    #[test]
    fn test_comment_only_input_warns() {
        let parse = parse_str("// nothing to see");
        assert!(parse.ok());
        assert_eq!(parse.severity(), Some(Severity::Warning));
        assert_eq!(parse.messages[0].kind(), MessageKind::MisplacedComment);
    }

    #[test]
    fn test_leading_comment_attaches_to_declaration() {
        let parse = parse_str("// a point\n/* in space */\nstructure Point { integer x; }");
        assert!(parse.ok(), "{:?}", parse.messages);
        let id = parse.document.find_structure("Point").expect("Point");
        let comment = parse.document.structure(id).comment.clone().expect("comment");
        assert_eq!(comment.lines, vec!["a point", "in space"]);
        assert_eq!(comment.location.line, 1);
    }

    #[test]
    fn test_recovery_continues_with_next_declaration() {
        let parse = parse_str("structure { integer x; }\nstructure B { integer y; }");
        assert!(!parse.ok());
        assert_eq!(parse.errors().count(), 1);
        let b = parse.document.find_structure("B").expect("B survives");
        let (_, field) = parse.document.structure(b).fields().next().expect("y");
        assert_eq!(field.ty, Some(TypeRef::Builtin(Builtin::Integer)));
    }

    #[test]
    fn test_stray_semicolons_are_ignored() {
        let parse = parse_str(";; structure A { ; integer x; ; } ;");
        assert!(parse.ok(), "{:?}", parse.messages);
    }

    #[test]
    fn test_unexpected_token_reported_once_per_run() {
        let parse = parse_str("} ) ] 12 structure A {}");
        let errors: Vec<_> = parse.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), MessageKind::UnexpectedToken);
        assert!(parse.document.find_structure("A").is_some());
    }
}
