//! Diagnostics: located messages produced while parsing and validating.
//!
//! Problems in IDL sources are data, not Rust errors. Every grammar routine
//! and validator reports through a [`MessageCollector`], which keeps
//! messages in emission order and answers the aggregate-severity question
//! the parser uses to decide whether a run succeeded.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::{Location, SourceId};

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity of a message. Ordered: `Warning < Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

// ============================================================================
// MESSAGE KINDS
// ============================================================================

/// Named substitution parameter of a message template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Statement,
    Classifier,
    Type,
    Options,
    Context,
    Keyword,
    Modifier,
    Name,
    Token,
    Source,
    Depth,
    Position,
}

impl ParamKey {
    const ALL: [ParamKey; 12] = [
        ParamKey::Statement,
        ParamKey::Classifier,
        ParamKey::Type,
        ParamKey::Options,
        ParamKey::Context,
        ParamKey::Keyword,
        ParamKey::Modifier,
        ParamKey::Name,
        ParamKey::Token,
        ParamKey::Source,
        ParamKey::Depth,
        ParamKey::Position,
    ];

    fn placeholder(self) -> &'static str {
        match self {
            ParamKey::Statement => "{statement}",
            ParamKey::Classifier => "{classifier}",
            ParamKey::Type => "{type}",
            ParamKey::Options => "{options}",
            ParamKey::Context => "{context}",
            ParamKey::Keyword => "{keyword}",
            ParamKey::Modifier => "{modifier}",
            ParamKey::Name => "{name}",
            ParamKey::Token => "{token}",
            ParamKey::Source => "{source}",
            ParamKey::Depth => "{depth}",
            ParamKey::Position => "{position}",
        }
    }
}

/// What went wrong. Each kind has a stable code, a default severity and a
/// text template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    // syntactic
    ExpectImportSource,
    ExpectSemicolon,
    ExpectStatementName,
    ExpectStatementBody,
    UnexpectedEndOfInput,
    ExpectKeyword,
    ExpectToken,
    ExpectType,
    ExpectValue,
    UnexpectedToken,
    UnknownStatement,
    ExpectPackageElement,

    // semantic
    UnknownClassifierType,
    ExpectAppropriateType,
    UnexpectedModifier,
    UnknownBaseField,
    OverrideWithoutBase,
    UnknownEnumerationValue,
    FilterInNonObjectFactory,
    FilterInFactoryForNonStructure,
    FunctionInNonObjectFactory,
    UpcopyFromNonAncestor,
    UnresolvedPackageElement,
    SourceNotFound,
    OpenSourceFailed,
    ImportDepthExceeded,
    UnknownField,

    // validators
    InvalidParameterType,
    DuplicateField,
    FieldShadowsBase,
    DuplicateIdentification,
    DuplicateOperator,
    NonSharableField,
    NonSharableDerived,
    DuplicateEnumerationValue,
    DuplicateDeclaration,

    // warnings
    ImportWithoutSourceProvider,
    MisplacedComment,
    ComposedValueInNonFlags,
}

impl MessageKind {
    pub fn code(self) -> &'static str {
        match self {
            MessageKind::ExpectImportSource => "P001",
            MessageKind::ExpectSemicolon => "P002",
            MessageKind::ExpectStatementName => "P003",
            MessageKind::ExpectStatementBody => "P004",
            MessageKind::UnexpectedEndOfInput => "P005",
            MessageKind::ExpectKeyword => "P006",
            MessageKind::ExpectToken => "P007",
            MessageKind::ExpectType => "P008",
            MessageKind::ExpectValue => "P009",
            MessageKind::UnexpectedToken => "P010",
            MessageKind::UnknownStatement => "P011",
            MessageKind::ExpectPackageElement => "P012",
            MessageKind::UnknownClassifierType => "S001",
            MessageKind::ExpectAppropriateType => "S002",
            MessageKind::UnexpectedModifier => "S003",
            MessageKind::UnknownBaseField => "S004",
            MessageKind::OverrideWithoutBase => "S005",
            MessageKind::UnknownEnumerationValue => "S006",
            MessageKind::FilterInNonObjectFactory => "S007",
            MessageKind::FilterInFactoryForNonStructure => "S008",
            MessageKind::FunctionInNonObjectFactory => "S009",
            MessageKind::UpcopyFromNonAncestor => "S010",
            MessageKind::UnresolvedPackageElement => "S011",
            MessageKind::SourceNotFound => "S012",
            MessageKind::OpenSourceFailed => "S013",
            MessageKind::ImportDepthExceeded => "S014",
            MessageKind::UnknownField => "S015",
            MessageKind::InvalidParameterType => "V001",
            MessageKind::DuplicateField => "V002",
            MessageKind::FieldShadowsBase => "V003",
            MessageKind::DuplicateIdentification => "V004",
            MessageKind::DuplicateOperator => "V005",
            MessageKind::NonSharableField => "V006",
            MessageKind::NonSharableDerived => "V007",
            MessageKind::DuplicateEnumerationValue => "V008",
            MessageKind::DuplicateDeclaration => "V009",
            MessageKind::ImportWithoutSourceProvider => "W001",
            MessageKind::MisplacedComment => "W002",
            MessageKind::ComposedValueInNonFlags => "W003",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            MessageKind::ImportWithoutSourceProvider
            | MessageKind::MisplacedComment
            | MessageKind::ComposedValueInNonFlags => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn template(self) -> &'static str {
        match self {
            MessageKind::ExpectImportSource => "expected import source string",
            MessageKind::ExpectSemicolon => "expected ';'",
            MessageKind::ExpectStatementName => "expected {statement} name",
            MessageKind::ExpectStatementBody => "expected '{' to open {statement} body",
            MessageKind::UnexpectedEndOfInput => "unexpected end of input in {statement}",
            MessageKind::ExpectKeyword => "expected keyword '{keyword}'",
            MessageKind::ExpectToken => "expected '{token}'",
            MessageKind::ExpectType => "expected {classifier} type",
            MessageKind::ExpectValue => "expected {type} value for {statement}",
            MessageKind::UnexpectedToken => "unexpected token '{token}'",
            MessageKind::UnknownStatement => {
                "unknown statement in {context}, expected {options}"
            }
            MessageKind::ExpectPackageElement => "expected package element",
            MessageKind::UnknownClassifierType => "unknown {classifier} type '{type}'",
            MessageKind::ExpectAppropriateType => "{classifier} must be {options}",
            MessageKind::UnexpectedModifier => "unexpected modifier '{modifier}'",
            MessageKind::UnknownBaseField => "unknown field '{name}' in base structure",
            MessageKind::OverrideWithoutBase => {
                "field '{name}' overrides nothing: the structure has no base"
            }
            MessageKind::UnknownEnumerationValue => {
                "unknown enumeration value '{name}', composed values may only reference earlier values"
            }
            MessageKind::FilterInNonObjectFactory => "filters are only allowed in object factories",
            MessageKind::FilterInFactoryForNonStructure => {
                "filters require a structure as factory parameter"
            }
            MessageKind::FunctionInNonObjectFactory => {
                "modifier 'function' applies only to object factories"
            }
            MessageKind::UpcopyFromNonAncestor => "'{type}' is not a base of structure '{name}'",
            MessageKind::UnresolvedPackageElement => {
                "package element at position {position} has nothing to inherit"
            }
            MessageKind::SourceNotFound => "import source '{source}' not found",
            MessageKind::OpenSourceFailed => "cannot open import source '{source}'",
            MessageKind::ImportDepthExceeded => {
                "import of '{source}' exceeds the depth limit of {depth}"
            }
            MessageKind::UnknownField => "structure '{type}' has no field '{name}'",
            MessageKind::InvalidParameterType => {
                "{classifier} parameter type '{type}' must be one of: {options}"
            }
            MessageKind::DuplicateField => "field '{name}' is declared more than once",
            MessageKind::FieldShadowsBase => {
                "field '{name}' hides a field of base structure '{type}', use override"
            }
            MessageKind::DuplicateIdentification => {
                "structure '{name}' declares identification more than once"
            }
            MessageKind::DuplicateOperator => "operator '{token}' is declared more than once",
            MessageKind::NonSharableField => {
                "field '{name}' of a sharable structure has non sharable type '{type}'"
            }
            MessageKind::NonSharableDerived => {
                "structure '{name}' must be sharable because its base '{type}' is"
            }
            MessageKind::DuplicateEnumerationValue => {
                "enumeration value '{name}' is declared more than once"
            }
            MessageKind::DuplicateDeclaration => "'{name}' is already declared in this package",
            MessageKind::ImportWithoutSourceProvider => {
                "import ignored, no source provider is configured"
            }
            MessageKind::MisplacedComment => "comment is not attached to any declaration",
            MessageKind::ComposedValueInNonFlags => {
                "composed value '{name}' in an enumeration without flags"
            }
        }
    }
}

// ============================================================================
// MESSAGE
// ============================================================================

/// A located diagnostic with its parameters already substituted.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    severity: Severity,
    kind: MessageKind,
    location: Location,
    params: Vec<(ParamKey, SmolStr)>,
    text: String,
}

impl Message {
    /// Create a message with the kind's default severity.
    pub fn new(kind: MessageKind, location: Location) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            location,
            params: Vec::new(),
            text: kind.template().to_string(),
        }
    }

    pub fn at(kind: MessageKind, source: Option<Arc<SourceId>>, line: u32, column: u32) -> Self {
        Self::new(kind, Location::new(source, line, column))
    }

    /// Set a substitution parameter and re-render the text.
    pub fn with(mut self, key: ParamKey, value: impl Into<SmolStr>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self.text = render(self.kind.template(), &self.params);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn source(&self) -> Option<&Arc<SourceId>> {
        self.location.source.as_ref()
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn column(&self) -> u32 {
        self.location.column
    }

    pub fn param(&self, key: ParamKey) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the template still contains a placeholder with no value.
    pub fn has_unresolved_placeholder(&self) -> bool {
        let template = self.kind.template();
        ParamKey::ALL.iter().any(|key| {
            template.contains(key.placeholder()) && !self.params.iter().any(|(k, _)| k == key)
        })
    }
}

fn render(template: &str, params: &[(ParamKey, SmolStr)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(key.placeholder(), value)
        })
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?} at {}: {}",
            self.severity,
            self.kind.code(),
            self.kind,
            self.location,
            self.text
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location,
            self.severity,
            self.kind.code(),
            self.text
        )
    }
}

// ============================================================================
// MESSAGE COLLECTOR
// ============================================================================

/// Passive sink for messages of one parse session.
#[derive(Clone, Debug, Default)]
pub struct MessageCollector {
    messages: Vec<Message>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: Message) {
        if message.has_unresolved_placeholder() {
            tracing::warn!(kind = ?message.kind(), text = message.text(), "message added with unresolved placeholder");
            debug_assert!(false, "unresolved placeholder in {:?}", message);
        }
        tracing::debug!(diagnostic = %message, "message added");
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Maximum severity seen so far.
    pub fn severity(&self) -> Option<Severity> {
        self.messages.iter().map(Message::severity).max()
    }

    /// Whether the aggregate severity is above `Warning`.
    pub fn exceeds_warning(&self) -> bool {
        self.severity().is_some_and(|s| s > Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity() == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take all messages, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.messages
    }
}
