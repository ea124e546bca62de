//! Token kinds and tokens produced by the logos lexer.

use std::fmt;

use logos::Logos;
use smol_str::SmolStr;

use crate::base::TextRange;

/// Lexical class of a token.
///
/// Keywords are not separate kinds: the grammar recognizes them as
/// identifiers with a particular text, so any keyword can still be used
/// where the grammar expects a plain name.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"-?(0[xX][0-9a-fA-F]+|[0-9]+)")]
    IntegerLiteral,

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    RealLiteral,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    /// `;` `,` `:`
    #[token(";")]
    #[token(",")]
    #[token(":")]
    Delimiter,

    /// `{` `}` `(` `)` `[` `]`
    #[token("{")]
    #[token("}")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    Bracket,

    /// `=`
    #[token("=")]
    Operator,

    /// `==` `!=` `<` `>` `<=` `>=`
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    RelationalOperator,

    /// `|` `&` `^` `~`
    #[token("|")]
    #[token("&")]
    #[token("^")]
    #[token("~")]
    BitwiseOperator,

    /// Parameter directions `-->` `<--` `<->`
    #[token("-->")]
    #[token("<--")]
    #[token("<->")]
    ArrowOperator,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[token(".")]
    Dot,

    #[token("*")]
    Asterisk,

    /// Anything the lexer could not classify.
    Invalid,
}

impl TokenKind {
    /// Human readable description used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Delimiter => "delimiter",
            TokenKind::Bracket => "bracket",
            TokenKind::Operator => "operator",
            TokenKind::RelationalOperator => "relational operator",
            TokenKind::BitwiseOperator => "bitwise operator",
            TokenKind::ArrowOperator => "arrow",
            TokenKind::Comment => "comment",
            TokenKind::Dot => "dot",
            TokenKind::Asterisk => "asterisk",
            TokenKind::Invalid => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One lexed token with its position.
///
/// Lines and columns are 1-based; `end_column` is exclusive, so a token
/// `abc` starting at column 1 ends at column 4.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub range: TextRange,
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is(TokenKind::Identifier, keyword)
    }

    /// The literal value: string literals lose their quotes and escapes,
    /// everything else is returned as written.
    pub fn value(&self) -> SmolStr {
        if self.kind != TokenKind::StringLiteral {
            return self.text.clone();
        }
        let inner = self
            .text
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(&self.text);
        if !inner.contains('\\') {
            return SmolStr::new(inner);
        }
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                value.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some(other) => value.push(other),
                None => {}
            }
        }
        SmolStr::from(value)
    }

    /// Comment text without the `//` or `/* */` markers, one entry per line.
    pub fn comment_lines(&self) -> Vec<SmolStr> {
        if self.kind != TokenKind::Comment {
            return Vec::new();
        }
        if let Some(line) = self.text.strip_prefix("//") {
            return vec![SmolStr::new(line.trim())];
        }
        let body = self
            .text
            .strip_prefix("/*")
            .and_then(|s| s.strip_suffix("*/"))
            .unwrap_or(&self.text);
        body.lines()
            .map(|line| {
                let line = line.trim();
                let line = line.strip_prefix('*').map(str::trim_start).unwrap_or(line);
                SmolStr::new(line)
            })
            .skip_while(|line| line.is_empty())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .skip_while(|line| line.is_empty())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({:?})@{}:{}",
            self.kind, self.text, self.line, self.start_column
        )
    }
}
