//! Cursor over the token sequence of one source.

use logos::Logos;
use smol_str::SmolStr;

use crate::base::{LineIndex, TextRange, TextSize};

use super::token::{Token, TokenKind};

/// Lex `text` into tokens, comments included.
///
/// Unrecognized input becomes [`TokenKind::Invalid`] tokens; lexing never
/// fails.
pub fn tokenize(text: &str) -> Vec<Token> {
    let index = LineIndex::new(text);
    let mut lexer = TokenKind::lexer(text);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Invalid);
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        let start = index.line_col(range.start());
        // Multi-line tokens (block comments) report their end on the start
        // line, so the end column is only meaningful for single-line tokens.
        let width = lexer.slice().lines().next().map_or(0, str::len) as u32;
        tokens.push(Token {
            kind,
            text: SmolStr::new(lexer.slice()),
            range,
            line: start.line_one_indexed(),
            start_column: start.col_one_indexed(),
            end_column: start.col_one_indexed() + width,
        });
    }
    tokens
}

/// Peek/shift cursor used by the grammar routines.
///
/// Reaching the end is a state ([`Tokenizer::eot`]) rather than an error.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Self::from_tokens(tokenize(text))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The token under the cursor, without consuming it.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// The token after the current one.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    /// Advance past the current token. Has no effect at the end.
    pub fn shift(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn eot(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    pub fn check_text(&self, kind: TokenKind, text: &str) -> bool {
        self.current().is_some_and(|t| t.is(kind, text))
    }

    /// Same contract as [`Tokenizer::check`]; used where the grammar
    /// requires the token rather than merely allows it.
    pub fn expect(&self, kind: TokenKind) -> bool {
        self.check(kind)
    }

    pub fn expect_text(&self, kind: TokenKind, text: &str) -> bool {
        self.check_text(kind, text)
    }

    /// Skip comment tokens under the cursor.
    pub fn skip_comments(&mut self) {
        while self.check(TokenKind::Comment) {
            self.shift();
        }
    }

    /// Line and column just past the last token, or `(1, 1)` for empty
    /// input. Premature end of input is reported here.
    pub fn end_position(&self) -> (u32, u32) {
        self.tokens
            .last()
            .map_or((1, 1), |t| (t.line, t.end_column))
    }

    /// Line and column of the current token, or [`Tokenizer::end_position`]
    /// at the end.
    pub fn position(&self) -> (u32, u32) {
        self.current()
            .map_or_else(|| self.end_position(), |t| (t.line, t.start_column))
    }
}
