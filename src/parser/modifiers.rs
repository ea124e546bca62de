//! Leading modifier keywords.
//!
//! Modifiers are collected greedily before a construct keyword without
//! knowing which construct follows. The construct then claims the ones it
//! understands; whatever is left afterwards is reported as unexpected.

use crate::syntax::{Token, TokenKind};

/// Modifiers allowed in front of a top-level declaration.
pub(crate) const DECLARATION_MODIFIERS: &[&str] = &[
    "abstract",
    "controlled",
    "immutable",
    "partial",
    "sharable",
    "streamable",
    "strong",
    "weak",
    "flags",
    "function",
    "hierarchy",
    "object",
    "plugin",
];

/// Modifiers allowed in front of a structure member.
pub(crate) const MEMBER_MODIFIERS: &[&str] = &[
    "weak",
    "strong",
    "runtime",
    "inproc",
    "flags",
    "override",
    "native",
    "function",
    "functor",
];

#[derive(Debug, Default)]
pub(crate) struct Modifiers {
    tokens: Vec<Token>,
}

impl Modifiers {
    pub(crate) fn push(&mut self, token: Token) {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        self.tokens.push(token);
    }

    /// Claim the first modifier spelled `keyword`.
    pub(crate) fn take(&mut self, keyword: &str) -> Option<Token> {
        let index = self.tokens.iter().position(|t| t.text == keyword)?;
        Some(self.tokens.remove(index))
    }

    /// Claim the first modifier spelled like any of `keywords`.
    pub(crate) fn take_any(&mut self, keywords: &[&str]) -> Option<Token> {
        let index = self
            .tokens
            .iter()
            .position(|t| keywords.contains(&t.text.as_str()))?;
        Some(self.tokens.remove(index))
    }

    /// Modifiers nobody claimed, in source order.
    pub(crate) fn into_unclaimed(self) -> Vec<Token> {
        self.tokens
    }
}
