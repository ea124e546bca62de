//! Lexical layer: token kinds, tokens, and the tokenizer cursor.

mod token;
mod tokenizer;

pub use token::{Token, TokenKind};
pub use tokenizer::{Tokenizer, tokenize};
