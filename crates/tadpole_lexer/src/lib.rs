//! Tokens consumed by the Tadpole compiler and a lexer that produces them.

mod lexer;
mod source;
mod span;
pub mod token;

pub use lexer::{Lexer, tokenize};
pub use span::Span;
pub use token::{Token, TokenKind};
