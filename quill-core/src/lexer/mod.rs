//! 词法分析
//!
//! 把源码行切分为 [`Token`]，记录行号、列号和缩进层级。

mod error;
mod indent;
mod token;
mod tokenizer;

pub use error::{LexError, LexErrorKind};
pub use token::{reconstruct, unescape, LineMeta, LiteralKind, Token, TokenKind, TokenStream};
pub use tokenizer::{tokenize, Tokenizer, DELIMITERS, SYMBOL_OPERATORS, WORD_OPERATORS};
