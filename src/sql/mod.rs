//! SQL token classifier, AST definitions and SELECT parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod unparse;

// Re-export all AST types for convenient access.
pub use ast::*;

// Re-export the parse entry points for convenient access.
pub use parser::{parse, parse_tokens, parse_tokens_with, parse_with, ParseOptions};
