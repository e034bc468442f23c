//! Text front end: parse infix expressions into trees.
//!
//! Every operator in the text is built through an [`OperatorRegistry`],
//! so a parsed tree carries exactly the categories and dispatch errors a
//! hand-built one would. Bare identifiers are columns of the source
//! table passed in.
//!
//! Precedence, loosest first: `OR`, `XOR`, `AND`, `NOT`, comparisons
//! (including `IS NOT DISTINCT FROM`), `+ -`, `* / // %`, unary `-`, `**`.

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::error::Result;
use crate::expression::Expr;
use crate::registry::OperatorRegistry;

/// Parse `input` into an expression, resolving identifiers against `source`
pub fn parse(input: &str, registry: &OperatorRegistry, source: Option<&Expr>) -> Result<Expr> {
    let mut parser = Parser::new(input, registry)?;
    if let Some(source) = source {
        parser = parser.with_source(source);
    }
    parser.parse()
}
