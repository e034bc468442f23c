//! vibeql - a typed expression algebra compiled by rewrite rules.
//!
//! Expressions are trees of operation nodes tagged with capability
//! categories. Operators are built through an [`OperatorRegistry`] that
//! dispatches on those categories, and backends compile a tree by folding
//! rewrite rules over it until only a terminal value is left.
//!
//! ```
//! use vibeql::backend::{Arithmetic, Backend};
//! use vibeql::expression::int32;
//! use vibeql::registry::OperatorRegistry;
//! use vibeql::types::Literal;
//!
//! let registry = OperatorRegistry::standard()?;
//! let expr = registry.pow(int32(2), int32(3))?;
//! assert_eq!(Arithmetic::new().compile(&expr)?, Literal::Int(8));
//! # Ok::<(), vibeql::Error>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod expression;
pub mod parse;
pub mod registry;
pub mod rewrite;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
