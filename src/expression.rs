//! Immutable expression trees.
//!
//! This module provides:
//! - Expression nodes: an operation identity, ordered arguments and the
//!   capability categories of the denoted value
//! - Constructors for typed scalars, tables, projections and columns
//! - Operator identities for binary and unary nodes
//! - Read-only tree views (`explain`, `walk`, Graphviz export)
//!
//! Operator nodes (`Add`, `LessThan`, ...) are built through
//! [`crate::registry::OperatorRegistry`], which checks operand legality
//! and derives the result categories.

pub mod builder;
pub mod explain;
pub mod node;
pub mod operator;

pub use builder::{
    boolean, date, decimal, float16, float32, float64, int16, int32, int64, int8, string, table,
    time, timestamp,
};
pub use node::{Expr, Node, Operation};
pub use operator::{BinaryOperator, OperatorFamily, OperatorKind, UnaryOperator};
