//! Expression tree nodes.

use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::types::{Categories, Literal, TypeName};
use std::fmt;
use std::sync::Arc;

/// Identity of the constructor that produced a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Typed scalar, e.g. `int32(2)`
    Scalar(TypeName),
    /// Leaf table reference
    Table,
    /// Subset of a table's columns
    Projection,
    /// Single column of a table
    Column,
    Binary(BinaryOperator),
    Unary(UnaryOperator),
    /// Backend- or user-defined node
    Function(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Scalar(type_name) => write!(f, "{}", type_name),
            Operation::Table => write!(f, "Table"),
            Operation::Projection => write!(f, "Projection"),
            Operation::Column => write!(f, "Column"),
            Operation::Binary(op) => write!(f, "{}", op),
            Operation::Unary(op) => write!(f, "{}", op),
            Operation::Function(name) => write!(f, "{}", name),
        }
    }
}

/// An operation applied to ordered arguments, tagged with the
/// categories of the value it denotes. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    operation: Operation,
    args: Vec<Expr>,
    categories: Categories,
}

impl Node {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    pub fn categories(&self) -> Categories {
        self.categories
    }
}

// Unlink uniquely owned subtrees iteratively so dropping a deep chain
// does not recurse once per level.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.args);
        while let Some(expr) = pending.pop() {
            if let Expr::Node(node) = expr {
                if let Ok(mut node) = Arc::try_unwrap(node) {
                    pending.append(&mut node.args);
                }
            }
        }
    }
}

/// Expression tree: either a raw literal or a constructor node.
///
/// Nodes are shared behind `Arc`, so cloning a subtree is cheap and a
/// rewritten tree reuses every subtree no rule touched.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Node(Arc<Node>),
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Literal(a), Expr::Literal(b)) => a == b,
            (Expr::Node(a), Expr::Node(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Expr {
    pub(crate) fn node(operation: Operation, args: Vec<Expr>, categories: Categories) -> Self {
        Expr::Node(Arc::new(Node {
            operation,
            args,
            categories: categories.closure(),
        }))
    }

    /// Build a backend- or user-defined node.
    ///
    /// Rules use this for intermediate shapes that have no dedicated
    /// constructor; the node is rewritten like any other.
    pub fn function(name: impl Into<String>, args: Vec<Expr>, categories: Categories) -> Self {
        Expr::node(Operation::Function(name.into()), args, categories)
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Expr::Node(node) => Some(node),
            Expr::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expr::Literal(literal) => Some(literal),
            Expr::Node(_) => None,
        }
    }

    /// A terminal expression is a raw literal; nothing is left to rewrite
    pub fn is_terminal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    pub fn operation(&self) -> Option<&Operation> {
        self.as_node().map(|node| &node.operation)
    }

    pub fn args(&self) -> &[Expr] {
        match self {
            Expr::Node(node) => &node.args,
            Expr::Literal(_) => &[],
        }
    }

    /// Categories of the denoted value, including those of raw literals
    pub fn categories(&self) -> Categories {
        match self {
            Expr::Node(node) => node.categories,
            Expr::Literal(literal) => literal.categories(),
        }
    }

    /// Categories operator dispatch may use on this expression as the
    /// receiver. Raw literals are host values and receive nothing.
    pub fn dispatch_categories(&self) -> Categories {
        match self {
            Expr::Node(node) => node.categories,
            Expr::Literal(_) => Categories::empty(),
        }
    }

    /// Operands of a binary node with operator `op`
    pub fn as_binary(&self, op: BinaryOperator) -> Option<(&Expr, &Expr)> {
        match self.binary_parts() {
            Some((found, left, right)) if found == op => Some((left, right)),
            _ => None,
        }
    }

    pub fn binary_parts(&self) -> Option<(BinaryOperator, &Expr, &Expr)> {
        let node = self.as_node()?;
        match (&node.operation, node.args.as_slice()) {
            (Operation::Binary(op), [left, right]) => Some((*op, left, right)),
            _ => None,
        }
    }

    pub fn unary_parts(&self) -> Option<(UnaryOperator, &Expr)> {
        let node = self.as_node()?;
        match (&node.operation, node.args.as_slice()) {
            (Operation::Unary(op), [operand]) => Some((*op, operand)),
            _ => None,
        }
    }

    /// Type and raw value of a scalar node such as `int32(2)`
    pub fn as_scalar(&self) -> Option<(TypeName, &Literal)> {
        let node = self.as_node()?;
        match (&node.operation, node.args.as_slice()) {
            (Operation::Scalar(type_name), [Expr::Literal(value)]) => Some((*type_name, value)),
            _ => None,
        }
    }

    /// Same node with replaced arguments; literals are returned unchanged
    pub(crate) fn with_args(&self, args: Vec<Expr>) -> Expr {
        match self {
            Expr::Node(node) => Expr::Node(Arc::new(Node {
                operation: node.operation.clone(),
                args,
                categories: node.categories,
            })),
            Expr::Literal(_) => self.clone(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal.repr()),
            Expr::Node(node) => {
                write!(f, "{}(", node.operation)?;
                for (i, arg) in node.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<Literal> for Expr {
    fn from(value: Literal) -> Self {
        Expr::Literal(value)
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.into())
    }
}
