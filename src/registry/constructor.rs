//! Node constructors bound to operators.

use crate::expression::{BinaryOperator, Expr, OperatorFamily, Operation, UnaryOperator};
use crate::types::{Categories, Shape};
use std::fmt;

/// How a constructor derives the categories of the node it builds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCategory {
    /// Numeric, keeping the operands' shape and promoting
    /// Integer < Decimal < Floating
    Numeric,
    /// Boolean, keeping the operands' shape
    Boolean,
    /// Exactly these categories
    Fixed(Categories),
}

impl ResultCategory {
    /// Whether an operator of `family` may declare this result
    pub fn fits(&self, family: OperatorFamily) -> bool {
        let declared = match self {
            ResultCategory::Numeric => Categories::NUMERIC,
            ResultCategory::Boolean => Categories::BOOLEAN,
            ResultCategory::Fixed(categories) => categories.closure(),
        };
        match family {
            OperatorFamily::Arithmetic => declared.contains(Categories::NUMERIC),
            OperatorFamily::Comparison | OperatorFamily::Logical => {
                declared.contains(Categories::BOOLEAN)
            }
        }
    }
}

impl fmt::Display for ResultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCategory::Numeric => write!(f, "Numeric"),
            ResultCategory::Boolean => write!(f, "Boolean"),
            ResultCategory::Fixed(categories) => write!(f, "{}", categories),
        }
    }
}

/// A node-building function registered for an operator.
///
/// Constructors are plain data so two registrations can be compared for
/// identity: re-registering an equal constructor is harmless, a different
/// one is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    operation: Operation,
    result: ResultCategory,
    swap_operands: bool,
}

impl Constructor {
    pub fn new(operation: Operation, result: ResultCategory) -> Self {
        Self {
            operation,
            result,
            swap_operands: false,
        }
    }

    pub fn binary(op: BinaryOperator, result: ResultCategory) -> Self {
        Self::new(Operation::Binary(op), result)
    }

    pub fn unary(op: UnaryOperator, result: ResultCategory) -> Self {
        Self::new(Operation::Unary(op), result)
    }

    /// Constructor for a user-defined node named `name`
    pub fn function(name: impl Into<String>, result: ResultCategory) -> Self {
        Self::new(Operation::Function(name.into()), result)
    }

    /// Same constructor, taking its two operands in the opposite order
    pub fn swapped(&self) -> Self {
        Self {
            swap_operands: !self.swap_operands,
            ..self.clone()
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn result(&self) -> ResultCategory {
        self.result
    }

    /// Build a node from `args` given receiver first
    pub fn build(&self, mut args: Vec<Expr>) -> Expr {
        if self.swap_operands && args.len() == 2 {
            args.swap(0, 1);
        }
        let categories = self.result_categories(&args);
        Expr::node(self.operation.clone(), args, categories)
    }

    fn result_categories(&self, args: &[Expr]) -> Categories {
        let shape = if args
            .iter()
            .any(|arg| arg.categories().contains(Categories::COLUMN))
        {
            Shape::Column
        } else {
            Shape::Scalar
        };
        match self.result {
            ResultCategory::Numeric => shape.categories() | self.numeric_kind(args),
            ResultCategory::Boolean => shape.categories() | Categories::BOOLEAN,
            ResultCategory::Fixed(categories) => categories,
        }
    }

    fn numeric_kind(&self, args: &[Expr]) -> Categories {
        if self.operation == Operation::Binary(BinaryOperator::Divide) {
            return Categories::FLOATING;
        }
        let kinds: Vec<Categories> = args
            .iter()
            .map(|arg| arg.categories())
            .filter(|categories| categories.contains(Categories::NUMERIC))
            .collect();
        if kinds.iter().any(|c| c.contains(Categories::FLOATING)) {
            Categories::FLOATING
        } else if kinds.iter().any(|c| c.contains(Categories::DECIMAL)) {
            Categories::DECIMAL
        } else if !kinds.is_empty() && kinds.iter().all(|c| c.contains(Categories::INTEGER)) {
            Categories::INTEGER
        } else {
            Categories::NUMERIC
        }
    }
}
