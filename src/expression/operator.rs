//! Operator definitions for expressions.

use strum::{Display, EnumIter, EnumString};

/// Operator families; each family fixes the kind of result it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OperatorFamily {
    /// Produces numeric values
    Arithmetic,
    /// Produces booleans from any values
    Comparison,
    /// Produces booleans from booleans
    Logical,
}

/// Binary operation identities, as they appear on expression nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Power,
    Modulus,

    // Comparison
    Equals,
    NotEquals,
    GreaterEqual,
    GreaterThan,
    LessEqual,
    LessThan,
    IdenticalTo,

    // Logical
    And,
    Or,
    Xor,
}

impl BinaryOperator {
    pub fn family(&self) -> OperatorFamily {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::FloorDivide
            | BinaryOperator::Power
            | BinaryOperator::Modulus => OperatorFamily::Arithmetic,

            BinaryOperator::Equals
            | BinaryOperator::NotEquals
            | BinaryOperator::GreaterEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::LessEqual
            | BinaryOperator::LessThan
            | BinaryOperator::IdenticalTo => OperatorFamily::Comparison,

            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Xor => {
                OperatorFamily::Logical
            }
        }
    }
}

/// Unary operation identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub enum UnaryOperator {
    Not,
}

impl UnaryOperator {
    pub fn family(&self) -> OperatorFamily {
        match self {
            UnaryOperator::Not => OperatorFamily::Logical,
        }
    }
}

/// Dispatchable operator names, as requested by user code
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Pow,
    Mod,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    Identical,
    And,
    Or,
    Xor,
    Not,
}

impl OperatorKind {
    pub fn family(&self) -> OperatorFamily {
        match self {
            OperatorKind::Not => OperatorFamily::Logical,
            _ => self.binary_operator().map_or(OperatorFamily::Logical, |op| op.family()),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            OperatorKind::Not => 1,
            _ => 2,
        }
    }

    /// Whether a reflected (operand-swapped) form is derived on registration
    pub fn is_reversible(&self) -> bool {
        matches!(
            self.family(),
            OperatorFamily::Arithmetic | OperatorFamily::Logical
        ) && self.arity() == 2
    }

    /// Comparison to try on the right operand when the left one cannot
    /// receive this comparison: `a < b` holds exactly when `b > a` does
    pub fn mirrored(&self) -> Option<OperatorKind> {
        match self {
            OperatorKind::Eq => Some(OperatorKind::Eq),
            OperatorKind::Ne => Some(OperatorKind::Ne),
            OperatorKind::Ge => Some(OperatorKind::Le),
            OperatorKind::Gt => Some(OperatorKind::Lt),
            OperatorKind::Le => Some(OperatorKind::Ge),
            OperatorKind::Lt => Some(OperatorKind::Gt),
            OperatorKind::Identical => Some(OperatorKind::Identical),
            _ => None,
        }
    }

    /// Node identity the standard constructor for this operator builds
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        let op = match self {
            OperatorKind::Add => BinaryOperator::Add,
            OperatorKind::Sub => BinaryOperator::Subtract,
            OperatorKind::Mul => BinaryOperator::Multiply,
            OperatorKind::TrueDiv => BinaryOperator::Divide,
            OperatorKind::FloorDiv => BinaryOperator::FloorDivide,
            OperatorKind::Pow => BinaryOperator::Power,
            OperatorKind::Mod => BinaryOperator::Modulus,
            OperatorKind::Eq => BinaryOperator::Equals,
            OperatorKind::Ne => BinaryOperator::NotEquals,
            OperatorKind::Ge => BinaryOperator::GreaterEqual,
            OperatorKind::Gt => BinaryOperator::GreaterThan,
            OperatorKind::Le => BinaryOperator::LessEqual,
            OperatorKind::Lt => BinaryOperator::LessThan,
            OperatorKind::Identical => BinaryOperator::IdenticalTo,
            OperatorKind::And => BinaryOperator::And,
            OperatorKind::Or => BinaryOperator::Or,
            OperatorKind::Xor => BinaryOperator::Xor,
            OperatorKind::Not => return None,
        };
        Some(op)
    }

    /// Name of the reflected form, e.g. `rsub`
    pub fn reflected_name(&self) -> String {
        format!("r{}", self)
    }
}
