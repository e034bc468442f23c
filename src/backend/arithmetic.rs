//! Constant-folding backend: evaluates scalar expressions to values.
//!
//! Scalars unwrap to their raw values and operators over raw values fold
//! into a single value, so a fully constant tree compiles to a terminal
//! [`Literal`] rather than text. Anything that cannot be folded (columns,
//! overflow, division by zero) stays a node and compilation reports it as
//! unresolved.
//!
//! NULL follows three-valued logic: it propagates through arithmetic and
//! comparisons, `false AND NULL` is `false`, `true OR NULL` is `true`.

use crate::backend::{Backend, Compiler};
use crate::config::RewriteConfig;
use crate::error::Result;
use crate::expression::{BinaryOperator, Expr, OperatorFamily, UnaryOperator};
use crate::rewrite::{produce, Production, Rule, Sequence};
use crate::types::Literal;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use log::debug;
use std::cmp::Ordering;

/// Numeric operand after promotion
#[derive(Debug, Clone, PartialEq)]
enum Number {
    Int(i64),
    Decimal(BigDecimal),
    Float(f64),
}

impl Number {
    fn from_literal(literal: &Literal) -> Option<Number> {
        match literal {
            Literal::Int(value) => Some(Number::Int(*value)),
            Literal::Decimal(value) => Some(Number::Decimal(value.clone())),
            Literal::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    fn to_f64(&self) -> Option<f64> {
        match self {
            Number::Int(value) => Some(*value as f64),
            Number::Decimal(value) => value.to_f64(),
            Number::Float(value) => Some(*value),
        }
    }

    fn to_decimal(&self) -> Option<BigDecimal> {
        match self {
            Number::Int(value) => Some(BigDecimal::from(*value)),
            Number::Decimal(value) => Some(value.clone()),
            Number::Float(_) => None,
        }
    }
}

/// Both operands lifted to a common representation
enum Pair {
    Int(i64, i64),
    Decimal(BigDecimal, BigDecimal),
    Float(f64, f64),
}

fn promote(left: &Number, right: &Number) -> Option<Pair> {
    match (left, right) {
        (Number::Int(a), Number::Int(b)) => Some(Pair::Int(*a, *b)),
        (Number::Float(_), _) | (_, Number::Float(_)) => {
            Some(Pair::Float(left.to_f64()?, right.to_f64()?))
        }
        _ => Some(Pair::Decimal(left.to_decimal()?, right.to_decimal()?)),
    }
}

/// Floor division rounding toward negative infinity
fn floor_div_int(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

/// Modulus taking the sign of the divisor
fn floor_mod_int(a: i64, b: i64) -> Option<i64> {
    let remainder = a.checked_rem(b)?;
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        remainder.checked_add(b)
    } else {
        Some(remainder)
    }
}

fn finite(value: f64) -> Option<Literal> {
    value.is_finite().then_some(Literal::Float(value))
}

fn fold_arithmetic(op: BinaryOperator, left: &Number, right: &Number) -> Option<Literal> {
    if op == BinaryOperator::Divide {
        let divisor = right.to_f64()?;
        if divisor == 0.0 {
            return None;
        }
        return finite(left.to_f64()? / divisor);
    }

    match promote(left, right)? {
        Pair::Int(a, b) => {
            let value = match op {
                BinaryOperator::Add => a.checked_add(b)?,
                BinaryOperator::Subtract => a.checked_sub(b)?,
                BinaryOperator::Multiply => a.checked_mul(b)?,
                BinaryOperator::FloorDivide => floor_div_int(a, b)?,
                BinaryOperator::Modulus => floor_mod_int(a, b)?,
                BinaryOperator::Power if b < 0 => return finite((a as f64).powf(b as f64)),
                BinaryOperator::Power => a.checked_pow(u32::try_from(b).ok()?)?,
                _ => return None,
            };
            Some(Literal::Int(value))
        }
        Pair::Float(a, b) => {
            let value = match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::FloorDivide if b != 0.0 => (a / b).floor(),
                BinaryOperator::Modulus if b != 0.0 => a - b * (a / b).floor(),
                BinaryOperator::Power => a.powf(b),
                _ => return None,
            };
            finite(value)
        }
        Pair::Decimal(a, b) => {
            let value = match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::FloorDivide if !b.is_zero() => {
                    (a / b).with_scale_round(0, RoundingMode::Floor)
                }
                BinaryOperator::Modulus if !b.is_zero() => {
                    let quotient = (&a / &b).with_scale_round(0, RoundingMode::Floor);
                    a - b * quotient
                }
                BinaryOperator::Power => {
                    let exponent = u32::try_from(b.to_i64()?).ok()?;
                    if !b.is_integer() || exponent > 64 {
                        return None;
                    }
                    (0..exponent).fold(BigDecimal::from(1), |acc, _| acc * &a)
                }
                _ => return None,
            };
            Some(Literal::Decimal(value.normalized()))
        }
    }
}

/// Ordering of two non-null values of comparable kinds
fn compare(left: &Literal, right: &Literal) -> Option<Ordering> {
    match (left, right) {
        (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
        (Literal::Text(a), Literal::Text(b)) => Some(a.cmp(b)),
        (Literal::Date(a), Literal::Date(b)) => Some(a.cmp(b)),
        (Literal::Time(a), Literal::Time(b)) => Some(a.cmp(b)),
        (Literal::Timestamp(a), Literal::Timestamp(b)) => Some(a.cmp(b)),
        _ => {
            let left = Number::from_literal(left)?;
            let right = Number::from_literal(right)?;
            match promote(&left, &right)? {
                Pair::Int(a, b) => Some(a.cmp(&b)),
                Pair::Decimal(a, b) => Some(a.cmp(&b)),
                Pair::Float(a, b) => a.partial_cmp(&b),
            }
        }
    }
}

fn fold_comparison(op: BinaryOperator, left: &Literal, right: &Literal) -> Option<Literal> {
    if op == BinaryOperator::IdenticalTo {
        let identical = match (left.is_null(), right.is_null()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            (false, false) => compare(left, right) == Some(Ordering::Equal),
        };
        return Some(Literal::Boolean(identical));
    }
    if left.is_null() || right.is_null() {
        return Some(Literal::Null);
    }

    let ordering = compare(left, right);
    let result = match (op, ordering) {
        (BinaryOperator::Equals, ordering) => ordering == Some(Ordering::Equal),
        (BinaryOperator::NotEquals, ordering) => ordering != Some(Ordering::Equal),
        (BinaryOperator::GreaterEqual, Some(ordering)) => ordering != Ordering::Less,
        (BinaryOperator::GreaterThan, Some(ordering)) => ordering == Ordering::Greater,
        (BinaryOperator::LessEqual, Some(ordering)) => ordering != Ordering::Greater,
        (BinaryOperator::LessThan, Some(ordering)) => ordering == Ordering::Less,
        _ => return None,
    };
    Some(Literal::Boolean(result))
}

/// Three-valued truth value: `None` is NULL
fn truth(literal: &Literal) -> Option<Option<bool>> {
    match literal {
        Literal::Boolean(value) => Some(Some(*value)),
        Literal::Null => Some(None),
        _ => None,
    }
}

fn from_truth(value: Option<bool>) -> Literal {
    value.map_or(Literal::Null, Literal::Boolean)
}

fn fold_logical(op: BinaryOperator, left: &Literal, right: &Literal) -> Option<Literal> {
    let left = truth(left)?;
    let right = truth(right)?;
    let value = match op {
        BinaryOperator::And => match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BinaryOperator::Xor => match (left, right) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        },
        _ => return None,
    };
    Some(from_truth(value))
}

/// Fold `left <op> right` over raw values; `None` if it cannot be folded
pub fn fold_binary(op: BinaryOperator, left: &Literal, right: &Literal) -> Option<Literal> {
    match op.family() {
        OperatorFamily::Arithmetic => {
            if left.is_null() || right.is_null() {
                return Some(Literal::Null);
            }
            fold_arithmetic(op, &Number::from_literal(left)?, &Number::from_literal(right)?)
        }
        OperatorFamily::Comparison => fold_comparison(op, left, right),
        OperatorFamily::Logical => fold_logical(op, left, right),
    }
}

/// Typed scalars unwrap to their raw value
pub struct ScalarValue;

impl Rule for ScalarValue {
    fn name(&self) -> &str {
        "scalar_value"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (_, value) = expr.as_scalar()?;
        produce(move || Expr::Literal(value.clone()))
    }
}

/// Binary operators over raw values fold to a value.
///
/// Matching only checks the operand shapes. A node that would overflow or
/// divide by zero produces itself, so it stays unresolved.
pub struct FoldBinary;

/// Raw values the folding arithmetic knows about
fn foldable(literal: &Literal) -> bool {
    !matches!(
        literal,
        Literal::List(_) | Literal::Schema(_) | Literal::Rendered(_)
    )
}

impl Rule for FoldBinary {
    fn name(&self) -> &str {
        "fold_binary"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (op, left, right) = expr.binary_parts()?;
        let (left, right) = (left.as_literal()?, right.as_literal()?);
        if !foldable(left) || !foldable(right) {
            return None;
        }
        produce(move || {
            fold_binary(op, left, right)
                .map(Expr::Literal)
                .unwrap_or_else(|| expr.clone())
        })
    }
}

/// `NOT` over a raw boolean or NULL
pub struct FoldNot;

impl Rule for FoldNot {
    fn name(&self) -> &str {
        "fold_not"
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        let (op, operand) = expr.unary_parts()?;
        if op != UnaryOperator::Not {
            return None;
        }
        let value = truth(operand.as_literal()?)?;
        produce(move || Expr::Literal(from_truth(value.map(|b| !b))))
    }
}

pub fn standard_rules() -> Sequence {
    Sequence::default()
        .with_rule(ScalarValue)
        .with_rule(FoldBinary)
        .with_rule(FoldNot)
}

/// Example backend compiling constant expressions to values
pub struct Arithmetic {
    compiler: Compiler,
}

impl Arithmetic {
    pub fn new() -> Self {
        Self::with_config(RewriteConfig::default())
    }

    pub fn with_config(config: RewriteConfig) -> Self {
        Self {
            compiler: Compiler::new(standard_rules(), config),
        }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }
}

impl Default for Arithmetic {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Arithmetic {
    type Output = Literal;
    type Result = Literal;

    fn compile(&self, expr: &Expr) -> Result<Literal> {
        let value = self.compiler.compile(expr)?;
        debug!("Folded to {}", value.repr());
        Ok(value)
    }

    fn execute(&self, expr: &Expr) -> Result<Literal> {
        self.compile(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::expression::{boolean, decimal, float64, int32, int64, string, table};
    use crate::registry::OperatorRegistry;
    use crate::schema::{Table, TableSchema};
    use crate::types::TypeName;
    use std::str::FromStr;

    fn compile(expr: &Expr) -> Result<Literal> {
        Arithmetic::new().compile(expr)
    }

    #[test]
    fn test_power_folds_to_value() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let expr = registry.pow(int32(2), int32(3))?;
        assert_eq!(compile(&expr)?, Literal::Int(8));
        assert_eq!(Arithmetic::new().execute(&expr)?, Literal::Int(8));
        Ok(())
    }

    #[test]
    fn test_nested_folding() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let expr = registry.mul(registry.add(int32(1), int32(2))?, registry.sub(10, int32(4))?)?;
        assert_eq!(compile(&expr)?, Literal::Int(18));

        let expr = registry.truediv(int32(7), int32(2))?;
        assert_eq!(compile(&expr)?, Literal::Float(3.5));

        let expr = registry.add(float64(0.5), int32(1))?;
        assert_eq!(compile(&expr)?, Literal::Float(1.5));
        Ok(())
    }

    #[test]
    fn test_floor_division_and_modulus() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        assert_eq!(compile(&registry.floordiv(int32(-7), int32(2))?)?, Literal::Int(-4));
        assert_eq!(compile(&registry.floordiv(int32(7), int32(2))?)?, Literal::Int(3));
        assert_eq!(compile(&registry.modulo(int32(-7), int32(2))?)?, Literal::Int(1));
        assert_eq!(compile(&registry.modulo(int32(7), int32(-2))?)?, Literal::Int(-1));
        assert_eq!(
            compile(&registry.floordiv(float64(-7.0), int32(2))?)?,
            Literal::Float(-4.0)
        );
        assert_eq!(compile(&registry.pow(int32(2), int32(-1))?)?, Literal::Float(0.5));
        Ok(())
    }

    #[test]
    fn test_decimal_arithmetic() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let price = decimal(BigDecimal::from_str("1.25").unwrap());
        let expr = registry.mul(&price, int32(4))?;
        assert_eq!(compile(&expr)?, Literal::Decimal(BigDecimal::from(5)));
        let expr = registry.add(&price, decimal(BigDecimal::from_str("0.5").unwrap()))?;
        assert_eq!(
            compile(&expr)?,
            Literal::Decimal(BigDecimal::from_str("1.75").unwrap())
        );
        let expr = registry.floordiv(&price, decimal(BigDecimal::from_str("0.5").unwrap()))?;
        assert_eq!(compile(&expr)?, Literal::Decimal(BigDecimal::from(2)));
        Ok(())
    }

    #[test]
    fn test_overflow_and_zero_division_stay_unresolved() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let err = compile(&registry.add(int64(i64::MAX), int64(1))?).unwrap_err();
        assert!(matches!(err, Error::UnresolvedExpression { ref operation, .. } if operation == "Add"));

        let err = compile(&registry.floordiv(int32(1), int32(0))?).unwrap_err();
        assert!(matches!(err, Error::UnresolvedExpression { ref operation, .. } if operation == "FloorDivide"));

        let err = compile(&registry.truediv(int32(1), int32(0))?).unwrap_err();
        assert!(matches!(err, Error::UnresolvedExpression { .. }));
        Ok(())
    }

    #[test]
    fn test_fold_binary_matches_on_shape() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let zero_division = registry.floordiv(1, int32(0))?;
        assert!(FoldBinary.try_match(&zero_division).is_none());

        let raw = zero_division.with_args(vec![Expr::literal(1), Expr::literal(0)]);
        let production = FoldBinary.try_match(&raw).unwrap();
        assert_eq!(production(), raw);
        let fixpoint = Arithmetic::new().compiler().rewrite(&raw)?;
        assert_eq!(fixpoint.expr, raw);
        assert_eq!(fixpoint.passes, 1);

        let sum = registry.add(int32(2), int32(3))?;
        let raw = sum.with_args(vec![Expr::literal(2), Expr::literal(3)]);
        let production = FoldBinary.try_match(&raw).unwrap();
        assert_eq!(production(), Expr::literal(5));
        Ok(())
    }

    #[test]
    fn test_comparisons() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        assert_eq!(compile(&registry.lt(int32(1), float64(1.5))?)?, Literal::Boolean(true));
        assert_eq!(compile(&registry.ge(int32(1), int32(2))?)?, Literal::Boolean(false));
        assert_eq!(compile(&registry.eq(string("a"), string("a"))?)?, Literal::Boolean(true));
        assert_eq!(compile(&registry.ne(string("a"), int32(1))?)?, Literal::Boolean(true));
        assert_eq!(
            compile(&registry.eq(int32(1), Expr::Literal(Literal::Null))?)?,
            Literal::Null
        );
        assert_eq!(
            compile(&registry.identical(int32(1), Expr::Literal(Literal::Null))?)?,
            Literal::Boolean(false)
        );
        assert!(compile(&registry.lt(string("a"), int32(1))?).is_err());
        Ok(())
    }

    #[test]
    fn test_three_valued_logic() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let null = Expr::Literal(Literal::Null);
        assert_eq!(compile(&registry.and(boolean(false), &null)?)?, Literal::Boolean(false));
        assert_eq!(compile(&registry.and(boolean(true), &null)?)?, Literal::Null);
        assert_eq!(compile(&registry.or(boolean(true), &null)?)?, Literal::Boolean(true));
        assert_eq!(compile(&registry.or(boolean(false), &null)?)?, Literal::Null);
        assert_eq!(compile(&registry.xor(boolean(true), false)?)?, Literal::Boolean(true));
        assert_eq!(compile(&registry.not(boolean(true))?)?, Literal::Boolean(false));
        assert_eq!(compile(&registry.add(int32(1), &null)?)?, Literal::Null);
        Ok(())
    }

    #[test]
    fn test_columns_are_unresolved() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let schema = TableSchema::builder()
            .column("amount", TypeName::Float64, true)
            .build()?;
        let amount = table(&Table::new("orders", schema)).column("amount")?;
        let err = compile(&registry.add(&amount, int32(1))?).unwrap_err();
        assert!(matches!(err, Error::UnresolvedExpression { ref operation, .. } if operation == "Table"));
        Ok(())
    }
}
