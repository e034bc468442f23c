//! Operator registry: multiple dispatch keyed by (operator, category).
//!
//! Every operator node is built through a registry. Resolution looks up
//! the constructors registered for the requested operator and picks the
//! one bound to the most specific category the receiver carries:
//!
//! - forward: the left operand is the receiver
//! - reflected: the right operand is the receiver, used when the left one
//!   has no registration (raw literals never do)
//! - mirrored: for comparisons, `a < b` is retried as `b > a`
//!
//! Ambiguity is rejected when registering, so resolution never has to
//! break a tie.

pub mod constructor;

pub use constructor::{Constructor, ResultCategory};

use crate::error::{Error, Result};
use crate::expression::{Expr, OperatorFamily, OperatorKind, Operation, UnaryOperator};
use crate::types::{Categories, Literal};
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct Registration {
    category: Categories,
    constructor: Constructor,
    /// Reflected form derived from a forward registration
    derived: bool,
}

/// Outcome of checking a registration against a slot
enum Placement {
    Insert,
    Replace(usize),
    Keep,
}

/// Maps (operator, direction) to the constructors registered per category
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    slots: BTreeMap<(OperatorKind, bool), Vec<Registration>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard operator set: arithmetic on `Numeric`,
    /// comparisons on `Value`, logical operators on `Boolean`.
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        for kind in [
            OperatorKind::Add,
            OperatorKind::Sub,
            OperatorKind::Mul,
            OperatorKind::TrueDiv,
            OperatorKind::FloorDiv,
            OperatorKind::Pow,
            OperatorKind::Mod,
        ] {
            registry.register_binary(kind, Categories::NUMERIC, ResultCategory::Numeric)?;
        }
        for kind in [
            OperatorKind::Eq,
            OperatorKind::Ne,
            OperatorKind::Ge,
            OperatorKind::Gt,
            OperatorKind::Le,
            OperatorKind::Lt,
            OperatorKind::Identical,
        ] {
            registry.register_binary(kind, Categories::VALUE, ResultCategory::Boolean)?;
        }
        for kind in [OperatorKind::And, OperatorKind::Or, OperatorKind::Xor] {
            registry.register_binary(kind, Categories::BOOLEAN, ResultCategory::Boolean)?;
        }
        registry.register(
            OperatorKind::Not,
            Categories::BOOLEAN,
            Constructor::unary(UnaryOperator::Not, ResultCategory::Boolean),
        )?;
        Ok(registry)
    }

    fn register_binary(
        &mut self,
        kind: OperatorKind,
        category: Categories,
        result: ResultCategory,
    ) -> Result<()> {
        let op = kind.binary_operator().ok_or_else(|| {
            configuration_error(kind, category, "operator is not binary".to_string())
        })?;
        self.register(kind, category, Constructor::binary(op, result))
    }

    /// Bind `constructor` to `kind` for receivers carrying `category`.
    ///
    /// Reversible operators also get a reflected form with the operands
    /// swapped, unless an explicit reflected constructor is registered
    /// for the same category.
    pub fn register(
        &mut self,
        kind: OperatorKind,
        category: Categories,
        constructor: Constructor,
    ) -> Result<()> {
        let category = category.closure();
        validate(kind, category, &constructor)?;

        let forward = Registration {
            category,
            constructor,
            derived: false,
        };
        let forward_placement = self.placement(kind, false, &forward)?;

        let reflected = if kind.is_reversible() {
            let registration = Registration {
                category,
                constructor: forward.constructor.swapped(),
                derived: true,
            };
            let placement = self.placement(kind, true, &registration)?;
            Some((registration, placement))
        } else {
            None
        };

        self.place(kind, false, forward, forward_placement);
        if let Some((registration, placement)) = reflected {
            self.place(kind, true, registration, placement);
        }
        debug!("Registered {} on [{}]", kind, category);
        Ok(())
    }

    /// Bind an explicit reflected constructor; it receives the right
    /// operand first and replaces any derived reflected form.
    pub fn register_reflected(
        &mut self,
        kind: OperatorKind,
        category: Categories,
        constructor: Constructor,
    ) -> Result<()> {
        let category = category.closure();
        if !kind.is_reversible() {
            return Err(configuration_error(
                kind,
                category,
                "operator has no reflected form".to_string(),
            ));
        }
        validate(kind, category, &constructor)?;

        let registration = Registration {
            category,
            constructor,
            derived: false,
        };
        let placement = self.placement(kind, true, &registration)?;
        self.place(kind, true, registration, placement);
        debug!("Registered {} on [{}]", kind.reflected_name(), category);
        Ok(())
    }

    fn placement(
        &self,
        kind: OperatorKind,
        reflected: bool,
        registration: &Registration,
    ) -> Result<Placement> {
        let Some(existing) = self.slots.get(&(kind, reflected)) else {
            return Ok(Placement::Insert);
        };
        let name = slot_name(kind, reflected);

        if let Some(index) = existing
            .iter()
            .position(|entry| entry.category == registration.category)
        {
            let current = &existing[index];
            if current.constructor == registration.constructor {
                return Ok(Placement::Keep);
            }
            return match (current.derived, registration.derived) {
                (true, false) => Ok(Placement::Replace(index)),
                (false, true) => Ok(Placement::Keep),
                _ => Err(Error::Configuration {
                    operator: name,
                    category: registration.category.to_string(),
                    reason: format!(
                        "already bound to {:?}",
                        current.constructor.operation()
                    ),
                }),
            };
        }

        let specificity = registration.category.specificity();
        if let Some(rival) = existing.iter().find(|entry| {
            entry.category.specificity() == specificity
                && (entry.category | registration.category).is_consistent()
        }) {
            return Err(Error::Configuration {
                operator: name,
                category: registration.category.to_string(),
                reason: format!("ambiguous with registration on [{}]", rival.category),
            });
        }
        Ok(Placement::Insert)
    }

    fn place(
        &mut self,
        kind: OperatorKind,
        reflected: bool,
        registration: Registration,
        placement: Placement,
    ) {
        let slot = self.slots.entry((kind, reflected)).or_default();
        match placement {
            Placement::Insert => slot.push(registration),
            Placement::Replace(index) => slot[index] = registration,
            Placement::Keep => {}
        }
    }

    /// Most specific constructor for a receiver carrying `receiver`
    pub fn resolve(
        &self,
        kind: OperatorKind,
        reflected: bool,
        receiver: Categories,
    ) -> Option<&Constructor> {
        self.slots
            .get(&(kind, reflected))?
            .iter()
            .filter(|entry| receiver.contains(entry.category))
            .max_by_key(|entry| entry.category.specificity())
            .map(|entry| &entry.constructor)
    }

    pub fn is_registered(&self, kind: OperatorKind, category: Categories) -> bool {
        self.slots
            .get(&(kind, false))
            .is_some_and(|slot| slot.iter().any(|entry| entry.category == category.closure()))
    }

    /// Build `left <kind> right`, dispatching forward, then reflected,
    /// then (for comparisons) mirrored.
    pub fn apply_binary(&self, kind: OperatorKind, left: &Expr, right: &Expr) -> Result<Expr> {
        if kind.arity() != 2 {
            return Err(unsupported(kind, &[left, right]));
        }
        if let Some(constructor) = self.resolve(kind, false, left.dispatch_categories()) {
            check_operands(kind, &[left, right])?;
            return Ok(constructor.build(vec![left.clone(), right.clone()]));
        }
        if kind.is_reversible() {
            if let Some(constructor) = self.resolve(kind, true, right.dispatch_categories()) {
                check_operands(kind, &[left, right])?;
                return Ok(constructor.build(vec![right.clone(), left.clone()]));
            }
        } else if let Some(mirrored) = kind.mirrored() {
            if let Some(constructor) = self.resolve(mirrored, false, right.dispatch_categories()) {
                check_operands(kind, &[left, right])?;
                return Ok(constructor.build(vec![right.clone(), left.clone()]));
            }
        }
        Err(unsupported(kind, &[left, right]))
    }

    pub fn apply_unary(&self, kind: OperatorKind, operand: &Expr) -> Result<Expr> {
        if kind.arity() != 1 {
            return Err(unsupported(kind, &[operand]));
        }
        let constructor = self
            .resolve(kind, false, operand.dispatch_categories())
            .ok_or_else(|| unsupported(kind, &[operand]))?;
        check_operands(kind, &[operand])?;
        Ok(constructor.build(vec![operand.clone()]))
    }

    /// Dispatch by operator kind regardless of arity
    pub fn apply(&self, kind: OperatorKind, args: &[Expr]) -> Result<Expr> {
        match args {
            [operand] => self.apply_unary(kind, operand),
            [left, right] => self.apply_binary(kind, left, right),
            _ => Err(unsupported(kind, &args.iter().collect::<Vec<_>>())),
        }
    }

    pub fn add(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Add, &left.into(), &right.into())
    }

    pub fn sub(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Sub, &left.into(), &right.into())
    }

    pub fn mul(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Mul, &left.into(), &right.into())
    }

    pub fn truediv(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::TrueDiv, &left.into(), &right.into())
    }

    pub fn floordiv(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::FloorDiv, &left.into(), &right.into())
    }

    pub fn pow(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Pow, &left.into(), &right.into())
    }

    pub fn modulo(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Mod, &left.into(), &right.into())
    }

    pub fn eq(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Eq, &left.into(), &right.into())
    }

    pub fn ne(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Ne, &left.into(), &right.into())
    }

    pub fn ge(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Ge, &left.into(), &right.into())
    }

    pub fn gt(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Gt, &left.into(), &right.into())
    }

    pub fn le(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Le, &left.into(), &right.into())
    }

    pub fn lt(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Lt, &left.into(), &right.into())
    }

    pub fn identical(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Identical, &left.into(), &right.into())
    }

    pub fn and(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::And, &left.into(), &right.into())
    }

    pub fn or(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Or, &left.into(), &right.into())
    }

    pub fn xor(&self, left: impl Into<Expr>, right: impl Into<Expr>) -> Result<Expr> {
        self.apply_binary(OperatorKind::Xor, &left.into(), &right.into())
    }

    pub fn not(&self, operand: impl Into<Expr>) -> Result<Expr> {
        self.apply_unary(OperatorKind::Not, &operand.into())
    }
}

fn slot_name(kind: OperatorKind, reflected: bool) -> String {
    if reflected {
        kind.reflected_name()
    } else {
        kind.to_string()
    }
}

fn configuration_error(kind: OperatorKind, category: Categories, reason: String) -> Error {
    Error::Configuration {
        operator: kind.to_string(),
        category: category.to_string(),
        reason,
    }
}

fn validate(kind: OperatorKind, category: Categories, constructor: &Constructor) -> Result<()> {
    if category.is_empty() || !category.is_consistent() {
        return Err(configuration_error(
            kind,
            category,
            "category can never be carried by a node".to_string(),
        ));
    }
    let family = kind.family();
    if !constructor.result().fits(family) {
        return Err(configuration_error(
            kind,
            category,
            format!(
                "{} operator cannot produce [{}]",
                family,
                constructor.result()
            ),
        ));
    }
    let operation_family = match constructor.operation() {
        Operation::Binary(op) if kind.arity() == 2 => Some(op.family()),
        Operation::Unary(op) if kind.arity() == 1 => Some(op.family()),
        Operation::Binary(_) | Operation::Unary(_) => {
            return Err(configuration_error(
                kind,
                category,
                format!("{} takes {} operand(s)", kind, kind.arity()),
            ))
        }
        _ => None,
    };
    if operation_family.is_some_and(|operation_family| operation_family != family) {
        return Err(configuration_error(
            kind,
            category,
            format!(
                "constructor {} belongs to another operator family",
                constructor.operation()
            ),
        ));
    }
    Ok(())
}

/// Categories every operand of an operator family must carry
fn required_operand(family: OperatorFamily) -> Categories {
    match family {
        OperatorFamily::Arithmetic => Categories::NUMERIC,
        OperatorFamily::Comparison => Categories::VALUE,
        OperatorFamily::Logical => Categories::BOOLEAN,
    }
}

fn check_operands(kind: OperatorKind, operands: &[&Expr]) -> Result<()> {
    let required = required_operand(kind.family());
    let legal = operands.iter().all(|operand| {
        matches!(operand, Expr::Literal(Literal::Null)) || operand.categories().contains(required)
    });
    if legal {
        Ok(())
    } else {
        Err(unsupported(kind, operands))
    }
}

fn unsupported(kind: OperatorKind, operands: &[&Expr]) -> Error {
    Error::UnsupportedOperation {
        operator: kind.to_string(),
        categories: operands
            .iter()
            .map(|operand| operand.categories().to_string())
            .collect(),
    }
}
