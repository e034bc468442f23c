//! Backends: compile expression trees with a fixed rule set.
//!
//! A backend owns one [`Compiler`], built once from its rule list and
//! reused for every `compile` call. `execute` is `compile` followed by a
//! call into whatever substrate the backend wraps.

pub mod arithmetic;
pub mod sql_standard;

pub use arithmetic::Arithmetic;
pub use sql_standard::{DryRunRunner, QueryResult, SqlRunner, SqlStandard};

use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::rewrite::{Fixpoint, Fold, Repeat, Sequence};
use crate::types::Literal;
use log::debug;

/// Operations every backend provides
pub trait Backend: Send + Sync {
    /// Compiled form, e.g. SQL text
    type Output;
    /// Materialized result of running the compiled form
    type Result;

    /// Establish substrate resources. Safe to call more than once, and
    /// never required before `compile`.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn compile(&self, expr: &Expr) -> Result<Self::Output>;

    fn execute(&self, expr: &Expr) -> Result<Self::Result>;
}

/// Fixpoint rewriter shared by all backends
pub struct Compiler {
    strategy: Repeat<Fold<Sequence>>,
}

impl Compiler {
    pub fn new(rules: Sequence, config: RewriteConfig) -> Self {
        debug!(
            "Compiler with {} rule(s), max {} pass(es)",
            rules.len(),
            config.max_iterations
        );
        Self {
            strategy: Repeat::with_config(Fold::new(rules), config),
        }
    }

    pub fn rules(&self) -> &Sequence {
        self.strategy.inner().inner()
    }

    pub fn config(&self) -> &RewriteConfig {
        self.strategy.config()
    }

    /// Rewrite `expr` to a fixpoint without requiring a terminal result
    pub fn rewrite(&self, expr: &Expr) -> Result<Fixpoint> {
        self.strategy.run(expr)
    }

    /// Rewrite `expr` to a terminal value
    pub fn compile(&self, expr: &Expr) -> Result<Literal> {
        let fixpoint = self.rewrite(expr)?;
        debug!("Compiled in {} pass(es)", fixpoint.passes);
        match fixpoint.expr {
            Expr::Literal(literal) => Ok(literal),
            unresolved => Err(unresolved_error(&unresolved)),
        }
    }
}

/// Leftmost node that no rule could rewrite even though all of its
/// arguments are terminal
fn stuck_node(expr: &Expr) -> Option<&Expr> {
    let mut pending = vec![expr];
    while let Some(current) = pending.pop() {
        if current.is_terminal() {
            continue;
        }
        if current.args().iter().all(Expr::is_terminal) {
            return Some(current);
        }
        pending.extend(current.args().iter().rev());
    }
    None
}

fn unresolved_error(root: &Expr) -> Error {
    let node = stuck_node(root).unwrap_or(root);
    Error::UnresolvedExpression {
        operation: node
            .operation()
            .map(|operation| operation.to_string())
            .unwrap_or_default(),
        argument_categories: node
            .args()
            .iter()
            .map(|arg| arg.categories().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{int32, string, BinaryOperator};
    use crate::registry::OperatorRegistry;
    use crate::rewrite::{produce, rule};

    fn unwrap_integers() -> Sequence {
        Sequence::default().with_rule(rule("unwrap_integer", |expr| {
            let (_, value) = expr.as_scalar()?;
            value.as_int()?;
            produce(move || Expr::Literal(value.clone()))
        }))
    }

    #[test]
    fn test_compile_terminal_root() -> Result<()> {
        let compiler = Compiler::new(unwrap_integers(), RewriteConfig::default());
        assert_eq!(compiler.compile(&int32(7))?, Literal::Int(7));
        assert_eq!(compiler.compile(&Expr::literal(3))?, Literal::Int(3));
        assert_eq!(compiler.rules().len(), 1);
        Ok(())
    }

    #[test]
    fn test_unresolved_names_stuck_node() -> Result<()> {
        let registry = OperatorRegistry::standard()?;
        let compiler = Compiler::new(unwrap_integers(), RewriteConfig::default());
        let inner = registry.pow(int32(2), int32(3))?;
        let expr = registry.eq(inner, string("x"))?;

        let err = compiler.compile(&expr).unwrap_err();
        assert_eq!(
            err,
            Error::UnresolvedExpression {
                operation: BinaryOperator::Power.to_string(),
                argument_categories: vec![
                    "Value|Scalar|Numeric|Integer".to_string(),
                    "Value|Scalar|Numeric|Integer".to_string(),
                ],
            }
        );
        Ok(())
    }

    #[test]
    fn test_unresolved_falls_back_to_root() {
        let expr = Expr::function("opaque", vec![], crate::types::Categories::STRING);
        let compiler = Compiler::new(Sequence::default(), RewriteConfig::default());
        let err = compiler.compile(&expr).unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedExpression { ref operation, .. } if operation == "opaque"
        ));
    }

    #[test]
    fn test_rewrite_reports_passes() -> Result<()> {
        let compiler = Compiler::new(unwrap_integers(), RewriteConfig::default());
        let fixpoint = compiler.rewrite(&int32(1))?;
        assert_eq!(fixpoint.passes, 2);
        assert_eq!(fixpoint.expr, Expr::literal(1));
        Ok(())
    }
}
