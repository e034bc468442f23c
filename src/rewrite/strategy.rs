//! Rule composition: Sequence, Fold and Repeat.

use crate::config::RewriteConfig;
use crate::error::{Error, Result};
use crate::expression::Expr;
use crate::rewrite::Rule;
use log::{debug, trace};
use std::sync::Arc;

/// The result of applying a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// The (potentially rewritten) expression.
    pub expr: Expr,
    /// Whether the expression was actually changed.
    pub changed: bool,
}

impl Transformed {
    pub fn yes(expr: Expr) -> Self {
        Self {
            expr,
            changed: true,
        }
    }

    pub fn no(expr: Expr) -> Self {
        Self {
            expr,
            changed: false,
        }
    }
}

impl From<Expr> for Transformed {
    fn from(expr: Expr) -> Self {
        Self::no(expr)
    }
}

/// A rewrite procedure over expressions. Strategies hold no per-call
/// state and may be shared across threads.
pub trait Strategy: Send + Sync {
    fn apply(&self, expr: &Expr) -> Result<Transformed>;
}

/// Tries each rule on a single node; the first match wins
#[derive(Clone, Default)]
pub struct Sequence {
    rules: Vec<Arc<dyn Rule>>,
}

impl Sequence {
    pub fn new(rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }
}

impl Strategy for Sequence {
    fn apply(&self, expr: &Expr) -> Result<Transformed> {
        for rule in &self.rules {
            if let Some(production) = rule.try_match(expr) {
                let replacement = production();
                if replacement == *expr {
                    return Ok(Transformed::no(replacement));
                }
                debug!("Rule '{}' rewrote {}", rule.name(), expr);
                return Ok(Transformed::yes(replacement));
            }
        }
        Ok(Transformed::no(expr.clone()))
    }
}

/// Applies a strategy to every node bottom-up, in one pass.
///
/// Children are rewritten before their parent, so the strategy only ever
/// sees a node whose arguments are already in their rewritten form.
/// Terminal values are passed through as they are.
pub struct Fold<S> {
    inner: S,
}

impl<S: Strategy> Fold<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// A node whose arguments are being rewritten
struct Frame<'a> {
    expr: &'a Expr,
    args: Vec<Expr>,
    changed: bool,
}

impl<'a> Frame<'a> {
    fn new(expr: &'a Expr) -> Self {
        Self {
            expr,
            args: Vec::with_capacity(expr.args().len()),
            changed: false,
        }
    }
}

impl<S: Strategy> Fold<S> {
    fn rewrite_node(&self, frame: Frame<'_>) -> Result<Transformed> {
        let node = if frame.changed {
            frame.expr.with_args(frame.args)
        } else {
            frame.expr.clone()
        };
        let result = self.inner.apply(&node)?;
        Ok(Transformed {
            changed: frame.changed || result.changed,
            expr: result.expr,
        })
    }
}

impl<S: Strategy> Strategy for Fold<S> {
    fn apply(&self, expr: &Expr) -> Result<Transformed> {
        if expr.is_terminal() {
            return Ok(Transformed::no(expr.clone()));
        }

        // Explicit stack of ancestors; tree depth never reaches the call stack
        let mut current = Frame::new(expr);
        let mut ancestors: Vec<Frame<'_>> = Vec::new();
        loop {
            let node = current.expr;
            if let Some(arg) = node.args().get(current.args.len()) {
                if arg.is_terminal() {
                    current.args.push(arg.clone());
                } else {
                    ancestors.push(std::mem::replace(&mut current, Frame::new(arg)));
                }
                continue;
            }

            let rewritten = self.rewrite_node(current)?;
            match ancestors.pop() {
                Some(parent) => {
                    current = parent;
                    current.changed |= rewritten.changed;
                    current.args.push(rewritten.expr);
                }
                None => return Ok(rewritten),
            }
        }
    }
}

/// Outcome of a fixpoint rewrite
#[derive(Debug, Clone, PartialEq)]
pub struct Fixpoint {
    pub expr: Expr,
    /// Whether any pass changed the tree
    pub changed: bool,
    /// Number of passes run, including the one that changed nothing
    pub passes: usize,
}

/// Re-applies a strategy until a pass changes nothing
pub struct Repeat<S> {
    inner: S,
    config: RewriteConfig,
}

impl<S: Strategy> Repeat<S> {
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, RewriteConfig::default())
    }

    pub fn with_config(inner: S, config: RewriteConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Rewrite to a fixpoint, failing once the pass ceiling is exceeded.
    /// A ceiling below one still runs one pass.
    pub fn run(&self, expr: &Expr) -> Result<Fixpoint> {
        let mut current = expr.clone();
        let mut changed = false;

        let max_iterations = self.config.max_iterations.max(1);
        for pass in 1..=max_iterations {
            let result = self.inner.apply(&current)?;
            if !result.changed {
                debug!("No changes in pass {}, reached fixpoint", pass);
                return Ok(Fixpoint {
                    expr: result.expr,
                    changed,
                    passes: pass,
                });
            }

            changed = true;
            current = result.expr;
            if self.config.trace {
                trace!("Pass {}: {}", pass, current);
            }
        }

        Err(Error::NonTerminatingRewrite {
            iterations: max_iterations,
            last: current.to_string(),
        })
    }
}

impl<S: Strategy> Strategy for Repeat<S> {
    fn apply(&self, expr: &Expr) -> Result<Transformed> {
        let fixpoint = self.run(expr)?;
        Ok(Transformed {
            expr: fixpoint.expr,
            changed: fixpoint.changed,
        })
    }
}
