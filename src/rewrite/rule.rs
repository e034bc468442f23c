//! Rewrite rules.

use crate::expression::Expr;
use std::fmt;

/// Deferred replacement for a matched node; only invoked once the match
/// has succeeded.
pub type Production<'e> = Box<dyn FnOnce() -> Expr + 'e>;

/// Wrap a replacement-producing closure as a successful match
pub fn produce<'e, F>(f: F) -> Option<Production<'e>>
where
    F: FnOnce() -> Expr + 'e,
{
    Some(Box::new(f))
}

/// A single pattern-matching transformation of one node.
///
/// Rules only look one level deep: when a rule sees a node its children
/// have already been rewritten. Matching and production must be free of
/// side effects, so one rule set can serve concurrent rewrites.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    /// Check whether `expr` has the shape this rule rewrites and, if so,
    /// return the production of its replacement without running it.
    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>>;
}

/// Rule built from a name and a matching closure
pub struct FnRule<M> {
    name: String,
    matcher: M,
}

impl<M> Rule for FnRule<M>
where
    M: for<'e> Fn(&'e Expr) -> Option<Production<'e>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn try_match<'e>(&self, expr: &'e Expr) -> Option<Production<'e>> {
        (self.matcher)(expr)
    }
}

impl<M> fmt::Debug for FnRule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

/// Build a rule from a closure, e.g.
///
/// ```
/// use vibeql::expression::Expr;
/// use vibeql::rewrite::{produce, rule, Rule};
///
/// let unwrap = rule("unwrap_scalar", |expr| {
///     let (_, value) = expr.as_scalar()?;
///     produce(move || Expr::Literal(value.clone()))
/// });
/// assert_eq!(unwrap.name(), "unwrap_scalar");
/// ```
pub fn rule<M>(name: impl Into<String>, matcher: M) -> FnRule<M>
where
    M: for<'e> Fn(&'e Expr) -> Option<Production<'e>> + Send + Sync,
{
    FnRule {
        name: name.into(),
        matcher,
    }
}
