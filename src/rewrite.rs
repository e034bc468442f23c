//! Rule-based rewriting of expression trees.
//!
//! This module provides:
//! - **Rule**: matches one node and defers production of its replacement
//! - **Sequence**: tries rules in order on one node, first match wins
//! - **Fold**: applies a strategy to every node bottom-up, one pass
//! - **Repeat**: re-applies a strategy until a pass changes nothing
//!
//! Rule sets are not guaranteed to be confluent. When several rules could
//! rewrite the same node, registration order decides.

pub mod rule;
pub mod strategy;

pub use rule::{produce, rule, FnRule, Production, Rule};
pub use strategy::{Fixpoint, Fold, Repeat, Sequence, Strategy, Transformed};
