//! Read-only views of an expression tree for debugging and visualization.

use crate::expression::node::Expr;
use std::fmt::Write;

impl Expr {
    /// Visit every node and literal in pre-order with its depth
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Expr, usize),
    {
        let mut pending = vec![(self, 0)];
        while let Some((expr, depth)) = pending.pop() {
            visit(expr, depth);
            pending.extend(expr.args().iter().rev().map(|arg| (arg, depth + 1)));
        }
    }

    /// Number of constructor nodes in the tree, literals excluded
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |expr, _| {
            if !expr.is_terminal() {
                count += 1;
            }
        });
        count
    }

    /// Indented tree, one line per node:
    ///
    /// ```text
    /// Add [Value|Column|Numeric|Floating]
    ///   Column [Value|Column|Numeric|Floating]
    ///   ...
    /// ```
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |expr, depth| {
            let indent = "  ".repeat(depth);
            match expr {
                Expr::Literal(literal) => {
                    let _ = writeln!(out, "{}{}", indent, literal.repr());
                }
                Expr::Node(node) => {
                    let _ = writeln!(
                        out,
                        "{}{} [{}]",
                        indent,
                        node.operation(),
                        node.categories()
                    );
                }
            }
        });
        out
    }

    /// Graphviz rendering of the tree; nodes are numbered in pre-order
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph expression {\n");
        let mut parents: Vec<usize> = Vec::new();
        let mut next_id = 0;
        self.walk(&mut |expr, depth| {
            let id = next_id;
            next_id += 1;
            let label = match expr {
                Expr::Literal(literal) => literal.repr(),
                Expr::Node(node) => node.operation().to_string(),
            };
            let shape = if expr.is_terminal() { "box" } else { "ellipse" };
            let _ = writeln!(
                out,
                "  n{} [label={:?}, shape={}];",
                id, label, shape
            );
            parents.truncate(depth);
            if let Some(parent) = parents.last() {
                let _ = writeln!(out, "  n{} -> n{};", parent, id);
            }
            parents.push(id);
        });
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::node::{Expr, Operation};
    use crate::expression::{int32, BinaryOperator};
    use crate::types::Categories;

    fn sum() -> Expr {
        Expr::node(
            Operation::Binary(BinaryOperator::Add),
            vec![int32(1), int32(2)],
            Categories::SCALAR | Categories::INTEGER,
        )
    }

    #[test]
    fn test_walk_is_pre_order() {
        let mut seen = Vec::new();
        sum().walk(&mut |expr, depth| {
            let label = match expr.operation() {
                Some(operation) => operation.to_string(),
                None => expr.to_string(),
            };
            seen.push((label, depth));
        });
        assert_eq!(
            seen,
            vec![
                ("Add".to_string(), 0),
                ("int32".to_string(), 1),
                ("1".to_string(), 2),
                ("int32".to_string(), 1),
                ("2".to_string(), 2),
            ]
        );
        assert_eq!(sum().node_count(), 3);
    }

    #[test]
    fn test_explain() {
        assert_eq!(
            sum().explain(),
            "Add [Value|Scalar|Numeric|Integer]\n\
             \x20 int32 [Value|Scalar|Numeric|Integer]\n\
             \x20   1\n\
             \x20 int32 [Value|Scalar|Numeric|Integer]\n\
             \x20   2\n"
        );
    }

    #[test]
    fn test_to_dot() {
        let dot = sum().to_dot();
        assert!(dot.starts_with("digraph expression {\n"));
        assert!(dot.contains("n0 [label=\"Add\", shape=ellipse];"));
        assert!(dot.contains("n2 [label=\"1\", shape=box];"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("n1 -> n2;"));
        assert!(dot.contains("n0 -> n3;"));
        assert!(dot.contains("n3 -> n4;"));
        assert!(dot.ends_with("}\n"));
    }
}
