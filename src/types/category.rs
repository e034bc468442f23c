//! Capability categories carried by expression nodes.
//!
//! Categories form a flat tag set with multiple membership: an integer
//! column is `Value | Column | Numeric | Integer`. Some tags imply others
//! (every `Integer` is `Numeric`, every `Numeric` is a `Value`) and some
//! exclude each other (nothing is both a `Scalar` and a `Column`).

use crate::types::TypeName;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Capability tags of an expression node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Categories: u16 {
        const VALUE = 1 << 0;
        const TABLE = 1 << 1;
        const SCALAR = 1 << 2;
        const COLUMN = 1 << 3;
        const NUMERIC = 1 << 4;
        const BOOLEAN = 1 << 5;
        const INTEGER = 1 << 6;
        const FLOATING = 1 << 7;
        const DECIMAL = 1 << 8;
        const STRING = 1 << 9;
        const TEMPORAL = 1 << 10;
        const DATE = 1 << 11;
        const TIME = 1 << 12;
        const TIMESTAMP = 1 << 13;
        const PSEUDO_COLUMN = 1 << 14;
    }
}

const LABELS: &[(Categories, &str)] = &[
    (Categories::VALUE, "Value"),
    (Categories::TABLE, "Table"),
    (Categories::SCALAR, "Scalar"),
    (Categories::COLUMN, "Column"),
    (Categories::NUMERIC, "Numeric"),
    (Categories::BOOLEAN, "Boolean"),
    (Categories::INTEGER, "Integer"),
    (Categories::FLOATING, "Floating"),
    (Categories::DECIMAL, "Decimal"),
    (Categories::STRING, "String"),
    (Categories::TEMPORAL, "Temporal"),
    (Categories::DATE, "Date"),
    (Categories::TIME, "Time"),
    (Categories::TIMESTAMP, "Timestamp"),
    (Categories::PSEUDO_COLUMN, "PseudoColumn"),
];

/// Groups of tags of which a node may carry at most one
const EXCLUSIVE: &[Categories] = &[
    Categories::VALUE.union(Categories::TABLE),
    Categories::SCALAR.union(Categories::COLUMN),
    Categories::NUMERIC
        .union(Categories::BOOLEAN)
        .union(Categories::STRING)
        .union(Categories::TEMPORAL),
    Categories::INTEGER
        .union(Categories::FLOATING)
        .union(Categories::DECIMAL),
    Categories::DATE
        .union(Categories::TIME)
        .union(Categories::TIMESTAMP),
];

/// Whether a value denotes a single scalar or a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Column,
}

impl Shape {
    pub fn categories(&self) -> Categories {
        match self {
            Shape::Scalar => Categories::SCALAR,
            Shape::Column => Categories::COLUMN,
        }
    }
}

impl Categories {
    /// Type tags for a schema type, without shape or `Value`
    pub fn for_type(type_name: TypeName) -> Categories {
        match type_name {
            TypeName::Bool => Categories::BOOLEAN,
            TypeName::Int8 | TypeName::Int16 | TypeName::Int32 | TypeName::Int64 => {
                Categories::NUMERIC | Categories::INTEGER
            }
            TypeName::Float16 | TypeName::Float32 | TypeName::Float64 => {
                Categories::NUMERIC | Categories::FLOATING
            }
            TypeName::Decimal => Categories::NUMERIC | Categories::DECIMAL,
            TypeName::Date => Categories::TEMPORAL | Categories::DATE,
            TypeName::Time => Categories::TEMPORAL | Categories::TIME,
            TypeName::Timestamp => Categories::TEMPORAL | Categories::TIMESTAMP,
            TypeName::Rowid => {
                Categories::NUMERIC | Categories::INTEGER | Categories::PSEUDO_COLUMN
            }
            TypeName::String => Categories::STRING,
        }
    }

    /// Full tag set of a value of `type_name` with the given shape
    pub fn value_of(type_name: TypeName, shape: Shape) -> Categories {
        (Categories::for_type(type_name) | shape.categories()).closure()
    }

    /// Add every tag implied by the tags already present
    pub fn closure(self) -> Categories {
        let mut tags = self;
        if tags.contains(Categories::PSEUDO_COLUMN) {
            tags |= Categories::COLUMN;
        }
        if tags.intersects(Categories::INTEGER | Categories::FLOATING | Categories::DECIMAL) {
            tags |= Categories::NUMERIC;
        }
        if tags.intersects(Categories::DATE | Categories::TIME | Categories::TIMESTAMP) {
            tags |= Categories::TEMPORAL;
        }
        if tags.intersects(
            Categories::SCALAR
                | Categories::COLUMN
                | Categories::NUMERIC
                | Categories::BOOLEAN
                | Categories::STRING
                | Categories::TEMPORAL,
        ) {
            tags |= Categories::VALUE;
        }
        tags
    }

    /// Whether some node could carry all of these tags at once
    pub fn is_consistent(&self) -> bool {
        let tags = self.closure();
        EXCLUSIVE
            .iter()
            .all(|group| tags.intersection(*group).bits().count_ones() <= 1)
    }

    /// Number of tags after closure; more tags means a narrower category
    pub fn specificity(&self) -> u32 {
        self.closure().bits().count_ones()
    }

    pub fn shape(&self) -> Option<Shape> {
        if self.contains(Categories::COLUMN) {
            Some(Shape::Column)
        } else if self.contains(Categories::SCALAR) {
            Some(Shape::Scalar)
        } else {
            None
        }
    }

    /// Human-readable tag names in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect()
    }
}

impl fmt::Display for Categories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_adds_implied_tags() {
        let integer_column = (Categories::COLUMN | Categories::INTEGER).closure();
        assert_eq!(
            integer_column,
            Categories::VALUE | Categories::COLUMN | Categories::NUMERIC | Categories::INTEGER
        );

        let rowid = Categories::PSEUDO_COLUMN.closure();
        assert!(rowid.contains(Categories::COLUMN | Categories::VALUE));

        assert_eq!(Categories::TABLE.closure(), Categories::TABLE);
    }

    #[test]
    fn test_consistency() {
        assert!((Categories::COLUMN | Categories::INTEGER).is_consistent());
        assert!(!(Categories::COLUMN | Categories::SCALAR).is_consistent());
        assert!(!(Categories::TABLE | Categories::NUMERIC).is_consistent());
        assert!(!(Categories::INTEGER | Categories::FLOATING).is_consistent());
        assert!(!(Categories::BOOLEAN | Categories::INTEGER).is_consistent());
        assert!(Categories::empty().is_consistent());
    }

    #[test]
    fn test_specificity() {
        let integer_column = Categories::COLUMN | Categories::INTEGER;
        assert!(integer_column.specificity() > Categories::NUMERIC.specificity());
        assert_eq!(Categories::VALUE.specificity(), 1);
        assert_eq!(Categories::NUMERIC.specificity(), 2);
    }

    #[test]
    fn test_value_of_type() {
        let amount = Categories::value_of(TypeName::Float64, Shape::Column);
        assert_eq!(amount.to_string(), "Value|Column|Numeric|Floating");
        assert_eq!(amount.shape(), Some(Shape::Column));

        let scalar = Categories::value_of(TypeName::Int32, Shape::Scalar);
        assert_eq!(scalar.to_string(), "Value|Scalar|Numeric|Integer");

        let date = Categories::value_of(TypeName::Date, Shape::Scalar);
        assert!(date.contains(Categories::TEMPORAL | Categories::DATE));

        assert_eq!(Categories::empty().to_string(), "None");
        assert_eq!(Categories::TABLE.shape(), None);
    }
}
