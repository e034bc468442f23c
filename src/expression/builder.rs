//! Constructors for scalar, table, projection and column nodes.

use crate::error::{Error, Result};
use crate::expression::node::{Expr, Operation};
use crate::schema::{Table, TableSchema};
use crate::types::{Categories, Literal, Shape, TypeName};
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

fn scalar(type_name: TypeName, value: Literal) -> Expr {
    Expr::node(
        Operation::Scalar(type_name),
        vec![Expr::Literal(value)],
        Categories::value_of(type_name, Shape::Scalar),
    )
}

pub fn boolean(value: bool) -> Expr {
    scalar(TypeName::Bool, Literal::Boolean(value))
}

pub fn int8(value: i8) -> Expr {
    scalar(TypeName::Int8, Literal::Int(value.into()))
}

pub fn int16(value: i16) -> Expr {
    scalar(TypeName::Int16, Literal::Int(value.into()))
}

pub fn int32(value: i32) -> Expr {
    scalar(TypeName::Int32, Literal::Int(value.into()))
}

pub fn int64(value: i64) -> Expr {
    scalar(TypeName::Int64, Literal::Int(value))
}

/// Half precision has no native host type; the value is kept as `f32`
pub fn float16(value: f32) -> Expr {
    scalar(TypeName::Float16, Literal::Float(value.into()))
}

pub fn float32(value: f32) -> Expr {
    scalar(TypeName::Float32, Literal::Float(value.into()))
}

pub fn float64(value: f64) -> Expr {
    scalar(TypeName::Float64, Literal::Float(value))
}

pub fn decimal(value: BigDecimal) -> Expr {
    scalar(TypeName::Decimal, Literal::Decimal(value))
}

pub fn string(value: impl Into<String>) -> Expr {
    scalar(TypeName::String, Literal::Text(value.into()))
}

pub fn date(value: NaiveDate) -> Expr {
    scalar(TypeName::Date, Literal::Date(value))
}

pub fn time(value: NaiveTime) -> Expr {
    scalar(TypeName::Time, Literal::Time(value))
}

pub fn timestamp(value: NaiveDateTime) -> Expr {
    scalar(TypeName::Timestamp, Literal::Timestamp(value))
}

fn optional_text(value: &Option<String>) -> Expr {
    match value {
        Some(text) => Expr::Literal(Literal::Text(text.clone())),
        None => Expr::Literal(Literal::Null),
    }
}

/// Leaf node for a table reference.
///
/// Arguments: name, schema, database name, schema name (absent
/// qualifiers are `NULL`).
pub fn table(table: &Table) -> Expr {
    Expr::node(
        Operation::Table,
        vec![
            Expr::Literal(Literal::Text(table.name.clone())),
            Expr::Literal(Literal::Schema(Arc::clone(&table.schema))),
            optional_text(&table.database_name),
            optional_text(&table.schema_name),
        ],
        Categories::TABLE,
    )
}

impl From<&Table> for Expr {
    fn from(value: &Table) -> Self {
        table(value)
    }
}

impl Expr {
    /// Schema of a table or projection node
    pub fn table_schema(&self) -> Option<&Arc<TableSchema>> {
        let schema_arg = match self.operation()? {
            Operation::Table => self.args().get(1)?,
            Operation::Projection => self.args().get(2)?,
            _ => return None,
        };
        match schema_arg {
            Expr::Literal(Literal::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Name of the table a table, projection or column node reads from
    pub fn source_name(&self) -> Option<&str> {
        match self.operation()? {
            Operation::Table => self.args().first()?.as_literal()?.as_text(),
            Operation::Projection | Operation::Column => self.args().first()?.source_name(),
            _ => None,
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match self.operation()? {
            Operation::Column => self.args().get(1)?.as_literal()?.as_text(),
            _ => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self.operation()? {
            Operation::Column => self.args().get(2)?.as_literal()?.as_text(),
            _ => None,
        }
    }

    /// Column names selected by a projection node, in order
    pub fn projected_names(&self) -> Option<Vec<&str>> {
        match (self.operation()?, self.args().get(1)?) {
            (Operation::Projection, Expr::Literal(Literal::List(names))) => {
                Some(names.iter().filter_map(|name| name.as_text()).collect())
            }
            _ => None,
        }
    }

    fn require_table_like(&self, operator: &str) -> Result<&Arc<TableSchema>> {
        self.table_schema()
            .ok_or_else(|| Error::UnsupportedOperation {
                operator: operator.to_string(),
                categories: category_names(self.categories()),
            })
    }

    /// Index a table-like node by a single column name.
    ///
    /// An unknown name fails here, before any rewriting takes place.
    pub fn column(&self, name: &str) -> Result<Expr> {
        let schema = self.require_table_like("getitem")?;
        let descriptor = schema.get(name).ok_or_else(|| Error::Schema {
            table: self.source_name().unwrap_or_default().to_string(),
            missing: vec![name.to_string()],
        })?;
        Ok(Expr::node(
            Operation::Column,
            vec![
                self.clone(),
                Expr::Literal(Literal::text(name)),
                Expr::Literal(Literal::Null),
            ],
            Categories::value_of(descriptor.data_type, Shape::Column),
        ))
    }

    /// Select a subset of columns; every missing name is reported at once
    pub fn project(&self, names: &[&str]) -> Result<Expr> {
        let schema = self.require_table_like("getitem")?;
        let narrowed = schema.select(self.source_name().unwrap_or_default(), names)?;
        Ok(Expr::node(
            Operation::Projection,
            vec![
                self.clone(),
                Expr::Literal(Literal::List(
                    names.iter().map(|name| Literal::text(*name)).collect(),
                )),
                Expr::Literal(Literal::Schema(Arc::new(narrowed))),
            ],
            Categories::TABLE,
        ))
    }

    /// Display rename of a column node
    pub fn with_alias(&self, alias: &str) -> Result<Expr> {
        match self.operation() {
            Some(Operation::Column) => {
                let mut args = self.args().to_vec();
                args[2] = Expr::Literal(Literal::text(alias));
                Ok(self.with_args(args))
            }
            _ => Err(Error::UnsupportedOperation {
                operator: "alias".to_string(),
                categories: category_names(self.categories()),
            }),
        }
    }
}

pub(crate) fn category_names(categories: Categories) -> Vec<String> {
    categories.names().into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn orders() -> Table {
        let schema = TableSchema::builder()
            .column("id", TypeName::Int64, false)
            .column("amount", TypeName::Float64, true)
            .column("note", TypeName::String, true)
            .column("rid", TypeName::Rowid, false)
            .build()
            .unwrap();
        Table::new("orders", schema)
    }

    #[test]
    fn test_scalar_constructors() {
        let two = int32(2);
        assert_eq!(two.to_string(), "int32(2)");
        assert_eq!(two.categories().to_string(), "Value|Scalar|Numeric|Integer");

        assert!(float16(1.5).categories().contains(Categories::FLOATING));
        assert!(float32(1.5).categories().contains(Categories::FLOATING));
        assert!(boolean(true).categories().contains(Categories::BOOLEAN));
        assert!(string("a").categories().contains(Categories::STRING));
        assert!(decimal(BigDecimal::from_str("1.5").unwrap())
            .categories()
            .contains(Categories::DECIMAL | Categories::NUMERIC));

        let day = date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(day.categories().contains(Categories::TEMPORAL | Categories::DATE));
        assert_eq!(
            day.as_scalar().map(|(type_name, _)| type_name),
            Some(TypeName::Date)
        );
        assert_eq!(int8(-3).as_scalar(), Some((TypeName::Int8, &Literal::Int(-3))));
        assert_eq!(int16(7).to_string(), "int16(7)");
        assert_eq!(int64(7).to_string(), "int64(7)");
    }

    #[test]
    fn test_table_node() {
        let table = table(&orders().with_database("shop"));
        assert_eq!(table.operation(), Some(&Operation::Table));
        assert_eq!(table.categories(), Categories::TABLE);
        assert_eq!(table.source_name(), Some("orders"));
        assert_eq!(table.table_schema().map(|s| s.len()), Some(4));
        assert_eq!(table.args()[2], Expr::literal("shop"));
        assert_eq!(table.args()[3], Expr::Literal(Literal::Null));
    }

    #[test]
    fn test_column_categories_follow_schema() -> Result<()> {
        let orders = table(&orders());

        let amount = orders.column("amount")?;
        assert_eq!(
            amount.categories().to_string(),
            "Value|Column|Numeric|Floating"
        );
        assert_eq!(amount.column_name(), Some("amount"));
        assert_eq!(amount.source_name(), Some("orders"));
        assert_eq!(amount.alias(), None);

        let note = orders.column("note")?;
        assert!(note.categories().contains(Categories::STRING));

        let rid = orders.column("rid")?;
        assert!(rid
            .categories()
            .contains(Categories::PSEUDO_COLUMN | Categories::INTEGER));
        Ok(())
    }

    #[test]
    fn test_unknown_column_fails_at_construction() {
        let orders = table(&orders());
        let err = orders.column("missing").unwrap_err();
        assert_eq!(
            err,
            Error::Schema {
                table: "orders".to_string(),
                missing: vec!["missing".to_string()],
            }
        );

        let err = orders.project(&["id", "nope", "gone"]).unwrap_err();
        assert!(matches!(err, Error::Schema { ref missing, .. } if missing == &["nope", "gone"]));
    }

    #[test]
    fn test_projection_narrows_schema() -> Result<()> {
        let orders = table(&orders());
        let projected = orders.project(&["amount", "id"])?;
        assert_eq!(projected.categories(), Categories::TABLE);
        assert_eq!(projected.projected_names(), Some(vec!["amount", "id"]));
        assert_eq!(projected.source_name(), Some("orders"));

        let id = projected.column("id")?;
        assert!(id.categories().contains(Categories::INTEGER));
        assert!(matches!(
            projected.column("note"),
            Err(Error::Schema { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_indexing_requires_table() {
        let err = int32(1).column("x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { ref operator, .. } if operator == "getitem"));
    }

    #[test]
    fn test_with_alias() -> Result<()> {
        let amount = table(&orders()).column("amount")?.with_alias("total")?;
        assert_eq!(amount.alias(), Some("total"));
        assert_eq!(amount.column_name(), Some("amount"));
        assert!(int32(1).with_alias("x").is_err());
        Ok(())
    }
}
