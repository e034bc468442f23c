//! Table schema descriptors and table references.

use crate::error::{Error, Result};
use crate::schema::ColumnDescriptor;
use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Ordered mapping from unique column names to column descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<(String, ColumnDescriptor)>,
}

impl TableSchema {
    /// Create a schema, rejecting empty or duplicate column names
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnDescriptor)>,
        S: Into<String>,
    {
        let columns: Vec<(String, ColumnDescriptor)> = columns
            .into_iter()
            .map(|(name, descriptor)| (name.into(), descriptor))
            .collect();
        Self::validate(&columns)?;
        Ok(Self { columns })
    }

    pub fn builder() -> TableSchemaBuilder {
        TableSchemaBuilder::default()
    }

    fn validate(columns: &[(String, ColumnDescriptor)]) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, _) in columns {
            if name.is_empty() {
                return Err(Error::InvalidSchema {
                    reason: "column name must not be empty".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidSchema {
                    reason: format!("duplicate column name '{}'", name),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, descriptor)| descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDescriptor)> {
        self.columns
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Names from `requested` that this schema does not define, in request order
    pub fn missing<'a>(&self, requested: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        requested
            .into_iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Narrow the schema to `names`, in the order given.
    ///
    /// `table` is only used to label the error listing every missing name.
    pub fn select(&self, table: &str, names: &[&str]) -> Result<TableSchema> {
        let missing = self.missing(names.iter().copied());
        if !missing.is_empty() {
            return Err(Error::Schema {
                table: table.to_string(),
                missing,
            });
        }
        TableSchema::new(
            names
                .iter()
                .filter_map(|name| self.get(name).map(|descriptor| (*name, *descriptor))),
        )
    }

    /// One-line form: `id: int64, amount: float64?`
    pub fn summary(&self) -> String {
        self.columns
            .iter()
            .map(|(name, descriptor)| {
                format!(
                    "{}: {}{}",
                    name,
                    descriptor.data_type,
                    if descriptor.nullable { "?" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Encode the descriptor in its persisted binary form
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a persisted descriptor, re-checking column name uniqueness
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let schema: TableSchema = bincode::deserialize(data)?;
        Self::validate(&schema.columns)?;
        Ok(schema)
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TableSchema")?;
        for (name, descriptor) in &self.columns {
            writeln!(f, "  {}: {}", name, descriptor)?;
        }
        Ok(())
    }
}

/// Fluent construction of a [`TableSchema`]
#[derive(Debug, Default)]
pub struct TableSchemaBuilder {
    columns: Vec<(String, ColumnDescriptor)>,
}

impl TableSchemaBuilder {
    pub fn column(mut self, name: impl Into<String>, data_type: TypeName, nullable: bool) -> Self {
        self.columns
            .push((name.into(), ColumnDescriptor::new(data_type, nullable)));
        self
    }

    pub fn build(self) -> Result<TableSchema> {
        TableSchema::new(self.columns)
    }
}

/// A leaf table reference: name, schema and optional qualifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schema: Arc<TableSchema>,
    pub database_name: Option<String>,
    pub schema_name: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            name: name.into(),
            schema: Arc::new(schema),
            database_name: None,
            schema_name: None,
        }
    }

    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }

    pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// `database.schema.name`, omitting absent qualifiers
    pub fn qualified_name(&self) -> String {
        qualified_name(
            self.database_name.as_deref(),
            self.schema_name.as_deref(),
            &self.name,
        )
    }
}

/// Join a table name with whichever qualifiers are present
pub fn qualified_name(database: Option<&str>, schema: Option<&str>, name: &str) -> String {
    let mut parts: Vec<&str> = [database, schema].into_iter().flatten().collect();
    parts.push(name);
    parts.join(".")
}
