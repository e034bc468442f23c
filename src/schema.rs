//! Table schemas and table references.
//!
//! A schema descriptor maps column names to `{type, nullable}` and is the
//! only structured external format the crate reads or writes. Indexing a
//! table expression by column name is validated against it at
//! construction time.

pub mod column;
pub mod table;

pub use column::ColumnDescriptor;
pub use table::{Table, TableSchema, TableSchemaBuilder};
