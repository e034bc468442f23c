//! Column descriptors.

use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type and nullability of one schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "type")]
    pub data_type: TypeName,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(data_type: TypeName, nullable: bool) -> Self {
        Self {
            data_type,
            nullable,
        }
    }

    pub fn not_null(data_type: TypeName) -> Self {
        Self::new(data_type, false)
    }

    pub fn nullable(data_type: TypeName) -> Self {
        Self::new(data_type, true)
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.data_type,
            if self.nullable {
                "nullable"
            } else {
                "non-nullable"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_descriptor_display() {
        assert_eq!(
            ColumnDescriptor::not_null(TypeName::Int64).to_string(),
            "int64(non-nullable)"
        );
        assert_eq!(
            ColumnDescriptor::nullable(TypeName::Float64).to_string(),
            "float64(nullable)"
        );
    }
}
