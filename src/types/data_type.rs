//! Column type names used by schema descriptors.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Types a schema descriptor can declare for a column
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Decimal,
    Date,
    Time,
    Timestamp,
    Rowid,
    String,
}
