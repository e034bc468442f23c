//! Value types and capability categories.
//!
//! This module provides:
//! - **TypeName**: the column types a schema descriptor can declare
//! - **Categories**: the capability tags an expression node carries
//! - **Literal**: raw terminal values (arguments and compile outputs)

pub mod category;
pub mod data_type;
pub mod literal;

pub use category::{Categories, Shape};
pub use data_type::TypeName;
pub use literal::{Literal, Rendered};
