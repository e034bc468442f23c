//! Raw literal values.

use crate::schema::TableSchema;
use crate::types::Categories;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::sync::Arc;

/// Target text produced by a backend, with the binding strength of its
/// outermost operator so enclosing fragments know when to parenthesize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rendered {
    pub text: String,
    pub precedence: u8,
}

impl Rendered {
    /// Binding strength of an indivisible fragment (names, numbers)
    pub const ATOM: u8 = u8::MAX;

    pub fn new(text: impl Into<String>, precedence: u8) -> Self {
        Self {
            text: text.into(),
            precedence,
        }
    }

    pub fn atom(text: impl Into<String>) -> Self {
        Self::new(text, Self::ATOM)
    }
}

/// Terminal value appearing as a node argument or as a compile result
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    List(Vec<Literal>),
    Schema(Arc<TableSchema>),
    Rendered(Rendered),
}

impl Literal {
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Literal::Text(s) => Some(s),
            Literal::Rendered(r) => Some(&r.text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Categories a raw value would have as a scalar operand.
    ///
    /// Raw literals never receive dispatch on their own; these tags are
    /// used only to check operand legality and derive result categories.
    pub fn categories(&self) -> Categories {
        let tags = match self {
            Literal::Null => Categories::VALUE | Categories::SCALAR,
            Literal::Boolean(_) => Categories::SCALAR | Categories::BOOLEAN,
            Literal::Int(_) => Categories::SCALAR | Categories::INTEGER,
            Literal::Float(_) => Categories::SCALAR | Categories::FLOATING,
            Literal::Decimal(_) => Categories::SCALAR | Categories::DECIMAL,
            Literal::Text(_) => Categories::SCALAR | Categories::STRING,
            Literal::Date(_) => Categories::SCALAR | Categories::DATE,
            Literal::Time(_) => Categories::SCALAR | Categories::TIME,
            Literal::Timestamp(_) => Categories::SCALAR | Categories::TIMESTAMP,
            Literal::List(_) | Literal::Schema(_) | Literal::Rendered(_) => Categories::empty(),
        };
        tags.closure()
    }

    /// Display form used inside structural expression output: strings
    /// are quoted so they can be told apart from node names.
    pub fn repr(&self) -> String {
        match self {
            Literal::Text(s) => format!("{:?}", s),
            Literal::List(items) => format!(
                "[{}]",
                items.iter().map(|i| i.repr()).collect::<Vec<_>>().join(", ")
            ),
            Literal::Schema(schema) => format!("schema({})", schema.summary()),
            other => other.to_string(),
        }
    }
}

/// Format a float so it always reads back as a float: integral values
/// keep a trailing `.0` and large magnitudes use exponent form
pub(crate) fn format_float(value: f64) -> String {
    if !value.is_finite() {
        format!("{}", value)
    } else if value.abs() >= 1e16 {
        format!("{:e}", value)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", format_float(*v)),
            Literal::Decimal(d) => write!(f, "{}", d),
            Literal::Text(s) => write!(f, "{}", s),
            Literal::Date(d) => write!(f, "{}", d),
            Literal::Time(t) => write!(f, "{}", t),
            Literal::Timestamp(ts) => write!(f, "{}", ts),
            Literal::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Literal::Schema(schema) => write!(f, "{}", schema.summary()),
            Literal::Rendered(r) => write!(f, "{}", r.text),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value as i64)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<Rendered> for Literal {
    fn from(value: Rendered) -> Self {
        Literal::Rendered(value)
    }
}
