//! Built-in value types.
//!
//! Primitive names occupy the same namespace as declared structures, so a
//! schema cannot declare a structure called `string`.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// A built-in value type usable wherever a data type is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Integer,
    Decimal,
    Boolean,
}

/// Returned when a name does not denote a built-in type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a built-in type")]
pub struct UnknownPrimitive(pub String);

impl Primitive {
    /// Every primitive, in a stable order.
    pub const ALL: [Primitive; 4] = [
        Primitive::String,
        Primitive::Integer,
        Primitive::Decimal,
        Primitive::Boolean,
    ];

    /// The name used for this primitive in schema source.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Integer => "integer",
            Primitive::Decimal => "decimal",
            Primitive::Boolean => "boolean",
        }
    }

    /// Returns `true` for primitives that accept numeric bounds.
    pub fn is_numeric(self) -> bool {
        matches!(self, Primitive::Integer | Primitive::Decimal)
    }

    /// Checks whether `literal` is a valid lexical value of this primitive.
    pub fn accepts(self, literal: &str) -> bool {
        match self {
            Primitive::String => true,
            Primitive::Integer => literal.parse::<i64>().is_ok(),
            Primitive::Decimal => literal.parse::<f64>().is_ok_and(f64::is_finite),
            Primitive::Boolean => matches!(literal, "true" | "false" | "1" | "0"),
        }
    }
}

impl FromStr for Primitive {
    type Err = UnknownPrimitive;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Primitive::ALL
            .into_iter()
            .find(|primitive| primitive.name() == s)
            .ok_or_else(|| UnknownPrimitive(s.to_string()))
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
