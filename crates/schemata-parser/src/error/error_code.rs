//! Error codes for the Schemata diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser and lowering errors
//! - `E2xx` - Content-model normalization errors
//! - `E3xx` - Resolution errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated block comment.
    ///
    /// A `/*` comment was opened but no `*/` follows it.
    E001,

    /// Unexpected character.
    ///
    /// A character was encountered that cannot start any token.
    E002,

    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but not closed on the same line.
    E003,

    /// Unterminated pattern literal.
    E004,

    /// Integer literal out of range.
    E005,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended before a complete declaration was parsed.
    E101,

    /// Unknown property.
    ///
    /// The property name is not defined for the declared structure kind.
    E102,

    /// Invalid property value.
    ///
    /// The value has the wrong shape for the property, for example a list
    /// where a single reference is expected.
    E103,

    /// Duplicate property.
    ///
    /// The same property was given twice in one declaration.
    E104,

    /// Missing property.
    ///
    /// A property the structure kind cannot do without was not given.
    E105,

    // =========================================================================
    // Normalization Errors (E2xx)
    // =========================================================================
    /// Invalid quantifier.
    ///
    /// The quantifier describes an empty or contradictory occurrence range.
    E200,

    /// Ambiguous unordered content.
    ///
    /// A child appears more than once in an unordered group with
    /// different cardinalities.
    E201,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// Undefined reference.
    ///
    /// A name was used that no structure declares.
    E300,

    /// Duplicate reference.
    ///
    /// Two structures share a reference name, or a structure reuses a
    /// built-in type name.
    E301,

    /// Kind mismatch.
    ///
    /// A reference resolves to a structure of a kind the usage does not accept.
    E302,

    /// Cyclic base type.
    ///
    /// A data type's `baseType` chain leads back to itself.
    E303,

    /// Invalid pattern.
    ///
    /// An `allowedPattern` is not a valid regular expression.
    E304,

    /// Invalid constraint.
    ///
    /// Bounds or enumeration values do not fit the data type.
    E305,
}

impl ErrorCode {
    /// Returns the error code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            // Parser errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            // Normalization errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            // Resolution errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer errors
            ErrorCode::E001 => "unterminated block comment",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "unterminated string literal",
            ErrorCode::E004 => "unterminated pattern literal",
            ErrorCode::E005 => "integer literal out of range",
            // Parser errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "unknown property",
            ErrorCode::E103 => "invalid property value",
            ErrorCode::E104 => "duplicate property",
            ErrorCode::E105 => "missing property",
            // Normalization errors
            ErrorCode::E200 => "invalid quantifier",
            ErrorCode::E201 => "ambiguous unordered content",
            // Resolution errors
            ErrorCode::E300 => "undefined reference",
            ErrorCode::E301 => "duplicate reference",
            ErrorCode::E302 => "kind mismatch",
            ErrorCode::E303 => "cyclic base type",
            ErrorCode::E304 => "invalid pattern",
            ErrorCode::E305 => "invalid constraint",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
