//! Error values shared across the validator and the schema generator.
//!
//! `ValidationError` is a plain value object: a root-to-leaf path, a symbolic
//! code, and a rendered message. Expected validation failures always travel as
//! `Result::Err`; panics are reserved for contract violations (malformed type
//! definitions), and `SchemaError` covers recoverable generation faults.

use std::fmt;

use serde::ser::{Serialize, Serializer};
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// PATHS
// ————————————————————————————————————————————————————————————————————————————

/// One step of a validation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object field or map entry name.
    Field(String),
    /// Array/tuple position.
    Index(usize),
    /// Marker for a failing map *key* (as opposed to the value under it).
    Key,
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::Key => write!(f, "__key__"),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Field(name) => ser.serialize_str(name),
            PathSegment::Index(i) => ser.serialize_u64(*i as u64),
            PathSegment::Key => ser.serialize_str("__key__"),
        }
    }
}

/// Render a path as a dotted/bracketed string for display: `items[2].name`.
pub fn path_to_string(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for seg in path {
        match seg {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathSegment::Key => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str("__key__");
            }
        }
    }
    if out.is_empty() { "(root)".to_string() } else { out }
}

// ————————————————————————————————————————————————————————————————————————————
// CODES
// ————————————————————————————————————————————————————————————————————————————

/// Symbolic error code: base-type mismatches, one tag per constraint, plus the
/// codes that flow through from the external multi-stage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Type,
    Required,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    Gt,
    Lt,
    Gteq,
    Lteq,
    /// Pattern constraint failures.
    Format,
    /// `one_of` constraint failures.
    Choices,
    CustomValidation,
    ModelValidation,
    ComputedField,
    AdditionalProperties,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Type => "type",
            ErrorCode::Required => "required",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MaxLength => "max_length",
            ErrorCode::MinItems => "min_items",
            ErrorCode::MaxItems => "max_items",
            ErrorCode::Gt => "gt",
            ErrorCode::Lt => "lt",
            ErrorCode::Gteq => "gteq",
            ErrorCode::Lteq => "lteq",
            ErrorCode::Format => "format",
            ErrorCode::Choices => "choices",
            ErrorCode::CustomValidation => "custom_validation",
            ErrorCode::ModelValidation => "model_validation",
            ErrorCode::ComputedField => "computed_field",
            ErrorCode::AdditionalProperties => "additional_properties",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// Immutable record of one validation failure.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationError {
    pub path: Vec<PathSegment>,
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: Vec<PathSegment>, code: ErrorCode, message: impl Into<String>) -> Self {
        ValidationError { path, code, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.code, path_to_string(&self.path), self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Faults of the schema-generation driver itself, distinct from validation
/// failures of input values.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A `NamedRef` identifier the resolver does not know.
    #[error("unknown named type `{0}`")]
    UnknownType(String),
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
