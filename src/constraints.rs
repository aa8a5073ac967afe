//! Constraint engine: per-type checks applied to an already-type-checked value.
//!
//! Constraints run in declaration order and fail fast: the first failing check
//! yields exactly one `ValidationError`. `Message` entries form an override
//! side-table keyed by constraint tag, consulted only when that constraint
//! fails. A `Check` (custom predicate) may also *transform* the carried value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::{ErrorCode, PathSegment, ValidationError};

/// Custom predicate: `Ok(Some(v))` replaces the carried value, `Ok(None)`
/// keeps it, `Err(msg)` fails with the caller-supplied message.
pub type CheckFn = Arc<dyn Fn(&Value) -> Result<Option<Value>, String> + Send + Sync>;

#[derive(Clone)]
pub enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    Gt(f64),
    Lt(f64),
    Gteq(f64),
    Lteq(f64),
    Pattern(Regex),
    OneOf(Vec<Value>),
    Check(CheckFn),
    /// Override the failure message of the constraint tagged `tag`.
    Message { tag: ConstraintTag, text: String },
}

/// Tag identifying a constraint kind; keys the message-override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstraintTag {
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    Gt,
    Lt,
    Gteq,
    Lteq,
    Pattern,
    OneOf,
    Check,
}

impl Constraint {
    pub fn check(f: impl Fn(&Value) -> Result<Option<Value>, String> + Send + Sync + 'static) -> Self {
        Constraint::Check(Arc::new(f))
    }

    pub fn message(tag: ConstraintTag, text: impl Into<String>) -> Self {
        Constraint::Message { tag, text: text.into() }
    }

    pub fn tag(&self) -> ConstraintTag {
        match self {
            Constraint::MinLength(_) => ConstraintTag::MinLength,
            Constraint::MaxLength(_) => ConstraintTag::MaxLength,
            Constraint::MinItems(_) => ConstraintTag::MinItems,
            Constraint::MaxItems(_) => ConstraintTag::MaxItems,
            Constraint::Gt(_) => ConstraintTag::Gt,
            Constraint::Lt(_) => ConstraintTag::Lt,
            Constraint::Gteq(_) => ConstraintTag::Gteq,
            Constraint::Lteq(_) => ConstraintTag::Lteq,
            Constraint::Pattern(_) => ConstraintTag::Pattern,
            Constraint::OneOf(_) => ConstraintTag::OneOf,
            Constraint::Check(_) => ConstraintTag::Check,
            Constraint::Message { tag, .. } => *tag,
        }
    }

    fn code(&self) -> ErrorCode {
        match self.tag() {
            ConstraintTag::MinLength => ErrorCode::MinLength,
            ConstraintTag::MaxLength => ErrorCode::MaxLength,
            ConstraintTag::MinItems => ErrorCode::MinItems,
            ConstraintTag::MaxItems => ErrorCode::MaxItems,
            ConstraintTag::Gt => ErrorCode::Gt,
            ConstraintTag::Lt => ErrorCode::Lt,
            ConstraintTag::Gteq => ErrorCode::Gteq,
            ConstraintTag::Lteq => ErrorCode::Lteq,
            ConstraintTag::Pattern => ErrorCode::Format,
            ConstraintTag::OneOf => ErrorCode::Choices,
            ConstraintTag::Check => ErrorCode::CustomValidation,
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MinLength(n) => write!(f, "MinLength({n})"),
            Constraint::MaxLength(n) => write!(f, "MaxLength({n})"),
            Constraint::MinItems(n) => write!(f, "MinItems({n})"),
            Constraint::MaxItems(n) => write!(f, "MaxItems({n})"),
            Constraint::Gt(x) => write!(f, "Gt({x})"),
            Constraint::Lt(x) => write!(f, "Lt({x})"),
            Constraint::Gteq(x) => write!(f, "Gteq({x})"),
            Constraint::Lteq(x) => write!(f, "Lteq({x})"),
            Constraint::Pattern(rx) => write!(f, "Pattern({:?})", rx.as_str()),
            Constraint::OneOf(vs) => write!(f, "OneOf({vs:?})"),
            Constraint::Check(_) => write!(f, "Check(..)"),
            Constraint::Message { tag, text } => write!(f, "Message({tag:?}, {text:?})"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// APPLICATION
// ————————————————————————————————————————————————————————————————————————————

/// Fold `constraints` over `value` (already base-type-checked), short-circuiting
/// on the first failure. Checks whose shape does not match the value pass
/// through; the base-type gate upstream is what pairs constraints with kinds.
pub fn apply_constraints(
    mut value: Value,
    constraints: &[Constraint],
    path: &[PathSegment],
) -> Result<Value, ValidationError> {
    // Collect the override side-table before evaluating anything.
    let mut overrides: BTreeMap<ConstraintTag, &str> = BTreeMap::new();
    for c in constraints {
        if let Constraint::Message { tag, text } = c {
            overrides.insert(*tag, text.as_str());
        }
    }

    for c in constraints {
        let outcome = match c {
            Constraint::Message { .. } => Ok(()),
            Constraint::MinLength(min) => match &value {
                Value::String(s) if s.chars().count() < *min => {
                    Err(format!("string is shorter than the minimum length {min}"))
                }
                _ => Ok(()),
            },
            Constraint::MaxLength(max) => match &value {
                Value::String(s) if s.chars().count() > *max => {
                    Err(format!("string is longer than the maximum length {max}"))
                }
                _ => Ok(()),
            },
            Constraint::MinItems(min) => match item_count(&value) {
                Some(n) if n < *min => Err(format!("expected at least {min} items, got {n}")),
                _ => Ok(()),
            },
            Constraint::MaxItems(max) => match item_count(&value) {
                Some(n) if n > *max => Err(format!("expected at most {max} items, got {n}")),
                _ => Ok(()),
            },
            Constraint::Gt(bound) => match value.as_f64() {
                Some(n) if n <= *bound => Err(format!("value must be greater than {bound}")),
                _ => Ok(()),
            },
            Constraint::Lt(bound) => match value.as_f64() {
                Some(n) if n >= *bound => Err(format!("value must be less than {bound}")),
                _ => Ok(()),
            },
            Constraint::Gteq(bound) => match value.as_f64() {
                Some(n) if n < *bound => {
                    Err(format!("value must be greater than or equal to {bound}"))
                }
                _ => Ok(()),
            },
            Constraint::Lteq(bound) => match value.as_f64() {
                Some(n) if n > *bound => {
                    Err(format!("value must be less than or equal to {bound}"))
                }
                _ => Ok(()),
            },
            Constraint::Pattern(rx) => match &value {
                Value::String(s) if !rx.is_match(s) => {
                    Err(format!("string does not match pattern {:?}", rx.as_str()))
                }
                _ => Ok(()),
            },
            Constraint::OneOf(allowed) => {
                if allowed.contains(&value) {
                    Ok(())
                } else {
                    Err("value is not one of the allowed choices".to_string())
                }
            }
            Constraint::Check(f) => match f(&value) {
                Ok(Some(replacement)) => {
                    value = replacement;
                    Ok(())
                }
                Ok(None) => Ok(()),
                Err(msg) => Err(msg),
            },
        };

        if let Err(default_msg) = outcome {
            let message = overrides
                .get(&c.tag())
                .map(|s| s.to_string())
                .unwrap_or(default_msg);
            return Err(ValidationError::new(path.to_vec(), c.code(), message));
        }
    }

    Ok(value)
}

fn item_count(value: &Value) -> Option<usize> {
    match value {
        Value::Array(xs) => Some(xs.len()),
        Value::Object(m) => Some(m.len()),
        _ => None,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
