//! Named-type resolution seam.
//!
//! The engine never constructs `TypeDefinition`s for named references; an
//! external collaborator owns them. `NamedTypes` is that collaborator's
//! contract: identifier lookup, plus the hook the validator uses to hand a
//! value over to the external multi-stage pipeline when a named type carries
//! derived/computed fields.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ErrorCode, PathSegment, ValidationError};
use crate::types::TypeDefinition;

pub trait NamedTypes {
    /// Definition registered under `id`, if any.
    fn lookup(&self, id: &str) -> Option<&TypeDefinition>;

    /// Whether the named type carries derived/computed fields and therefore
    /// must go through the external multi-stage pipeline.
    fn has_computed_fields(&self, _id: &str) -> bool {
        false
    }

    /// Run the external pipeline for `id`, returning a plain keyed value.
    /// Only called when `has_computed_fields` answered true.
    fn run_pipeline(
        &self,
        id: &str,
        _value: &Value,
        path: &[PathSegment],
    ) -> Result<Value, Vec<ValidationError>> {
        Err(vec![ValidationError::new(
            path.to_vec(),
            ErrorCode::ModelValidation,
            format!("no validation pipeline registered for `{id}`"),
        )])
    }
}

/// Resolver that knows nothing; for trees without `Ref` nodes.
pub struct NoNamedTypes;

impl NamedTypes for NoNamedTypes {
    fn lookup(&self, _id: &str) -> Option<&TypeDefinition> {
        None
    }
}

/// Plain insertion-ordered table of named definitions.
#[derive(Default)]
pub struct TypeTable {
    types: IndexMap<String, TypeDefinition>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, def: TypeDefinition) -> &mut Self {
        self.types.insert(id.into(), def);
        self
    }
}

impl NamedTypes for TypeTable {
    fn lookup(&self, id: &str) -> Option<&TypeDefinition> {
        self.types.get(id)
    }
}
