//! Schema-less type validation and JSON-Schema generation engine.
//!
//! Given a value and a recursively-defined [`TypeDefinition`], this crate
//! decides conformance (producing a normalized copy or structured errors),
//! converts type definitions into JSON-Schema documents with a cycle-safe
//! reference registry, and post-processes those documents (ref inlining,
//! flattening, provider dialect enforcement, lossy LLM simplification).
//!
//! Authoring layers, coercion, struct materialization, and the multi-stage
//! validation pipeline are external collaborators; the [`names::NamedTypes`]
//! trait is the seam they plug into.

pub mod constraints;
pub mod error;
pub mod names;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod validate;

pub use constraints::{Constraint, ConstraintTag, apply_constraints};
pub use error::{ErrorCode, PathSegment, SchemaError, ValidationError};
pub use names::{NamedTypes, NoNamedTypes, TypeTable};
pub use resolver::{
    FlattenOptions, LlmOptions, Provider, ResolveOptions, enforce_structured_output,
    flatten_schema, optimize_for_llm, resolve_references,
};
pub use schema::{Registry, generate_schema, to_schema};
pub use types::{PrimitiveKind, TypeDefinition};
pub use validate::{validate, validate_at};
