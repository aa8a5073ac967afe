//! Type-to-JSON-Schema mapper and the per-call reference registry.
//!
//! `to_schema` emits a fragment for one definition; `Ref` nodes never expand
//! inline — they register themselves and return a `#/definitions/<short>`
//! placeholder, which is what bounds recursion. `generate_schema` then drains
//! the registry to a fixed point: every seen identifier gets a definition,
//! re-seen identifiers are no-ops, so self- and mutually-referential named
//! types terminate.

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

use crate::constraints::Constraint;
use crate::error::SchemaError;
use crate::names::NamedTypes;
use crate::types::{PrimitiveKind, TypeDefinition};

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Mutable context scoped to exactly one top-level generation call. Not a
/// cache: create fresh, discard after.
#[derive(Debug, Default)]
pub struct Registry {
    seen: IndexSet<String>,
    definitions: IndexMap<String, Value>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference to `id` and hand back the placeholder node.
    pub fn reference(&mut self, id: &str) -> Value {
        self.seen.insert(id.to_string());
        json!({ "$ref": format!("#/definitions/{}", short_name(id)) })
    }

    /// First identifier that was referenced but has no definition yet.
    pub fn next_pending(&self) -> Option<String> {
        self.seen
            .iter()
            .find(|id| !self.definitions.contains_key(*id))
            .cloned()
    }

    pub fn define(&mut self, id: impl Into<String>, doc: Value) {
        self.definitions.insert(id.into(), doc);
    }

    /// Definitions keyed by short name. Short-name uniqueness across the
    /// referenced set is a caller contract; collisions overwrite silently.
    pub fn into_definitions(self) -> IndexMap<String, Value> {
        self.definitions
            .into_iter()
            .map(|(id, doc)| (short_name(&id).to_string(), doc))
            .collect()
    }
}

static NAMESPACE_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.:]+").unwrap());

/// Last dotted/namespaced segment of an identifier: `app.models.User` and
/// `app::models::User` both give `User`.
pub fn short_name(id: &str) -> &str {
    NAMESPACE_SEP.split(id).filter(|s| !s.is_empty()).last().unwrap_or(id)
}

// ————————————————————————————————————————————————————————————————————————————
// MAPPER
// ————————————————————————————————————————————————————————————————————————————

/// Convert one type definition into a JSON-Schema fragment, registering any
/// named references it mentions.
pub fn to_schema(def: &TypeDefinition, registry: &mut Registry) -> Value {
    match def {
        TypeDefinition::Primitive { kind, constraints } => {
            let mut doc = match kind {
                PrimitiveKind::String => json!({ "type": "string" }),
                PrimitiveKind::Integer => json!({ "type": "integer" }),
                PrimitiveKind::Float => json!({ "type": "number" }),
                PrimitiveKind::Boolean => json!({ "type": "boolean" }),
                PrimitiveKind::Atom => json!({
                    "type": "string",
                    "description": "atom: symbolic constant serialized as a string",
                }),
                PrimitiveKind::Any => json!({}),
                PrimitiveKind::Map => json!({ "type": "object" }),
            };
            apply_constraint_keywords(&mut doc, constraints);
            doc
        }

        TypeDefinition::Array { element, constraints } => {
            let mut doc = json!({
                "type": "array",
                "items": to_schema(element, registry),
            });
            apply_constraint_keywords(&mut doc, constraints);
            doc
        }

        TypeDefinition::MapOf { value, constraints, .. } => {
            // JSON object keys are strings; the key type leaves no schema
            // footprint
            let mut doc = json!({
                "type": "object",
                "additionalProperties": to_schema(value, registry),
            });
            apply_constraint_keywords(&mut doc, constraints);
            doc
        }

        TypeDefinition::Object { fields, constraints } => {
            let mut props = serde_json::Map::new();
            for (name, field_def) in fields {
                props.insert(name.clone(), to_schema(field_def, registry));
            }
            let required: Vec<Value> =
                fields.keys().map(|k| Value::from(k.as_str())).collect();
            let mut doc = json!({
                "type": "object",
                "properties": Value::Object(props),
            });
            if !required.is_empty() {
                doc["required"] = Value::Array(required);
            }
            apply_constraint_keywords(&mut doc, constraints);
            doc
        }

        TypeDefinition::Union { variants, .. } => {
            json!({
                "oneOf": variants.iter().map(|v| to_schema(v, registry)).collect::<Vec<_>>(),
            })
        }

        TypeDefinition::Tuple { elements } => {
            json!({
                "type": "array",
                "prefixItems": elements.iter().map(|e| to_schema(e, registry)).collect::<Vec<_>>(),
                "minItems": elements.len(),
                "maxItems": elements.len(),
                "items": false,
            })
        }

        TypeDefinition::Ref(id) => registry.reference(id),
    }
}

/// Translate constraints to JSON-Schema keywords. `one_of` has no translation
/// (it is enforced at validation time only) and `Check`/`Message` leave no
/// schema footprint.
fn apply_constraint_keywords(doc: &mut Value, constraints: &[Constraint]) {
    for c in constraints {
        match c {
            Constraint::MinLength(n) => doc["minLength"] = Value::from(*n),
            Constraint::MaxLength(n) => doc["maxLength"] = Value::from(*n),
            Constraint::MinItems(n) => doc["minItems"] = Value::from(*n),
            Constraint::MaxItems(n) => doc["maxItems"] = Value::from(*n),
            Constraint::Gt(x) => doc["exclusiveMinimum"] = Value::from(*x),
            Constraint::Lt(x) => doc["exclusiveMaximum"] = Value::from(*x),
            Constraint::Gteq(x) => doc["minimum"] = Value::from(*x),
            Constraint::Lteq(x) => doc["maximum"] = Value::from(*x),
            Constraint::Pattern(rx) => doc["pattern"] = Value::from(rx.as_str()),
            Constraint::OneOf(_) | Constraint::Check(_) | Constraint::Message { .. } => {}
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DRIVER
// ————————————————————————————————————————————————————————————————————————————

/// Generate a complete document for `def`: the root fragment plus a
/// `definitions` block covering the breadth-first closure of every named
/// reference discovered along the way.
pub fn generate_schema(
    def: &TypeDefinition,
    names: &dyn NamedTypes,
) -> Result<Value, SchemaError> {
    let mut registry = Registry::new();
    let mut root = to_schema(def, &mut registry);

    // fixed point: stop when every seen identifier has a definition
    while let Some(id) = registry.next_pending() {
        let target = names
            .lookup(&id)
            .ok_or_else(|| SchemaError::UnknownType(id.clone()))?;
        let doc = to_schema(target, &mut registry);
        registry.define(id, doc);
    }

    let definitions = registry.into_definitions();
    if !definitions.is_empty() {
        let mut defs = serde_json::Map::new();
        for (name, doc) in definitions {
            defs.insert(name, doc);
        }
        root["definitions"] = Value::Object(defs);
    }
    Ok(root)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
