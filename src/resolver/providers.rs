//! Provider-specific structured-output dialects: rewrite rules plus the
//! structural constraints a rewritten document is checked against.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{all_nodes, map_nodes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    /// No dialect: pass-through rewrite, every document meets constraints.
    Generic,
}

/// `format` values the OpenAI structured-output dialect accepts; anything
/// else is stripped when `remove_unsupported` is on.
static OPENAI_ALLOWED_FORMATS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["date-time", "date", "time", "duration", "email", "uuid"]
        .into_iter()
        .collect()
});

// ————————————————————————————————————————————————————————————————————————————
// REWRITES
// ————————————————————————————————————————————————————————————————————————————

/// OpenAI dialect: object nodes get `additionalProperties: false` (a bare
/// `true` or a missing key are both forced to `false`; schema-valued
/// `additionalProperties` stays), disallowed `format`s are stripped, and
/// optionally every property becomes required.
pub fn openai_rewrite(doc: &Value, remove_unsupported: bool, add_required_fields: bool) -> Value {
    map_nodes(doc, &move |map| {
        if is_object_node(map) {
            match map.get("additionalProperties") {
                None | Some(Value::Bool(true)) => {
                    map.insert("additionalProperties".to_string(), Value::Bool(false));
                }
                _ => {}
            }
            if add_required_fields {
                if let Some(Value::Object(props)) = map.get("properties") {
                    let required: Vec<Value> =
                        props.keys().map(|k| Value::from(k.as_str())).collect();
                    map.insert("required".to_string(), Value::Array(required));
                }
            }
        }
        if remove_unsupported {
            let drop = matches!(
                map.get("format"),
                Some(Value::String(fmt)) if !OPENAI_ALLOWED_FORMATS.contains(fmt.as_str())
            );
            if drop {
                map.remove("format");
            }
        }
    })
}

/// Anthropic dialect: every object node must carry a `required` array, so one
/// is forced into existence where missing.
pub fn anthropic_rewrite(doc: &Value) -> Value {
    map_nodes(doc, &|map| {
        if is_object_node(map) && !matches!(map.get("required"), Some(Value::Array(_))) {
            map.insert("required".to_string(), Value::Array(Vec::new()));
        }
    })
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRAINTS
// ————————————————————————————————————————————————————————————————————————————

/// Whether `doc` satisfies the provider's structural constraints. Checked
/// against the *rewritten* document; a `false` here is what triggers the
/// fail-open fallback to the pre-rewrite document.
pub fn meets_constraints(doc: &Value, provider: Provider) -> bool {
    match provider {
        Provider::Generic => true,
        Provider::OpenAi => all_nodes(doc, &|map| {
            if !is_object_node(map) {
                return true;
            }
            map.contains_key("properties")
                && !matches!(map.get("additionalProperties"), Some(Value::Bool(true)))
        }),
        Provider::Anthropic => all_nodes(doc, &|map| {
            !is_object_node(map) || matches!(map.get("required"), Some(Value::Array(_)))
        }),
    }
}

fn is_object_node(map: &Map<String, Value>) -> bool {
    matches!(map.get("type"), Some(Value::String(t)) if t == "object")
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
