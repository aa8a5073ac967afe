//! Post-processing of generated JSON-Schema documents: `$ref` inlining,
//! flattening, provider structural enforcement, and lossy LLM simplification.
//!
//! Everything here is best-effort by contract. Unresolvable or cyclic refs
//! stay in place, exceeded depth is silent partial success, and failed
//! provider enforcement hands back the pre-rewrite document. Nothing in this
//! module returns an error; callers needing strict guarantees inspect the
//! output themselves.

pub mod providers;

use serde_json::{Map, Value};

pub use providers::Provider;

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Bound on nested ref expansions; `0` leaves every `$ref` untouched.
    pub max_depth: usize,
    /// Keep a sibling `title` on the `$ref` wrapper over the definition's own.
    pub preserve_titles: bool,
    /// Same, for `description`.
    pub preserve_descriptions: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions { max_depth: 10, preserve_titles: true, preserve_descriptions: true }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions {
    pub max_depth: usize,
    /// Accepted for API symmetry; after resolution there is nothing left to
    /// inline, so these knobs have no effect on already-resolved documents.
    pub inline_simple_refs: bool,
    pub preserve_complex_refs: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        FlattenOptions { max_depth: 5, inline_simple_refs: true, preserve_complex_refs: false }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LlmOptions {
    pub remove_descriptions: bool,
    /// Truncate `oneOf` lists longer than 3 to their first 3 variants.
    pub simplify_unions: bool,
    /// Truncate `properties` to the first N entries in insertion order.
    pub max_properties: Option<usize>,
}

impl Default for LlmOptions {
    fn default() -> Self {
        LlmOptions { remove_descriptions: true, simplify_unions: true, max_properties: None }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REFERENCE RESOLUTION
// ————————————————————————————————————————————————————————————————————————————

/// Inline `$ref`s against the document's own `definitions`/`$defs` block,
/// then strip that block from the top level. Only self-contained documents
/// are supported; external refs stay as-is.
pub fn resolve_references(doc: &Value, opts: &ResolveOptions) -> Value {
    let defs = collect_definitions(doc);
    let mut out = resolve_node(doc, &defs, &mut Vec::new(), 0, opts);
    if let Value::Object(map) = &mut out {
        map.remove("definitions");
        map.remove("$defs");
    }
    out
}

fn collect_definitions(doc: &Value) -> Map<String, Value> {
    let mut defs = Map::new();
    for block in ["definitions", "$defs"] {
        if let Some(Value::Object(m)) = doc.get(block) {
            for (k, v) in m {
                defs.insert(k.clone(), v.clone());
            }
        }
    }
    defs
}

fn resolve_node(
    node: &Value,
    defs: &Map<String, Value>,
    chain: &mut Vec<String>,
    depth: usize,
    opts: &ResolveOptions,
) -> Value {
    let Value::Object(map) = node else {
        return node.clone();
    };

    if let Some(Value::String(target)) = map.get("$ref") {
        let name = target.rsplit('/').next().unwrap_or(target.as_str());
        if depth >= opts.max_depth {
            // silent partial success, not a failure
            return node.clone();
        }
        if chain.iter().any(|seen| seen == name) {
            // cycle along this chain: the dangling $ref stays in place
            return node.clone();
        }
        let Some(def) = defs.get(name) else {
            return node.clone();
        };
        chain.push(name.to_string());
        let mut resolved = resolve_node(def, defs, chain, depth + 1, opts);
        chain.pop();
        if resolved.is_object() {
            if opts.preserve_titles {
                if let Some(title) = map.get("title") {
                    resolved["title"] = title.clone();
                }
            }
            if opts.preserve_descriptions {
                if let Some(desc) = map.get("description") {
                    resolved["description"] = desc.clone();
                }
            }
        }
        return resolved;
    }

    let mut out = Map::with_capacity(map.len());
    for (key, val) in map {
        let rewritten = match (key.as_str(), val) {
            ("properties", Value::Object(props)) => Value::Object(
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), resolve_node(v, defs, chain, depth, opts)))
                    .collect(),
            ),
            ("items" | "additionalProperties", v @ Value::Object(_)) => {
                resolve_node(v, defs, chain, depth, opts)
            }
            ("oneOf" | "anyOf" | "allOf" | "prefixItems", Value::Array(arms)) => Value::Array(
                arms.iter().map(|v| resolve_node(v, defs, chain, depth, opts)).collect(),
            ),
            _ => val.clone(),
        };
        out.insert(key.clone(), rewritten);
    }
    Value::Object(out)
}

// ————————————————————————————————————————————————————————————————————————————
// FLATTENING
// ————————————————————————————————————————————————————————————————————————————

/// Resolve, then run a structural pass over the result. The pass rebuilds the
/// tree without changing it for already-resolved documents; it exists for
/// parity with the resolution API.
pub fn flatten_schema(doc: &Value, opts: &FlattenOptions) -> Value {
    let resolved = resolve_references(
        doc,
        &ResolveOptions { max_depth: opts.max_depth, ..ResolveOptions::default() },
    );
    map_nodes(&resolved, &|_map| {})
}

/// Bottom-up structural walk: recurse through the schema-bearing containers,
/// then let `f` rewrite each object node in place.
pub(crate) fn map_nodes(node: &Value, f: &dyn Fn(&mut Map<String, Value>)) -> Value {
    let Value::Object(map) = node else {
        return node.clone();
    };
    let mut out = Map::with_capacity(map.len());
    for (key, val) in map {
        let rewritten = match (key.as_str(), val) {
            ("properties" | "definitions" | "$defs", Value::Object(props)) => Value::Object(
                props.iter().map(|(k, v)| (k.clone(), map_nodes(v, f))).collect(),
            ),
            ("items" | "additionalProperties", v @ Value::Object(_)) => map_nodes(v, f),
            ("oneOf" | "anyOf" | "allOf" | "prefixItems", Value::Array(arms)) => {
                Value::Array(arms.iter().map(|v| map_nodes(v, f)).collect())
            }
            _ => val.clone(),
        };
        out.insert(key.clone(), rewritten);
    }
    f(&mut out);
    Value::Object(out)
}

/// All-nodes predicate over the same containers `map_nodes` walks.
pub(crate) fn all_nodes(node: &Value, pred: &dyn Fn(&Map<String, Value>) -> bool) -> bool {
    let Value::Object(map) = node else {
        return true;
    };
    if !pred(map) {
        return false;
    }
    map.iter().all(|(key, val)| match (key.as_str(), val) {
        ("properties" | "definitions" | "$defs", Value::Object(props)) => {
            props.values().all(|v| all_nodes(v, pred))
        }
        ("items" | "additionalProperties", v @ Value::Object(_)) => all_nodes(v, pred),
        ("oneOf" | "anyOf" | "allOf" | "prefixItems", Value::Array(arms)) => {
            arms.iter().all(|v| all_nodes(v, pred))
        }
        _ => true,
    })
}

// ————————————————————————————————————————————————————————————————————————————
// PROVIDER ENFORCEMENT
// ————————————————————————————————————————————————————————————————————————————

/// Rewrite `doc` into the provider's structured-output dialect, then check the
/// result against the provider's constraints. If the rewritten document still
/// violates them, the **pre-rewrite** document is returned unchanged: this is
/// fail-open, the rewrite is silently discarded.
pub fn enforce_structured_output(
    doc: &Value,
    provider: Provider,
    remove_unsupported: bool,
    add_required_fields: bool,
) -> Value {
    let rewritten = match provider {
        Provider::OpenAi => providers::openai_rewrite(doc, remove_unsupported, add_required_fields),
        Provider::Anthropic => providers::anthropic_rewrite(doc),
        Provider::Generic => doc.clone(),
    };
    if providers::meets_constraints(&rewritten, provider) {
        rewritten
    } else {
        doc.clone()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LLM SIMPLIFICATION
// ————————————————————————————————————————————————————————————————————————————

/// Lossy rewrites for consumers that cannot handle full schemas. Not
/// equivalence-preserving: truncated `oneOf` variants and dropped properties
/// are discarded, not sampled.
pub fn optimize_for_llm(doc: &Value, opts: &LlmOptions) -> Value {
    let opts = *opts;
    map_nodes(doc, &move |map| {
        if opts.remove_descriptions {
            map.remove("description");
        }
        if opts.simplify_unions {
            if let Some(Value::Array(arms)) = map.get_mut("oneOf") {
                if arms.len() > 3 {
                    arms.truncate(3);
                }
            }
        }
        if let Some(limit) = opts.max_properties {
            if let Some(Value::Object(props)) = map.get_mut("properties") {
                if props.len() > limit {
                    *props = props
                        .iter()
                        .take(limit)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                }
            }
        }
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
