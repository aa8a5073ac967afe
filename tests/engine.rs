//! End-to-end properties of the engine: validation policies, schema
//! generation fixed point, reference resolution, and provider enforcement.

use anyhow::Result;
use serde_json::{Value, json};

use json_vet::{
    Constraint, ErrorCode, NoNamedTypes, PathSegment, Provider, ResolveOptions, TypeDefinition,
    TypeTable, enforce_structured_output, generate_schema, resolve_references, validate,
};

/// Walk a document and assert no `$ref` or `definitions`/`$defs` keys remain.
fn assert_fully_resolved(doc: &Value) {
    match doc {
        Value::Object(map) => {
            assert!(map.get("$ref").is_none(), "unresolved $ref in {doc}");
            assert!(map.get("definitions").is_none());
            assert!(map.get("$defs").is_none());
            map.values().for_each(assert_fully_resolved);
        }
        Value::Array(items) => items.iter().for_each(assert_fully_resolved),
        _ => {}
    }
}

#[test]
fn round_trip_without_named_refs_resolves_completely() -> Result<()> {
    let def = TypeDefinition::object([
        ("id", TypeDefinition::string().constrain(Constraint::MinLength(1))),
        ("score", TypeDefinition::union([TypeDefinition::integer(), TypeDefinition::float()])),
        ("tags", TypeDefinition::array(TypeDefinition::atom())),
        ("pair", TypeDefinition::tuple([TypeDefinition::float(), TypeDefinition::float()])),
        ("meta", TypeDefinition::map_of(TypeDefinition::string(), TypeDefinition::any())),
    ]);
    let doc = generate_schema(&def, &NoNamedTypes)?;
    let resolved = resolve_references(&doc, &ResolveOptions::default());
    assert_fully_resolved(&resolved);
    Ok(())
}

#[test]
fn resolution_is_idempotent_on_generated_documents() -> Result<()> {
    let mut table = TypeTable::new();
    table.insert("geo.Point", TypeDefinition::tuple([TypeDefinition::float(), TypeDefinition::float()]));
    let def = TypeDefinition::object([("origin", TypeDefinition::reference("geo.Point"))]);
    let doc = generate_schema(&def, &table)?;
    let once = resolve_references(&doc, &ResolveOptions::default());
    let twice = resolve_references(&once, &ResolveOptions::default());
    assert_eq!(once, twice);
    Ok(())
}

#[test]
fn union_first_match_beats_later_coercible_variants() {
    let def = TypeDefinition::union([TypeDefinition::string(), TypeDefinition::integer()]);
    // "5" could be coerced to an integer elsewhere; here the string branch
    // succeeds first and wins outright
    let out = validate(&def, &json!("5"), &NoNamedTypes).unwrap();
    assert_eq!(out, json!("5"));
}

#[test]
fn union_reports_deepest_partial_match() {
    let def = TypeDefinition::union([
        TypeDefinition::object([("a", TypeDefinition::integer())]),
        TypeDefinition::string(),
    ]);
    let errs = validate(&def, &json!({"a": "x"}), &NoNamedTypes).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path, vec![PathSegment::field("a")]);
}

#[test]
fn array_reports_every_failing_element() {
    let def = TypeDefinition::array(TypeDefinition::integer());
    let errs = validate(&def, &json!([1, "x", 3, "y"]), &NoNamedTypes).unwrap_err();
    let paths: Vec<_> = errs.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, vec![vec![PathSegment::Index(1)], vec![PathSegment::Index(3)]]);
}

#[test]
fn tuple_reports_only_the_first_failing_position() {
    let def = TypeDefinition::tuple([TypeDefinition::integer(), TypeDefinition::integer()]);
    let errs = validate(&def, &json!(["a", "b"]), &NoNamedTypes).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].path, vec![PathSegment::Index(0)]);
}

#[test]
fn self_referential_named_type_terminates() -> Result<()> {
    let mut table = TypeTable::new();
    table.insert(
        "list.Cons",
        TypeDefinition::object([
            ("head", TypeDefinition::integer()),
            (
                "tail",
                TypeDefinition::union([
                    TypeDefinition::reference("list.Cons"),
                    TypeDefinition::atom(),
                ]),
            ),
        ]),
    );
    let doc = generate_schema(&TypeDefinition::reference("list.Cons"), &table)?;
    let defs = doc["definitions"].as_object().unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(
        defs["Cons"]["properties"]["tail"]["oneOf"][0],
        json!({"$ref": "#/definitions/Cons"})
    );
    // a genuinely cyclic type keeps its dangling refs through resolution
    let resolved = resolve_references(&doc, &ResolveOptions::default());
    assert!(resolved.get("definitions").is_none());
    assert_eq!(resolved["properties"]["tail"]["oneOf"][0]["$ref"], "#/definitions/Cons");
    Ok(())
}

#[test]
fn depth_bound_zero_is_silent() -> Result<()> {
    let mut table = TypeTable::new();
    table.insert("m.Inner", TypeDefinition::string());
    let def = TypeDefinition::object([("inner", TypeDefinition::reference("m.Inner"))]);
    let doc = generate_schema(&def, &table)?;
    let opts = ResolveOptions { max_depth: 0, ..ResolveOptions::default() };
    let out = resolve_references(&doc, &opts);
    assert_eq!(out["properties"]["inner"]["$ref"], "#/definitions/Inner");
    Ok(())
}

#[test]
fn provider_enforcement_fails_open() {
    let doc = json!({ "type": "object", "additionalProperties": true });
    let out = enforce_structured_output(&doc, Provider::OpenAi, true, true);
    assert_eq!(out, doc);
}

#[test]
fn provider_enforcement_rewrites_conforming_documents() -> Result<()> {
    let def = TypeDefinition::object([("name", TypeDefinition::string())]);
    let doc = generate_schema(&def, &NoNamedTypes)?;
    let out = enforce_structured_output(&doc, Provider::OpenAi, true, true);
    assert_eq!(out["additionalProperties"], false);
    assert_eq!(out["required"], json!(["name"]));
    Ok(())
}

#[test]
fn normalized_copy_carries_custom_transforms() {
    let def = TypeDefinition::object([(
        "email",
        TypeDefinition::string().constrain(Constraint::check(|v| {
            Ok(Some(Value::String(v.as_str().unwrap_or_default().to_lowercase())))
        })),
    )]);
    let out = validate(&def, &json!({"email": "Ada@Example.COM"}), &NoNamedTypes).unwrap();
    assert_eq!(out, json!({"email": "ada@example.com"}));
}

#[test]
fn constraint_errors_surface_with_paths_and_codes() {
    let def = TypeDefinition::object([(
        "age",
        TypeDefinition::integer().with_constraints([
            Constraint::Gt(0.0),
            Constraint::message(json_vet::ConstraintTag::Gt, "age must be positive"),
        ]),
    )]);
    let errs = validate(&def, &json!({"age": -3}), &NoNamedTypes).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].code, ErrorCode::Gt);
    assert_eq!(errs[0].message, "age must be positive");
    assert_eq!(errs[0].path, vec![PathSegment::field("age")]);
}
