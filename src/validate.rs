//! Recursive validator: walks a `TypeDefinition` against a `serde_json::Value`
//! and produces a normalized copy or a list of structured errors.
//!
//! Collection policy per variant (the asymmetries are deliberate):
//! - Array / MapOf / Object: validate every member, report *all* failures;
//!   node-level constraints run only when every member passed.
//! - Tuple: arity first, then positions in order; the first failing position
//!   short-circuits.
//! - Union: first variant to validate wins outright (first-match, not
//!   best-match); on total failure the deepest partial-match error is
//!   surfaced, else a generic mismatch at the union's own path.

use serde_json::{Map, Value};

use crate::constraints::apply_constraints;
use crate::error::{ErrorCode, PathSegment, ValidationError};
use crate::names::NamedTypes;
use crate::types::{PrimitiveKind, TypeDefinition};

/// Validate `value` against `def`, rooted at the empty path.
///
/// # Panics
///
/// Panics if a `Ref` identifier is unknown to `names` — that is a malformed
/// type definition, not a validation failure of the input value.
pub fn validate(
    def: &TypeDefinition,
    value: &Value,
    names: &dyn NamedTypes,
) -> Result<Value, Vec<ValidationError>> {
    validate_at(def, value, &[], names)
}

/// Validate with an explicit path prefix; errors carry root-to-leaf paths.
pub fn validate_at(
    def: &TypeDefinition,
    value: &Value,
    path: &[PathSegment],
    names: &dyn NamedTypes,
) -> Result<Value, Vec<ValidationError>> {
    match def {
        TypeDefinition::Primitive { kind, constraints } => {
            if !primitive_matches(*kind, value) {
                return Err(vec![type_error(path, kind_label(*kind), value)]);
            }
            apply_constraints(value.clone(), constraints, path).map_err(|e| vec![e])
        }

        TypeDefinition::Array { element, constraints } => {
            let Value::Array(items) = value else {
                return Err(vec![type_error(path, "array", value)]);
            };
            let mut out = Vec::with_capacity(items.len());
            let mut errors = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let mut child = path.to_vec();
                child.push(PathSegment::Index(i));
                match validate_at(element, item, &child, names) {
                    Ok(v) => out.push(v),
                    Err(es) => errors.extend(es),
                }
            }
            if !errors.is_empty() {
                // item-count constraints are skipped when any element failed
                return Err(errors);
            }
            apply_constraints(Value::Array(out), constraints, path).map_err(|e| vec![e])
        }

        TypeDefinition::MapOf { key, value: value_def, constraints } => {
            let Value::Object(entries) = value else {
                return Err(vec![type_error(path, "map", value)]);
            };
            let mut out = Map::new();
            let mut errors = Vec::new();
            for (k, v) in entries {
                let mut key_path = path.to_vec();
                key_path.push(PathSegment::Key);
                // keys stay strings in the normalized output; transforms on the
                // key type are discarded
                if let Err(es) = validate_at(key, &Value::String(k.clone()), &key_path, names) {
                    errors.extend(es);
                }
                let mut val_path = path.to_vec();
                val_path.push(PathSegment::field(k));
                match validate_at(value_def, v, &val_path, names) {
                    Ok(nv) => {
                        out.insert(k.clone(), nv);
                    }
                    Err(es) => errors.extend(es),
                }
            }
            if !errors.is_empty() {
                return Err(errors);
            }
            apply_constraints(Value::Object(out), constraints, path).map_err(|e| vec![e])
        }

        TypeDefinition::Object { fields, constraints } => {
            let Value::Object(entries) = value else {
                return Err(vec![type_error(path, "object", value)]);
            };
            let mut out = Map::new();
            let mut errors = Vec::new();
            for (name, field_def) in fields {
                let mut child = path.to_vec();
                child.push(PathSegment::field(name));
                match entries.get(name) {
                    None => errors.push(ValidationError::new(
                        child,
                        ErrorCode::Required,
                        format!("field `{name}` is required"),
                    )),
                    Some(v) => match validate_at(field_def, v, &child, names) {
                        Ok(nv) => {
                            out.insert(name.clone(), nv);
                        }
                        Err(es) => errors.extend(es),
                    },
                }
            }
            // extra keys are ignored here; strict-mode rejection belongs to the
            // external pipeline
            if !errors.is_empty() {
                return Err(errors);
            }
            apply_constraints(Value::Object(out), constraints, path).map_err(|e| vec![e])
        }

        TypeDefinition::Tuple { elements } => {
            let Value::Array(items) = value else {
                return Err(vec![type_error(path, "tuple", value)]);
            };
            if items.len() != elements.len() {
                return Err(vec![ValidationError::new(
                    path.to_vec(),
                    ErrorCode::Type,
                    format!("expected a tuple of {} elements, got {}", elements.len(), items.len()),
                )]);
            }
            let mut out = Vec::with_capacity(items.len());
            for (i, (elem_def, item)) in elements.iter().zip(items).enumerate() {
                let mut child = path.to_vec();
                child.push(PathSegment::Index(i));
                // first failing position wins; remaining positions are skipped
                out.push(validate_at(elem_def, item, &child, names)?);
            }
            Ok(Value::Array(out))
        }

        TypeDefinition::Union { variants, .. } => {
            // union-node constraints are currently not applied
            let mut pool: Vec<ValidationError> = Vec::new();
            for variant in variants {
                match validate_at(variant, value, path, names) {
                    Ok(v) => return Ok(v),
                    Err(es) => pool.extend(es),
                }
            }
            Err(vec![best_union_error(pool, path)])
        }

        TypeDefinition::Ref(id) => {
            if names.has_computed_fields(id) {
                return names.run_pipeline(id, value, path);
            }
            let target = names
                .lookup(id)
                .unwrap_or_else(|| panic!("unknown named type `{id}` in type definition"));
            validate_at(target, value, path, names)
        }
    }
}

/// The deepest successful partial match is the best evidence of which variant
/// the caller meant; anything at or above the union's own depth degrades to a
/// generic mismatch.
fn best_union_error(pool: Vec<ValidationError>, path: &[PathSegment]) -> ValidationError {
    let mut best: Option<ValidationError> = None;
    for err in pool {
        let deeper = match &best {
            None => true,
            Some(b) => err.path.len() > b.path.len(),
        };
        if deeper {
            best = Some(err);
        }
    }
    match best {
        Some(err) if err.path.len() > path.len() => err,
        _ => ValidationError::new(
            path.to_vec(),
            ErrorCode::Type,
            "value did not match any type in union",
        ),
    }
}

fn primitive_matches(kind: PrimitiveKind, value: &Value) -> bool {
    match kind {
        PrimitiveKind::Any => true,
        PrimitiveKind::String | PrimitiveKind::Atom => value.is_string(),
        PrimitiveKind::Boolean => value.is_boolean(),
        PrimitiveKind::Map => value.is_object(),
        PrimitiveKind::Integer => match value {
            Value::Number(n) => n.is_i64() || n.is_u64(),
            _ => false,
        },
        // exact native-kind check: integer-kind numbers are not floats
        PrimitiveKind::Float => match value {
            Value::Number(n) => !n.is_i64() && !n.is_u64() && n.is_f64(),
            _ => false,
        },
    }
}

fn kind_label(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Integer => "integer",
        PrimitiveKind::Float => "float",
        PrimitiveKind::Boolean => "boolean",
        PrimitiveKind::Atom => "atom",
        PrimitiveKind::Any => "any",
        PrimitiveKind::Map => "map",
    }
}

fn value_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &[PathSegment], expected: &str, value: &Value) -> ValidationError {
    ValidationError::new(
        path.to_vec(),
        ErrorCode::Type,
        format!("expected {expected}, got {}", value_label(value)),
    )
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Constraint;
    use crate::names::{NoNamedTypes, TypeTable};
    use serde_json::json;

    fn check(def: &TypeDefinition, value: Value) -> Result<Value, Vec<ValidationError>> {
        validate(def, &value, &NoNamedTypes)
    }

    #[test]
    fn primitive_kinds_are_exact() {
        assert!(check(&TypeDefinition::integer(), json!(5)).is_ok());
        assert!(check(&TypeDefinition::integer(), json!(5.5)).is_err());
        assert!(check(&TypeDefinition::float(), json!(5.5)).is_ok());
        // no implicit coercion: an integer-kind number is not a float
        assert!(check(&TypeDefinition::float(), json!(5)).is_err());
        assert!(check(&TypeDefinition::atom(), json!("ok")).is_ok());
        assert!(check(&TypeDefinition::any(), json!(null)).is_ok());
        assert!(check(&TypeDefinition::map(), json!({"a": 1})).is_ok());
        assert!(check(&TypeDefinition::map(), json!([1])).is_err());
    }

    #[test]
    fn array_collects_all_element_errors() {
        let def = TypeDefinition::array(TypeDefinition::integer());
        let errs = check(&def, json!([1, "x", 3, "y"])).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].path, vec![PathSegment::Index(1)]);
        assert_eq!(errs[1].path, vec![PathSegment::Index(3)]);
    }

    #[test]
    fn array_count_constraints_skipped_on_element_failure() {
        let def = TypeDefinition::array(TypeDefinition::integer())
            .constrain(Constraint::MinItems(10));
        // the only error is the bad element, not the item count
        let errs = check(&def, json!([1, "x"])).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::Type);

        // with all elements valid, the count constraint fires
        let errs = check(&def, json!([1, 2])).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::MinItems);
    }

    #[test]
    fn map_of_validates_keys_and_values() {
        let key = TypeDefinition::string().constrain(Constraint::MinLength(2));
        let def = TypeDefinition::map_of(key, TypeDefinition::integer());
        let errs = check(&def, json!({"a": 1, "bb": "x"})).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().any(|e| e.path.last() == Some(&PathSegment::Key)));
        assert!(errs.iter().any(|e| e.path.last() == Some(&PathSegment::field("bb"))));
    }

    #[test]
    fn object_requires_declared_fields_and_drops_extras() {
        let def = TypeDefinition::object([
            ("id", TypeDefinition::string()),
            ("n", TypeDefinition::integer()),
        ]);
        let errs = check(&def, json!({"id": "x"})).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::Required);
        assert_eq!(errs[0].path, vec![PathSegment::field("n")]);

        let out = check(&def, json!({"id": "x", "n": 1, "extra": true})).unwrap();
        assert_eq!(out, json!({"id": "x", "n": 1}));
    }

    #[test]
    fn tuple_arity_then_first_failure_only() {
        let def = TypeDefinition::tuple([TypeDefinition::integer(), TypeDefinition::integer()]);
        let errs = check(&def, json!([1, 2, 3])).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::Type);

        // both positions are wrong; only the first is reported
        let errs = check(&def, json!(["a", "b"])).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, vec![PathSegment::Index(0)]);
    }

    #[test]
    fn union_first_match_wins() {
        let def = TypeDefinition::union([TypeDefinition::string(), TypeDefinition::integer()]);
        let out = check(&def, json!("5")).unwrap();
        assert_eq!(out, json!("5"));
    }

    #[test]
    fn union_variant_order_matters_for_transforms() {
        let trimmed = TypeDefinition::string().constrain(Constraint::check(|v| {
            Ok(Some(Value::String(v.as_str().unwrap_or_default().trim().to_string())))
        }));
        let def = TypeDefinition::union([trimmed, TypeDefinition::string()]);
        assert_eq!(check(&def, json!(" a ")).unwrap(), json!("a"));
    }

    #[test]
    fn union_surfaces_deepest_error() {
        let def = TypeDefinition::union([
            TypeDefinition::object([("a", TypeDefinition::integer())]),
            TypeDefinition::string(),
        ]);
        let errs = check(&def, json!({"a": "x"})).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path, vec![PathSegment::field("a")]);
        assert_eq!(errs[0].code, ErrorCode::Type);
    }

    #[test]
    fn union_generic_error_when_nothing_matches_deeper() {
        let def = TypeDefinition::union([TypeDefinition::string(), TypeDefinition::integer()]);
        let errs = check(&def, json!(true)).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(errs[0].path.is_empty());
        assert_eq!(errs[0].message, "value did not match any type in union");
    }

    #[test]
    fn union_constraints_are_not_enforced() {
        let def = TypeDefinition::union([TypeDefinition::string()])
            .constrain(Constraint::MinLength(100));
        assert!(check(&def, json!("short")).is_ok());
    }

    #[test]
    fn named_ref_validates_against_registered_definition() {
        let mut table = TypeTable::new();
        table.insert("app.User", TypeDefinition::object([("name", TypeDefinition::string())]));
        let def = TypeDefinition::reference("app.User");
        let out = validate(&def, &json!({"name": "ada"}), &table).unwrap();
        assert_eq!(out, json!({"name": "ada"}));
        assert!(validate(&def, &json!({"name": 1}), &table).is_err());
    }

    struct Piped(TypeTable);

    impl NamedTypes for Piped {
        fn lookup(&self, id: &str) -> Option<&TypeDefinition> {
            self.0.lookup(id)
        }
        fn has_computed_fields(&self, _id: &str) -> bool {
            true
        }
        fn run_pipeline(
            &self,
            _id: &str,
            value: &Value,
            _path: &[PathSegment],
        ) -> Result<Value, Vec<ValidationError>> {
            let mut obj = value.as_object().cloned().unwrap_or_default();
            obj.insert("derived".to_string(), json!(true));
            Ok(Value::Object(obj))
        }
    }

    #[test]
    fn named_ref_with_computed_fields_delegates_to_pipeline() {
        let mut table = TypeTable::new();
        table.insert("app.User", TypeDefinition::object([("name", TypeDefinition::string())]));
        let out = validate(&TypeDefinition::reference("app.User"), &json!({"name": "ada"}), &Piped(table))
            .unwrap();
        assert_eq!(out["derived"], json!(true));
    }

    #[test]
    fn errors_carry_root_to_leaf_paths() {
        let def = TypeDefinition::object([(
            "items",
            TypeDefinition::array(TypeDefinition::object([("n", TypeDefinition::integer())])),
        )]);
        let errs = check(&def, json!({"items": [{"n": 1}, {"n": "x"}]})).unwrap_err();
        assert_eq!(
            errs[0].path,
            vec![PathSegment::field("items"), PathSegment::Index(1), PathSegment::field("n")]
        );
    }
}
