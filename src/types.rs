// Closed type-definition model. No serde_json traversal here; the validator
// and the schema mapper consume this tree, they never build it.

use indexmap::IndexMap;

use crate::constraints::Constraint;

/// Native kind accepted by a `Primitive` node. Exact checks, no coercion:
/// `Float` rejects integer-kind JSON numbers, `Atom` accepts strings (symbolic
/// constants have no JSON native kind), `Map` accepts any object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Integer,
    Float,
    Boolean,
    Atom,
    Any,
    Map,
}

/// Recursively composable description of an expected value shape.
///
/// `Tuple` carries no constraints slot (fixed arity is the whole contract) and
/// `Ref` points at another named type by identifier; neither owns a cycle.
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Primitive {
        kind: PrimitiveKind,
        constraints: Vec<Constraint>,
    },
    Array {
        element: Box<TypeDefinition>,
        constraints: Vec<Constraint>,
    },
    MapOf {
        key: Box<TypeDefinition>,
        value: Box<TypeDefinition>,
        constraints: Vec<Constraint>,
    },
    Object {
        /// Insertion order is preserved into `properties` during generation.
        fields: IndexMap<String, TypeDefinition>,
        constraints: Vec<Constraint>,
    },
    Union {
        /// Variant order is semantically significant: first match wins.
        variants: Vec<TypeDefinition>,
        /// Stored but not applied by the validator; see DESIGN.md.
        constraints: Vec<Constraint>,
    },
    Tuple {
        elements: Vec<TypeDefinition>,
    },
    Ref(String),
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION HELPERS
// ————————————————————————————————————————————————————————————————————————————

impl TypeDefinition {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDefinition::Primitive { kind, constraints: Vec::new() }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }

    pub fn float() -> Self {
        Self::primitive(PrimitiveKind::Float)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn atom() -> Self {
        Self::primitive(PrimitiveKind::Atom)
    }

    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    /// Generic map: any JSON object, entries untyped.
    pub fn map() -> Self {
        Self::primitive(PrimitiveKind::Map)
    }

    pub fn array(element: TypeDefinition) -> Self {
        TypeDefinition::Array { element: Box::new(element), constraints: Vec::new() }
    }

    pub fn map_of(key: TypeDefinition, value: TypeDefinition) -> Self {
        TypeDefinition::MapOf {
            key: Box::new(key),
            value: Box::new(value),
            constraints: Vec::new(),
        }
    }

    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeDefinition)>,
        K: Into<String>,
    {
        TypeDefinition::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            constraints: Vec::new(),
        }
    }

    pub fn union<I: IntoIterator<Item = TypeDefinition>>(variants: I) -> Self {
        TypeDefinition::Union { variants: variants.into_iter().collect(), constraints: Vec::new() }
    }

    pub fn tuple<I: IntoIterator<Item = TypeDefinition>>(elements: I) -> Self {
        TypeDefinition::Tuple { elements: elements.into_iter().collect() }
    }

    pub fn reference(id: impl Into<String>) -> Self {
        TypeDefinition::Ref(id.into())
    }

    /// Append one constraint. No-op on `Tuple`/`Ref`, which have no slot.
    pub fn constrain(mut self, constraint: Constraint) -> Self {
        if let Some(slot) = self.constraints_mut() {
            slot.push(constraint);
        }
        self
    }

    /// Append several constraints in declaration order.
    pub fn with_constraints<I: IntoIterator<Item = Constraint>>(mut self, extra: I) -> Self {
        if let Some(slot) = self.constraints_mut() {
            slot.extend(extra);
        }
        self
    }

    /// Constraint list attached to this node; empty for `Tuple`/`Ref`.
    pub fn constraints(&self) -> &[Constraint] {
        match self {
            TypeDefinition::Primitive { constraints, .. }
            | TypeDefinition::Array { constraints, .. }
            | TypeDefinition::MapOf { constraints, .. }
            | TypeDefinition::Object { constraints, .. }
            | TypeDefinition::Union { constraints, .. } => constraints,
            TypeDefinition::Tuple { .. } | TypeDefinition::Ref(_) => &[],
        }
    }

    fn constraints_mut(&mut self) -> Option<&mut Vec<Constraint>> {
        match self {
            TypeDefinition::Primitive { constraints, .. }
            | TypeDefinition::Array { constraints, .. }
            | TypeDefinition::MapOf { constraints, .. }
            | TypeDefinition::Object { constraints, .. }
            | TypeDefinition::Union { constraints, .. } => Some(constraints),
            TypeDefinition::Tuple { .. } | TypeDefinition::Ref(_) => None,
        }
    }
}
