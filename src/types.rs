//! Type model of the query language.
//!
//! Record shapes are described by [`RecordSchema`] entries held in a
//! [`SchemaRegistry`]: a metadata registry built once per element
//! type and reused across compilations, replacing any runtime
//! string-dispatch over live objects. Everything here is immutable
//! after construction and safe to share between concurrent
//! compilations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A resolved type.
///
/// Numeric widths mirror the literal classification rules: integer
/// literals are 32- or 64-bit by digit count, fractional literals are
/// float/double/decimal by fractional digit count.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Null,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Str,
    /// Nullable wrapper; relational checks unwrap it on either side.
    Optional(Box<Ty>),
    /// A queryable collection with a mechanically extractable element type.
    Sequence(Box<Ty>),
    Record(Arc<RecordSchema>),
}

impl Ty {
    pub fn optional(inner: Ty) -> Ty {
        Ty::Optional(Box::new(inner))
    }

    pub fn sequence(element: Ty) -> Ty {
        Ty::Sequence(Box::new(element))
    }

    pub fn record(schema: Arc<RecordSchema>) -> Ty {
        Ty::Record(schema)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Ty::Int32 | Ty::Int64 | Ty::Float32 | Ty::Float64 | Ty::Decimal
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Ty::Int32 | Ty::Int64)
    }

    /// Queryable means collection-shaped: the element type can be
    /// extracted mechanically.
    pub fn is_queryable(&self) -> bool {
        matches!(self.unwrap_optional(), Ty::Sequence(_))
    }

    /// Element type of a queryable, if this is one.
    pub fn element(&self) -> Option<&Ty> {
        match self.unwrap_optional() {
            Ty::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// Strip a nullable wrapper, if present.
    pub fn unwrap_optional(&self) -> &Ty {
        match self {
            Ty::Optional(inner) => inner.unwrap_optional(),
            other => other,
        }
    }

    /// Whether values of this type have a total order the engine can
    /// sort and min/max over.
    pub fn is_comparable(&self) -> bool {
        matches!(
            self.unwrap_optional(),
            Ty::Bool | Ty::Str | Ty::Int32 | Ty::Int64 | Ty::Float32 | Ty::Float64 | Ty::Decimal
        )
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Null => write!(f, "null"),
            Ty::Bool => write!(f, "bool"),
            Ty::Int32 => write!(f, "int32"),
            Ty::Int64 => write!(f, "int64"),
            Ty::Float32 => write!(f, "float32"),
            Ty::Float64 => write!(f, "float64"),
            Ty::Decimal => write!(f, "decimal"),
            Ty::Str => write!(f, "string"),
            Ty::Optional(inner) => write!(f, "optional<{}>", inner),
            Ty::Sequence(element) => write!(f, "seq<{}>", element),
            Ty::Record(schema) => write!(f, "record {}", schema.name),
        }
    }
}

/// Widest of two numeric types, or `None` when either is non-numeric.
pub fn numeric_join(a: &Ty, b: &Ty) -> Option<Ty> {
    fn rank(ty: &Ty) -> Option<u8> {
        match ty {
            Ty::Int32 => Some(0),
            Ty::Int64 => Some(1),
            Ty::Float32 => Some(2),
            Ty::Float64 => Some(3),
            Ty::Decimal => Some(4),
            _ => None,
        }
    }
    let (ra, rb) = (rank(a)?, rank(b)?);
    Some(if ra >= rb { a.clone() } else { b.clone() })
}

/// Width of an integer literal from its digit count: fewer than 19
/// integer digits fit the 32-bit kind, anything longer widens.
pub fn classify_integer(raw: &str) -> Ty {
    let digits = raw.trim_start_matches('-').len();
    if digits < 19 { Ty::Int32 } else { Ty::Int64 }
}

/// Width of a fractional literal from its fractional digit count:
/// up to 7 digits is float, up to 15 double, beyond that decimal.
pub fn classify_fraction(raw: &str) -> Ty {
    let mantissa = raw.split(['e', 'E']).next().unwrap_or(raw);
    let fraction_digits = mantissa.split('.').nth(1).map(str::len).unwrap_or(0);
    if fraction_digits <= 7 {
        Ty::Float32
    } else if fraction_digits <= 15 {
        Ty::Float64
    } else {
        Ty::Decimal
    }
}

/// One queryable field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
}

/// Result of a case-insensitive member lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberMatch<'a> {
    Unique(&'a FieldDef),
    Missing,
    Ambiguous,
}

/// Shape of one record element type: its name and queryable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        RecordSchema {
            name: name.into(),
            fields,
        }
    }

    /// Convenience constructor from (name, type) pairs.
    pub fn of(name: impl Into<String>, fields: Vec<(&str, Ty)>) -> Self {
        RecordSchema {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        }
    }

    /// Case-insensitive field lookup; zero or more than one match is
    /// reported, never guessed at.
    pub fn field(&self, name: &str) -> MemberMatch<'_> {
        let mut found = None;
        for field in &self.fields {
            if field.name.eq_ignore_ascii_case(name) {
                if found.is_some() {
                    return MemberMatch::Ambiguous;
                }
                found = Some(field);
            }
        }
        match found {
            Some(field) => MemberMatch::Unique(field),
            None => MemberMatch::Missing,
        }
    }
}

/// Registry of known record types.
///
/// Built once by the caller (or inferred from a sample document) and
/// then read-only: compilations share it freely.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<RecordSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Register a schema and return its shared handle.
    pub fn register(&mut self, schema: RecordSchema) -> Arc<RecordSchema> {
        let shared = Arc::new(schema);
        self.schemas.insert(shared.name.clone(), shared.clone());
        shared
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RecordSchema>> {
        self.schemas.get(name)
    }

    /// Derive a schema from a sample record, registering nested record
    /// and sequence shapes along the way.
    ///
    /// Returns `None` when the sample is not a JSON object.
    pub fn infer(&mut self, name: &str, sample: &serde_json::Value) -> Option<Arc<RecordSchema>> {
        let serde_json::Value::Object(map) = sample else {
            return None;
        };
        let mut fields = Vec::new();
        for (key, value) in map {
            let ty = self.infer_value(&format!("{}.{}", name, key), value);
            fields.push(FieldDef {
                name: key.clone(),
                ty,
            });
        }
        Some(self.register(RecordSchema::new(name, fields)))
    }

    fn infer_value(&mut self, path: &str, value: &serde_json::Value) -> Ty {
        match value {
            serde_json::Value::Null => Ty::Null,
            serde_json::Value::Bool(_) => Ty::Bool,
            serde_json::Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Ty::Int64
                } else {
                    Ty::Float64
                }
            }
            serde_json::Value::String(_) => Ty::Str,
            serde_json::Value::Array(items) => {
                let element = items
                    .first()
                    .map(|item| self.infer_value(path, item))
                    .unwrap_or(Ty::Null);
                Ty::sequence(element)
            }
            serde_json::Value::Object(_) => match self.infer(path, value) {
                Some(schema) => Ty::record(schema),
                None => Ty::Null,
            },
        }
    }
}
