//! Parameter schemas for actions.
//!
//! A [`ParamSchema`] is an ordered list of typed fields.  It renders to a
//! JSON Schema object (for prompts and function-calling definitions) and
//! validates raw JSON arguments from the model, coercing loosely-typed
//! values (`"5"` → `5`, `"true"` → `true`) the way the model tends to
//! produce them.

use schemars::JsonSchema;
use serde_json::{json, Map, Value};

use super::error::FieldError;

/// Semantic type of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamType>),
    Object,
    /// No declared type; any JSON value is accepted.
    Any,
}

impl ParamType {
    /// JSON Schema type keyword, or `None` for [`ParamType::Any`].
    pub fn json_type(&self) -> Option<&'static str> {
        match self {
            ParamType::String => Some("string"),
            ParamType::Integer => Some("integer"),
            ParamType::Number => Some("number"),
            ParamType::Boolean => Some("boolean"),
            ParamType::Array(_) => Some("array"),
            ParamType::Object => Some("object"),
            ParamType::Any => None,
        }
    }

    fn schema(&self) -> Value {
        match self {
            ParamType::Array(item) => json!({ "type": "array", "items": item.schema() }),
            ParamType::Any => json!({}),
            other => json!({ "type": other.json_type() }),
        }
    }

    /// Map a JSON Schema property onto a parameter type.
    fn from_schema(prop: &Value) -> ParamType {
        let ty = match prop.get("type") {
            Some(Value::String(s)) => Some(s.as_str()),
            // `Option<T>` renders as `["T", "null"]`.
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null"),
            _ => None,
        };
        match ty {
            Some("string") => ParamType::String,
            Some("integer") => ParamType::Integer,
            Some("number") => ParamType::Number,
            Some("boolean") => ParamType::Boolean,
            Some("array") => ParamType::Array(Box::new(
                prop.get("items")
                    .map(ParamType::from_schema)
                    .unwrap_or(ParamType::Any),
            )),
            Some("object") => ParamType::Object,
            _ if prop.get("$ref").is_some() || prop.get("allOf").is_some() => ParamType::Object,
            _ => ParamType::Any,
        }
    }

    /// Coerce `value` into this type, or explain why it can't be.
    fn coerce(&self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (ParamType::Any, v) => Ok(v.clone()),

            (ParamType::String, Value::String(_)) => Ok(value.clone()),

            (ParamType::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    return Ok(value.clone());
                }
                // Whole floats only, and only inside the i64 range.
                match n.as_f64() {
                    Some(f)
                        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
                    {
                        Ok(json!(f as i64))
                    }
                    _ => Err(format!("expected integer, got {n}")),
                }
            }
            (ParamType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected integer, got string {s:?}")),

            (ParamType::Number, Value::Number(_)) => Ok(value.clone()),
            (ParamType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected number, got string {s:?}")),

            (ParamType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (ParamType::Boolean, Value::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
                    "false" | "f" | "no" | "n" | "off" | "0" => Ok(Value::Bool(false)),
                    _ => Err(format!("expected boolean, got string {s:?}")),
                }
            }
            (ParamType::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(format!("expected boolean, got {n}")),
            },

            (ParamType::Array(item), Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| item.coerce(v).map_err(|e| format!("item {i}: {e}")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            (ParamType::Object, Value::Object(_)) => Ok(value.clone()),

            (expected, got) => Err(format!(
                "expected {}, got {}",
                expected.json_type().unwrap_or("any"),
                kind(got)
            )),
        }
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    /// Value filled in when an optional field is omitted.
    pub default: Option<Value>,
    pub description: Option<String>,
}

/// Ordered set of parameter fields for one action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<ParamField>,
}

impl ParamSchema {
    /// A schema with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ParamSchemaBuilder {
        ParamSchemaBuilder::default()
    }

    /// Build from `(name, type, required, default)` tuples.
    ///
    /// Defaults on required fields are ignored.
    pub fn from_fields<I, N>(fields: I) -> Self
    where
        I: IntoIterator<Item = (N, ParamType, bool, Option<Value>)>,
        N: Into<String>,
    {
        let mut builder = Self::builder();
        for (name, ty, required, default) in fields {
            builder = if required {
                builder.required(name, ty)
            } else {
                builder.optional(name, ty, default)
            };
        }
        builder.build()
    }

    /// Derive a schema from a Rust type's `JsonSchema` implementation.
    ///
    /// Properties become fields; a field is required when the type's schema
    /// lists it under `required`.
    pub fn of<T: JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        let value = serde_json::to_value(&root).unwrap_or_default();
        Self::from_json_schema(&value)
    }

    /// Read fields back from a JSON Schema object.
    pub fn from_json_schema(schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| ParamField {
                        name: name.clone(),
                        ty: ParamType::from_schema(prop),
                        required: required.contains(&name.as_str()),
                        default: prop.get("default").cloned(),
                        description: prop
                            .get("description")
                            .and_then(Value::as_str)
                            .map(String::from),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { fields }
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ParamField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = field.ty.schema();
            if let Some(ref desc) = field.description {
                prop["description"] = json!(desc);
            }
            if let Some(ref default) = field.default {
                prop["default"] = default.clone();
            }
            properties.insert(field.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    /// Validate raw arguments, returning the coerced parameter map.
    ///
    /// Every declared field is present in the result: omitted optional
    /// fields take their default, or `null` when they have none.  Unknown
    /// keys are rejected.  `null` stands in for "no arguments".
    pub fn validate(&self, raw: &Value) -> Result<Map<String, Value>, FieldError> {
        let empty = Map::new();
        let args = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(FieldError::new(
                    "$",
                    format!("arguments must be an object, got {}", kind(other)),
                ))
            }
        };

        let mut out = Map::new();
        for field in &self.fields {
            let value = match args.get(&field.name) {
                None if field.required => {
                    return Err(FieldError::new(&field.name, "is required"));
                }
                Some(Value::Null) if field.required => {
                    return Err(FieldError::new(&field.name, "must not be null"));
                }
                None => field.default.clone().unwrap_or(Value::Null),
                Some(Value::Null) => Value::Null,
                Some(v) => field
                    .ty
                    .coerce(v)
                    .map_err(|reason| FieldError::new(&field.name, reason))?,
            };
            out.insert(field.name.clone(), value);
        }

        if let Some(unknown) = args.keys().find(|k| self.field(k).is_none()) {
            return Err(FieldError::new(unknown, "is not a known parameter"));
        }

        Ok(out)
    }
}

/// Incremental builder for [`ParamSchema`].
#[derive(Debug, Default)]
pub struct ParamSchemaBuilder {
    fields: Vec<ParamField>,
}

impl ParamSchemaBuilder {
    pub fn required(self, name: impl Into<String>, ty: ParamType) -> Self {
        self.push(name.into(), ty, true, None)
    }

    /// Add an optional field, with or without a default.
    pub fn optional(self, name: impl Into<String>, ty: ParamType, default: Option<Value>) -> Self {
        self.push(name.into(), ty, false, default)
    }

    /// Describe the most recently added field.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.description = Some(description.into());
        }
        self
    }

    pub fn build(self) -> ParamSchema {
        ParamSchema {
            fields: self.fields,
        }
    }

    fn push(mut self, name: String, ty: ParamType, required: bool, default: Option<Value>) -> Self {
        // Redeclaring a field replaces it.
        self.fields.retain(|f| f.name != name);
        self.fields.push(ParamField {
            name,
            ty,
            required,
            default,
            description: None,
        });
        self
    }
}
