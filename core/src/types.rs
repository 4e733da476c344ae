//! Schema type definitions for declarative argument classes.
//!
//! A [`Schema`] is an ordered list of [`FieldSchema`] entries, each with a
//! declared [`FieldType`] and an optional default [`Value`]. The types are
//! plain data: they can be built in code with the builder methods or
//! deserialized from JSON/YAML with [`serde`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive type tag for a field or a composite element.
///
/// # Examples
///
/// ```
/// use argclass_core::Primitive;
///
/// assert_eq!(Primitive::Float.to_string(), "float");
/// let parsed: Primitive = serde_json::from_str("\"integer\"").unwrap();
/// assert_eq!(parsed, Primitive::Int);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// Signed 64-bit integer.
    #[serde(alias = "integer")]
    Int,
    /// 64-bit floating point number.
    Float,
    /// UTF-8 string.
    #[serde(alias = "string")]
    Str,
    /// Boolean toggle.
    #[serde(alias = "boolean")]
    Bool,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A literal value: a default, a choice, or a parsed argument.
///
/// `List` carries tuple values and the sequence form of a choices-shorthand
/// default.
///
/// # Examples
///
/// ```
/// use argclass_core::{Primitive, Value};
///
/// assert_eq!(Value::from(100).primitive(), Some(Primitive::Int));
/// assert_eq!(Value::from([0.2, 0.4]).primitive(), None);
/// assert_eq!(Value::from("bert").to_string(), "bert");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Returns the primitive kind of a scalar value, `None` for lists.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Value::Bool(_) => Some(Primitive::Bool),
            Value::Int(_) => Some(Primitive::Int),
            Value::Float(_) => Some(Primitive::Float),
            Value::Str(_) => Some(Primitive::Str),
            Value::List(_) => None,
        }
    }

    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts into a [`serde_json::Value`].
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing `.0` on integral floats.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Declared type of a field.
///
/// Composite descriptors are explicit variants rather than being inferred
/// from their shape: a tuple lists type tags, an enumeration lists values.
///
/// In schema files a scalar is written as its tag (`int`), a tuple as
/// `{ tuple: [float, float] }` and an enumeration as
/// `{ choices: [A, B, C] }`.
///
/// # Examples
///
/// ```
/// use argclass_core::{FieldType, Primitive, Value};
///
/// let beta = FieldType::tuple(Primitive::Float, 2);
/// assert_eq!(beta, FieldType::Tuple(vec![Primitive::Float, Primitive::Float]));
///
/// let option: FieldType = serde_yaml::from_str("{ choices: [A, B, C] }").unwrap();
/// assert_eq!(option, FieldType::choices(["A", "B", "C"]));
///
/// let scalar: FieldType = serde_yaml::from_str("int").unwrap();
/// assert_eq!(scalar, FieldType::Scalar(Primitive::Int));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldTypeRepr", into = "FieldTypeRepr")]
pub enum FieldType {
    /// A single value of a primitive type.
    Scalar(Primitive),
    /// Fixed-arity tuple; every tag must be the same primitive.
    Tuple(Vec<Primitive>),
    /// Closed enumeration of literal values of one primitive kind.
    Choices(Vec<Value>),
}

impl FieldType {
    /// Homogeneous tuple of `arity` elements.
    pub fn tuple(element: Primitive, arity: usize) -> Self {
        FieldType::Tuple(vec![element; arity])
    }

    /// Enumeration of the given literals.
    pub fn choices<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FieldType::Choices(values.into_iter().map(Into::into).collect())
    }
}

impl From<Primitive> for FieldType {
    fn from(primitive: Primitive) -> Self {
        FieldType::Scalar(primitive)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FieldTypeRepr {
    Scalar(Primitive),
    Composite(CompositeRepr),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CompositeRepr {
    Tuple(Vec<Primitive>),
    Choices(Vec<Value>),
}

impl From<FieldTypeRepr> for FieldType {
    fn from(repr: FieldTypeRepr) -> Self {
        match repr {
            FieldTypeRepr::Scalar(p) => FieldType::Scalar(p),
            FieldTypeRepr::Composite(CompositeRepr::Tuple(tags)) => FieldType::Tuple(tags),
            FieldTypeRepr::Composite(CompositeRepr::Choices(values)) => FieldType::Choices(values),
        }
    }
}

impl From<FieldType> for FieldTypeRepr {
    fn from(ty: FieldType) -> Self {
        match ty {
            FieldType::Scalar(p) => FieldTypeRepr::Scalar(p),
            FieldType::Tuple(tags) => FieldTypeRepr::Composite(CompositeRepr::Tuple(tags)),
            FieldType::Choices(values) => FieldTypeRepr::Composite(CompositeRepr::Choices(values)),
        }
    }
}

/// Schema for one configuration field.
///
/// # Examples
///
/// ```
/// use argclass_core::{FieldSchema, Primitive};
///
/// let field = FieldSchema::new("n_epoch", Primitive::Int)
///     .with_default(100)
///     .with_help("Number of training epochs");
/// assert_eq!(field.flag_name(), "--n-epoch");
/// assert!(field.has_default());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name (e.g. "output_dir")
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub declared_type: FieldType,
    /// Default value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Help text shown in usage output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldSchema {
    /// Creates a field without a default, which makes its flag mandatory
    /// (booleans excepted).
    pub fn new(name: &str, declared_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.to_string(),
            declared_type: declared_type.into(),
            default: None,
            help: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Long flag derived from the field name: underscores become hyphens.
    pub fn flag_name(&self) -> String {
        format!("--{}", self.name.replace('_', "-"))
    }
}

/// Complete argument schema for one program.
///
/// Field order is declaration order; it drives help output only.
///
/// # Examples
///
/// ```
/// use argclass_core::*;
///
/// let schema = Schema::new("train")
///     .with_description("Fine-tune a model")
///     .with_field(FieldSchema::new("n_epoch", Primitive::Int).with_default(100))
///     .with_field(FieldSchema::new("output_dir", Primitive::Str));
///
/// assert_eq!(schema.field_names(), vec!["n_epoch", "output_dir"]);
/// assert!(schema.find_field("output_dir").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Program name used in usage output
    pub name: String,
    /// Short description of the program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    /// Creates an empty schema for the given program name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by exact (case-sensitive) name.
    pub fn find_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Gets all field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_name_replaces_underscores() {
        let field = FieldSchema::new("use_cpu", Primitive::Bool);
        assert_eq!(field.flag_name(), "--use-cpu");
        assert!(!field.has_default());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(100.0).to_string(), "100.0");
        assert_eq!(Value::from([0.2, 0.4]).to_string(), "0.2 0.4");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_value_untagged_deserialization() {
        let values: Vec<Value> = serde_json::from_str(r#"[true, 3, 0.5, "x", [1, 2]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(3),
                Value::Float(0.5),
                Value::Str("x".into()),
                Value::List(vec![Value::Int(1), Value::Int(2)]),
            ]
        );
    }

    #[test]
    fn test_field_type_yaml_forms() {
        let tuple: FieldType = serde_yaml::from_str("{ tuple: [float, float] }").unwrap();
        assert_eq!(tuple, FieldType::tuple(Primitive::Float, 2));

        let choices: FieldType = serde_yaml::from_str("{ choices: [1, 2, 3] }").unwrap();
        assert_eq!(choices, FieldType::choices([1, 2, 3]));

        let scalar: FieldType = serde_yaml::from_str("boolean").unwrap();
        assert_eq!(scalar, FieldType::Scalar(Primitive::Bool));
    }

    #[test]
    fn test_field_schema_serialization_uses_type_key() {
        let field = FieldSchema::new("beta", FieldType::tuple(Primitive::Float, 2))
            .with_default([0.2, 0.4]);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "beta",
                "type": { "tuple": ["float", "float"] },
                "default": [0.2, 0.4],
            })
        );
    }

    #[test]
    fn test_value_to_json_maps_nan_to_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
    }
}
