//! Resolved configuration produced by a parse.

use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{Result, Value};

/// One resolved value per schema field, in declaration order.
///
/// Values are either supplied on the command line or the field's default.
/// Scalars are stored unwrapped; tuples as [`Value::List`].
///
/// # Examples
///
/// ```
/// use argclass_core::*;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Args {
///     n_epoch: i64,
///     beta: (f64, f64),
/// }
///
/// let schema = Schema::new("train")
///     .with_field(FieldSchema::new("n_epoch", Primitive::Int).with_default(100))
///     .with_field(
///         FieldSchema::new("beta", FieldType::tuple(Primitive::Float, 2)).with_default([0.2, 0.4]),
///     );
/// let config = compile(&schema).unwrap().try_parse_from(["train", "--beta", "0.1", "0.9"]).unwrap();
///
/// let args: Args = config.deserialize().unwrap();
/// assert_eq!(args.n_epoch, 100);
/// assert_eq!(args.beta, (0.1, 0.9));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    program: String,
    entries: Vec<(String, Value)>,
}

impl Config {
    pub(crate) fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, field: &str, value: Value) {
        self.entries.push((field.to_string(), value));
    }

    /// Program name of the schema this config was parsed for.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_int)
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_float)
    }

    pub fn str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn list(&self, field: &str) -> Option<&[Value]> {
        self.get(field).and_then(Value::as_list)
    }

    /// Iterates `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Converts into a JSON object keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }

    /// Deserializes into a caller-defined struct.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](crate::Error::Json) if the fields do not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
