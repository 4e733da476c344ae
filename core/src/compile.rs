//! Schema compilation into a parser specification.
//!
//! [`compile`] checks every structural invariant of a [`Schema`] and
//! resolves each field into an [`ArgRule`]: flag name, element type, arity,
//! effective default, allowed choices and toggle semantics. All schema
//! defects surface here, before any command-line input is consulted.
//!
//! # Examples
//!
//! ```
//! use argclass_core::*;
//!
//! let schema = Schema::new("train")
//!     .with_field(FieldSchema::new("model", Primitive::Str).with_default(["bert", "roberta"]));
//! let spec = compile(&schema).unwrap();
//!
//! let rule = spec.rule("model").unwrap();
//! assert_eq!(rule.flag, "--model");
//! assert_eq!(rule.default, Some(Value::from("bert")));
//! assert_eq!(rule.choices.as_ref().map(Vec::len), Some(2));
//!
//! // Default outside the declared choices
//! let bad = Schema::new("train").with_field(
//!     FieldSchema::new("option", FieldType::choices(["A", "B"])).with_default("C"),
//! );
//! assert!(matches!(compile(&bad), Err(SchemaError::DefaultNotInChoices { .. })));
//! ```

use std::collections::HashSet;

use tracing::debug;

use crate::{FieldSchema, FieldType, Primitive, Schema, SchemaError, Value};

/// Flags the generated parser defines on its own.
const RESERVED_FLAGS: &[&str] = &["--help"];

/// Number of values a flag consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One value, stored unwrapped.
    Single,
    /// Exactly `n` values, stored as a [`Value::List`].
    Tuple(usize),
}

impl Arity {
    pub fn count(self) -> usize {
        match self {
            Arity::Single => 1,
            Arity::Tuple(n) => n,
        }
    }
}

/// What a boolean flag stores when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Absent → `false`, present → `true`.
    SetTrue,
    /// Absent → `true`, present → `false`.
    SetFalse,
}

/// Compiled parsing rule for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgRule {
    /// Field name, also the key in the resulting config
    pub field: String,
    /// Long flag (e.g. "--n-epoch")
    pub flag: String,
    /// Element type values are converted to
    pub value_type: Primitive,
    /// Number of values the flag takes (ignored for toggles)
    pub arity: Arity,
    /// Effective default; `None` makes the flag mandatory
    pub default: Option<Value>,
    /// Allowed values, if the field is an enumeration
    pub choices: Option<Vec<Value>>,
    /// Boolean semantics; `None` for value-taking flags
    pub toggle: Option<Toggle>,
    /// Help text from the schema
    pub help: Option<String>,
}

impl ArgRule {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    pub fn is_toggle(&self) -> bool {
        self.toggle.is_some()
    }
}

/// Parser specification derived from a [`Schema`].
///
/// Rules keep the schema's declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserSpec {
    /// Program name for usage output
    pub program: String,
    /// Program description for help output
    pub about: Option<String>,
    /// One rule per schema field
    pub rules: Vec<ArgRule>,
}

impl ParserSpec {
    /// Finds the rule for a field name.
    pub fn rule(&self, field: &str) -> Option<&ArgRule> {
        self.rules.iter().find(|r| r.field == field)
    }
}

/// Validates a schema and compiles it into a [`ParserSpec`].
///
/// Returns the first defect found, in declaration order.
///
/// # Errors
///
/// Any [`SchemaError`]: duplicate names, malformed composites, or defaults
/// that do not fit their declared type or choices.
pub fn compile(schema: &Schema) -> Result<ParserSpec, SchemaError> {
    if schema.name.trim().is_empty() {
        return Err(SchemaError::EmptyProgramName);
    }

    let mut seen_fields: HashSet<&str> = HashSet::new();
    let mut seen_flags: HashSet<String> = HashSet::new();
    let mut rules = Vec::with_capacity(schema.fields.len());

    for field in &schema.fields {
        validate_field_name(&field.name)?;
        if !seen_fields.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }

        let flag = field.flag_name();
        if RESERVED_FLAGS.contains(&flag.as_str()) {
            return Err(SchemaError::ReservedFlag(flag));
        }
        if !seen_flags.insert(flag.clone()) {
            return Err(SchemaError::DuplicateFlag(flag));
        }

        let rule = compile_field(field, flag)?;
        debug!(
            field = %rule.field,
            flag = %rule.flag,
            value_type = %rule.value_type,
            arity = rule.arity.count(),
            required = rule.is_required(),
            choices = rule.choices.as_ref().map_or(0, Vec::len),
            "Compiled argument rule"
        );
        rules.push(rule);
    }

    Ok(ParserSpec {
        program: schema.name.clone(),
        about: schema.description.clone(),
        rules,
    })
}

fn validate_field_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty()
        || name.starts_with(['-', '_'])
        || name.contains('=')
        || name.chars().any(char::is_whitespace)
    {
        return Err(SchemaError::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

fn compile_field(field: &FieldSchema, flag: String) -> Result<ArgRule, SchemaError> {
    let name = field.name.as_str();
    let (value_type, arity, mut choices) = resolve_type(name, &field.declared_type)?;

    if value_type == Primitive::Bool {
        let initial = match &field.default {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => return Err(type_mismatch(name, "bool".to_string(), other)),
        };
        let toggle = if initial {
            Toggle::SetFalse
        } else {
            Toggle::SetTrue
        };
        return Ok(ArgRule {
            field: name.to_string(),
            flag,
            value_type,
            arity: Arity::Single,
            default: Some(Value::Bool(initial)),
            choices: None,
            toggle: Some(toggle),
            help: field.help.clone(),
        });
    }

    let default = match &field.default {
        None => None,
        // Choices shorthand: a sequence default on a single-value field.
        Some(Value::List(items)) if arity == Arity::Single && choices.is_none() => {
            let shorthand = items
                .iter()
                .map(|item| coerce_scalar(name, value_type, item))
                .collect::<Result<Vec<_>, _>>()?;
            let first = shorthand
                .first()
                .cloned()
                .ok_or_else(|| SchemaError::EmptyChoices(name.to_string()))?;
            choices = Some(shorthand);
            Some(first)
        }
        Some(value) => Some(coerce_default(name, value_type, arity, value)?),
    };

    if let (Some(choices), Some(default)) = (&choices, &default) {
        if !choices.contains(default) {
            return Err(SchemaError::DefaultNotInChoices {
                field: name.to_string(),
                default: default.to_string(),
                choices: join_values(choices),
            });
        }
    }

    Ok(ArgRule {
        field: name.to_string(),
        flag,
        value_type,
        arity,
        default,
        choices,
        toggle: None,
        help: field.help.clone(),
    })
}

fn resolve_type(
    name: &str,
    declared: &FieldType,
) -> Result<(Primitive, Arity, Option<Vec<Value>>), SchemaError> {
    match declared {
        FieldType::Scalar(primitive) => Ok((*primitive, Arity::Single, None)),
        FieldType::Tuple(tags) => {
            let Some((&element, rest)) = tags.split_first() else {
                return Err(SchemaError::EmptyTuple(name.to_string()));
            };
            if rest.iter().any(|tag| *tag != element) {
                let types = tags
                    .iter()
                    .map(Primitive::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(SchemaError::MixedTupleTypes {
                    field: name.to_string(),
                    types,
                });
            }
            if element == Primitive::Bool {
                return Err(SchemaError::UnsupportedBoolComposite(name.to_string()));
            }
            Ok((element, Arity::Tuple(tags.len()), None))
        }
        FieldType::Choices(values) => {
            let Some(first) = values.first() else {
                return Err(SchemaError::EmptyChoices(name.to_string()));
            };
            let kind = literal_kind(name, first)?;
            for value in &values[1..] {
                let found = literal_kind(name, value)?;
                if found != kind {
                    return Err(SchemaError::InconsistentChoiceTypes {
                        field: name.to_string(),
                        expected: kind,
                        found,
                    });
                }
            }
            if kind == Primitive::Bool {
                return Err(SchemaError::UnsupportedBoolComposite(name.to_string()));
            }
            Ok((kind, Arity::Single, Some(values.clone())))
        }
    }
}

fn literal_kind(name: &str, value: &Value) -> Result<Primitive, SchemaError> {
    value.primitive().ok_or_else(|| SchemaError::InvalidChoice {
        field: name.to_string(),
        value: value.to_string(),
    })
}

fn coerce_default(
    name: &str,
    element: Primitive,
    arity: Arity,
    value: &Value,
) -> Result<Value, SchemaError> {
    match arity {
        Arity::Single => coerce_scalar(name, element, value),
        Arity::Tuple(n) => {
            let Value::List(items) = value else {
                return Err(type_mismatch(name, format!("a tuple of {n} {element}"), value));
            };
            if items.len() != n {
                return Err(SchemaError::TupleDefaultArity {
                    field: name.to_string(),
                    expected: n,
                    found: items.len(),
                });
            }
            items
                .iter()
                .map(|item| coerce_scalar(name, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
    }
}

/// Checks a literal against the element type; integers widen to floats.
fn coerce_scalar(name: &str, element: Primitive, value: &Value) -> Result<Value, SchemaError> {
    match (element, value) {
        (Primitive::Int, Value::Int(_))
        | (Primitive::Float, Value::Float(_))
        | (Primitive::Str, Value::Str(_))
        | (Primitive::Bool, Value::Bool(_)) => Ok(value.clone()),
        (Primitive::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        _ => Err(type_mismatch(name, element.to_string(), value)),
    }
}

fn type_mismatch(name: &str, expected: String, found: &Value) -> SchemaError {
    SchemaError::DefaultTypeMismatch {
        field: name.to_string(),
        expected,
        found: found.kind_name().to_string(),
    }
}

pub(crate) fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
