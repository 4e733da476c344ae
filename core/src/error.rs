//! Error types for schema compilation and argument parsing.
//!
//! [`SchemaError`] covers static defects in a schema declaration and is
//! raised before any argument is read. [`UsageError`] covers bad command-line
//! input against a valid schema. [`Error`] unifies both with the I/O and
//! serialization failures of schema loading.

use thiserror::Error;

use crate::Primitive;

/// Static defects in a schema declaration.
///
/// Detected while building the parser specification. Values are carried as
/// their rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Program name is empty or whitespace-only.
    #[error("schema program name cannot be empty")]
    EmptyProgramName,
    /// Field name is empty, starts with `-` or `_`, or contains whitespace or `=`.
    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),
    /// Two fields share a name.
    #[error("duplicate field in schema: {0}")]
    DuplicateField(String),
    /// Two distinct field names map to the same flag (e.g. `a_b` and `a-b`).
    #[error("duplicate flag in schema: {0}")]
    DuplicateFlag(String),
    /// A field would shadow a flag the parser provides itself.
    #[error("flag is reserved: {0}")]
    ReservedFlag(String),
    /// Tuple type with no element tags.
    #[error("tuple type for field '{0}' must declare at least one element")]
    EmptyTuple(String),
    /// Tuple element tags are not all the same.
    #[error("tuple type for field '{field}' mixes element types: {types}")]
    MixedTupleTypes { field: String, types: String },
    /// Enumeration or choices-shorthand default with no values.
    #[error("choices for field '{0}' cannot be empty")]
    EmptyChoices(String),
    /// Enumeration entry that is not a literal scalar.
    #[error("choice for field '{field}' must be a literal value, got {value:?}")]
    InvalidChoice { field: String, value: String },
    /// Enumeration literals of different primitive kinds.
    #[error("choices for field '{field}' mix types: expected {expected}, found {found}")]
    InconsistentChoiceTypes {
        field: String,
        expected: Primitive,
        found: Primitive,
    },
    /// Boolean tuples and boolean enumerations have no flag form.
    #[error("field '{0}' cannot combine bool with a tuple or choices")]
    UnsupportedBoolComposite(String),
    /// Default value does not fit the declared type.
    #[error("default for field '{field}' must be {expected}, got {found}")]
    DefaultTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// Tuple default with the wrong number of elements.
    #[error("default for field '{field}' must have {expected} element(s), got {found}")]
    TupleDefaultArity {
        field: String,
        expected: usize,
        found: usize,
    },
    /// Default value outside the allowed choices.
    #[error("the default value is invalid for field '{field}': {default:?} is not one of [{choices}]")]
    DefaultNotInChoices {
        field: String,
        default: String,
        choices: String,
    },
}

/// Bad command-line input: unknown flag, wrong arity, value outside the
/// choices, failed conversion, or a missing mandatory flag.
///
/// Wraps the parser's error so it renders the conventional usage message.
/// [`UsageError::exit`] prints it to stderr and exits with status 2
/// (`--help` prints to stdout and exits 0).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct UsageError(#[from] clap::Error);

impl UsageError {
    /// Returns the parser's classification of the failure.
    pub fn kind(&self) -> clap::error::ErrorKind {
        self.0.kind()
    }

    /// Exit status the process uses for this error.
    pub fn exit_code(&self) -> i32 {
        self.0.exit_code()
    }

    /// Renders the full usage message.
    pub fn render(&self) -> String {
        self.0.render().to_string()
    }

    /// Prints the usage message and terminates the process.
    pub fn exit(&self) -> ! {
        self.0.exit()
    }
}

/// Errors that can occur anywhere in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema declaration defect.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Command-line input rejected.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing, serialization or config deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
