//! Schema file loading.
//!
//! Schemas can be kept next to experiment scripts as JSON or YAML files.
//!
//! # Example YAML
//!
//! ```yaml
//! name: train
//! description: Fine-tune a model
//! fields:
//!   - { name: n_epoch, type: int, default: 100 }
//!   - { name: model, type: str, default: [bert, roberta, albert] }
//!   - { name: output_dir, type: str }
//!   - { name: use_cpu, type: bool }
//!   - { name: beta, type: { tuple: [float, float] }, default: [0.2, 0.4] }
//! ```

use std::io::BufReader;
use std::path::Path;

use crate::{Result, Schema};

impl Schema {
    /// Parses a schema from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Json`](crate::Error::Json) if the text is not a valid schema.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a schema from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Yaml`](crate::Error::Yaml) if the text is not a valid schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use argclass_core::*;
    ///
    /// let schema = Schema::from_yaml_str(r#"
    /// name: train
    /// fields:
    ///   - { name: n_epoch, type: int, default: 100 }
    ///   - { name: option, type: { choices: [A, B, C] }, default: A }
    /// "#).unwrap();
    ///
    /// assert_eq!(schema.field_names(), vec!["n_epoch", "option"]);
    /// assert_eq!(schema.fields[1].declared_type, FieldType::choices(["A", "B", "C"]));
    /// ```
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a schema file, choosing the format from the extension.
    ///
    /// `.json` files are read as JSON; anything else (`.yaml`, `.yml`, no
    /// extension) as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) if the file cannot be read, or the
    /// format's parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let schema: Schema = if is_json {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(schema)
    }
}
