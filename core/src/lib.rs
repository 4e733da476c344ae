//! Declarative argument schemas for experiment scripts.
//!
//! A [`Schema`] lists the configuration fields of a program, each with a
//! declared type and an optional default. The crate turns it into a
//! command-line parser and a populated [`Config`]:
//!
//! - [`compile`] validates the schema and derives a [`ParserSpec`], one
//!   [`ArgRule`] per field. Schema defects are [`SchemaError`]s.
//! - [`ParserSpec::try_parse_from`] parses an argument vector into a
//!   [`Config`]. Bad input is a [`UsageError`].
//! - [`compile_and_parse`] does both against the live process arguments and
//!   exits with a usage message on bad input.
//!
//! Field flags are `--` plus the field name with underscores turned into
//! hyphens. Fields without a default are mandatory, booleans are toggles,
//! tuples take a fixed number of values and enumerations restrict the
//! accepted values.
//!
//! [`safe_open`] is a small companion for writing run outputs into
//! directories that may not exist yet.
//!
//! # Example
//!
//! ```
//! use argclass_core::*;
//!
//! let schema = Schema::new("train")
//!     .with_field(FieldSchema::new("n_epoch", Primitive::Int).with_default(100))
//!     .with_field(
//!         FieldSchema::new("model", Primitive::Str).with_default(["bert", "roberta", "albert"]),
//!     )
//!     .with_field(FieldSchema::new("output_dir", Primitive::Str))
//!     .with_field(FieldSchema::new("use_cpu", Primitive::Bool))
//!     .with_field(
//!         FieldSchema::new("beta", FieldType::tuple(Primitive::Float, 2)).with_default([0.2, 0.4]),
//!     );
//!
//! let config = try_compile_and_parse_from(
//!     &schema,
//!     ["train", "--model", "roberta", "--output-dir", "/tmp/x", "--beta", "0.1", "0.9"],
//! )
//! .unwrap();
//!
//! assert_eq!(config.int("n_epoch"), Some(100));
//! assert_eq!(config.str("model"), Some("roberta"));
//! assert_eq!(config.flag("use_cpu"), Some(false));
//! assert_eq!(config.get("beta"), Some(&Value::from([0.1, 0.9])));
//! ```

mod compile;
mod config;
mod error;
mod fs;
mod load;
mod parse;
mod types;

pub use compile::{ArgRule, Arity, ParserSpec, Toggle, compile};
pub use config::Config;
pub use error::{Error, Result, SchemaError, UsageError};
pub use fs::{OpenMode, safe_open};
pub use parse::{compile_and_parse, try_compile_and_parse_from};
pub use types::*;
