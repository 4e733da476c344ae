//! Command-line parsing against a compiled [`ParserSpec`].
//!
//! A [`ParserSpec`] is rendered into a [`clap::Command`] built at runtime, one
//! long flag per rule. Conversions and choice checks run in a typed value
//! parser so bad input is reported with the usual usage message.

use std::ffi::{OsStr, OsString};

use clap::builder::{PossibleValue, TypedValueParser};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::compile::join_values;
use crate::{
    Arity, ArgRule, Config, ParserSpec, Primitive, Result, Schema, SchemaError, Toggle, UsageError,
    Value, compile,
};

impl ParserSpec {
    /// Builds the [`clap::Command`] for this spec.
    ///
    /// A repeated flag overrides its earlier occurrence, and an unambiguous
    /// prefix of a long flag selects it (`--n-ep` for `--n-epoch`).
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.program.clone())
            .args_override_self(true)
            .infer_long_args(true);
        if let Some(about) = &self.about {
            cmd = cmd.about(about.clone());
        }
        for rule in &self.rules {
            cmd = cmd.arg(rule_to_arg(rule));
        }
        cmd
    }

    /// Parses an argument vector; the first element is the program name.
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for unknown flags, wrong value counts, values
    /// outside the choices, failed conversions and missing mandatory flags.
    /// `--help` is also reported as a [`UsageError`] of kind
    /// [`ErrorKind::DisplayHelp`].
    ///
    /// # Examples
    ///
    /// ```
    /// use argclass_core::*;
    ///
    /// let schema = Schema::new("train")
    ///     .with_field(FieldSchema::new("n_epoch", Primitive::Int).with_default(100))
    ///     .with_field(FieldSchema::new("output_dir", Primitive::Str));
    /// let spec = compile(&schema).unwrap();
    ///
    /// let config = spec.try_parse_from(["train", "--output-dir", "/tmp/x"]).unwrap();
    /// assert_eq!(config.int("n_epoch"), Some(100));
    /// assert_eq!(config.str("output_dir"), Some("/tmp/x"));
    ///
    /// assert!(spec.try_parse_from(["train"]).is_err());
    /// ```
    pub fn try_parse_from<I, T>(&self, args: I) -> std::result::Result<Config, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.command().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) => {
                debug!(program = %self.program, kind = ?err.kind(), "Command line rejected");
                return Err(err.into());
            }
        };
        let config = self.collect(&matches)?;
        debug!(program = %self.program, fields = config.len(), "Parsed command line");
        Ok(config)
    }

    /// Parses an argument vector, exiting the process on a usage error.
    ///
    /// The usage message goes to stderr and the exit status is 2; `--help`
    /// prints to stdout and exits 0.
    pub fn parse_from<I, T>(&self, args: I) -> Config
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.try_parse_from(args).unwrap_or_else(|err| err.exit())
    }

    /// Parses the live process arguments, exiting on a usage error.
    pub fn parse(&self) -> Config {
        self.parse_from(std::env::args_os())
    }

    fn collect(&self, matches: &ArgMatches) -> std::result::Result<Config, UsageError> {
        let mut config = Config::new(&self.program);
        for rule in &self.rules {
            let id = rule.field.as_str();
            let supplied = match (rule.toggle, rule.arity) {
                (Some(_), _) => Some(Value::Bool(matches.get_flag(id))),
                (None, Arity::Single) => matches.get_one::<Value>(id).cloned(),
                (None, Arity::Tuple(_)) => matches
                    .get_many::<Value>(id)
                    .map(|values| Value::List(values.cloned().collect())),
            };
            let value = supplied.or_else(|| rule.default.clone()).ok_or_else(|| {
                let message = format!("the following required argument was not provided: {}", rule.flag);
                UsageError::from(
                    clap::Error::raw(ErrorKind::MissingRequiredArgument, message)
                        .with_cmd(&self.command()),
                )
            })?;
            config.insert(&rule.field, value);
        }
        Ok(config)
    }
}

/// Compiles `schema` and parses the live process arguments.
///
/// A usage error prints the usage message to stderr and terminates the
/// process with a non-zero status; only schema defects are returned.
///
/// # Errors
///
/// Returns the [`SchemaError`] found while compiling, before any argument is
/// read.
pub fn compile_and_parse(schema: &Schema) -> std::result::Result<Config, SchemaError> {
    let spec = compile(schema)?;
    Ok(spec.parse())
}

/// Compiles `schema` and parses an explicit argument vector.
///
/// # Examples
///
/// ```
/// use argclass_core::*;
///
/// let schema = Schema::new("train")
///     .with_field(FieldSchema::new("use_cpu", Primitive::Bool));
///
/// let config = try_compile_and_parse_from(&schema, ["train", "--use-cpu"]).unwrap();
/// assert_eq!(config.flag("use_cpu"), Some(true));
///
/// let err = try_compile_and_parse_from(&schema, ["train", "--gpu"]).unwrap_err();
/// assert!(matches!(err, Error::Usage(_)));
/// ```
pub fn try_compile_and_parse_from<I, T>(schema: &Schema, args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let spec = compile(schema)?;
    Ok(spec.try_parse_from(args)?)
}

fn rule_to_arg(rule: &ArgRule) -> Arg {
    let long = rule.flag.strip_prefix("--").unwrap_or(&rule.flag).to_string();
    let arg = Arg::new(rule.field.clone())
        .long(long)
        .help(help_text(rule));

    match rule.toggle {
        Some(Toggle::SetTrue) => arg.action(ArgAction::SetTrue),
        Some(Toggle::SetFalse) => arg.action(ArgAction::SetFalse),
        // No flag looks like a number, so "-1" is always a value.
        None => arg
            .action(ArgAction::Set)
            .num_args(rule.arity.count())
            .value_name(rule.field.to_uppercase())
            .required(rule.is_required())
            .allow_negative_numbers(true)
            .value_parser(FieldValueParser {
                kind: rule.value_type,
                choices: rule.choices.clone(),
            }),
    }
}

fn help_text(rule: &ArgRule) -> String {
    let mut help = rule.help.clone().unwrap_or_default();
    let suffix = match (rule.toggle, &rule.default) {
        (Some(Toggle::SetFalse), _) => Some("[default: true]".to_string()),
        (Some(Toggle::SetTrue), _) => None,
        (None, Some(default)) => Some(format!("[default: {default}]")),
        (None, None) => None,
    };
    if let Some(suffix) = suffix {
        if !help.is_empty() {
            help.push(' ');
        }
        help.push_str(&suffix);
    }
    help
}

/// Converts raw text into a [`Value`] of one primitive kind and checks it
/// against the allowed choices.
#[derive(Debug, Clone)]
struct FieldValueParser {
    kind: Primitive,
    choices: Option<Vec<Value>>,
}

impl FieldValueParser {
    fn convert(&self, text: &str) -> std::result::Result<Value, String> {
        match self.kind {
            Primitive::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("invalid int value: {e}")),
            Primitive::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| format!("invalid float value: {e}")),
            Primitive::Str => Ok(Value::Str(text.to_string())),
            Primitive::Bool => text
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|e| format!("invalid bool value: {e}")),
        }
    }
}

impl TypedValueParser for FieldValueParser {
    type Value = Value;

    fn parse_ref(
        &self,
        cmd: &Command,
        arg: Option<&Arg>,
        raw: &OsStr,
    ) -> std::result::Result<Value, clap::Error> {
        let flag = arg.map_or_else(|| "...".to_string(), ToString::to_string);
        let Some(text) = raw.to_str() else {
            let message = format!("invalid UTF-8 was detected in the value for '{flag}'");
            return Err(clap::Error::raw(ErrorKind::InvalidUtf8, message).with_cmd(cmd));
        };

        let value = self.convert(text).map_err(|reason| {
            let message = format!("invalid value '{text}' for '{flag}': {reason}");
            clap::Error::raw(ErrorKind::ValueValidation, message).with_cmd(cmd)
        })?;

        if let Some(choices) = &self.choices {
            if !choices.contains(&value) {
                let message = format!(
                    "invalid value '{text}' for '{flag}'\n  [possible values: {}]",
                    join_values(choices)
                );
                return Err(clap::Error::raw(ErrorKind::InvalidValue, message).with_cmd(cmd));
            }
        }

        Ok(value)
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        self.choices.as_ref().map(|choices| {
            Box::new(choices.iter().map(|v| PossibleValue::new(v.to_string())))
                as Box<dyn Iterator<Item = PossibleValue> + '_>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldSchema, FieldType};

    fn train_schema() -> Schema {
        Schema::new("train")
            .with_field(FieldSchema::new("n_epoch", Primitive::Int).with_default(100))
            .with_field(
                FieldSchema::new("model", Primitive::Str)
                    .with_default(["bert", "roberta", "albert"]),
            )
            .with_field(FieldSchema::new("output_dir", Primitive::Str))
            .with_field(FieldSchema::new("device", Primitive::Str).with_default("cuda:0"))
            .with_field(FieldSchema::new("use_cpu", Primitive::Bool))
            .with_field(
                FieldSchema::new("beta", FieldType::tuple(Primitive::Float, 2))
                    .with_default([0.2, 0.4]),
            )
    }

    fn parse(args: &[&str]) -> std::result::Result<Config, UsageError> {
        let spec = compile(&train_schema()).unwrap();
        let argv = std::iter::once("train").chain(args.iter().copied());
        spec.try_parse_from(argv)
    }

    #[test]
    fn test_defaults_fill_missing_flags() {
        let config = parse(&["--output-dir", "/tmp/x"]).unwrap();
        assert_eq!(config.len(), 6);
        assert_eq!(config.int("n_epoch"), Some(100));
        assert_eq!(config.str("model"), Some("bert"));
        assert_eq!(config.str("output_dir"), Some("/tmp/x"));
        assert_eq!(config.str("device"), Some("cuda:0"));
        assert_eq!(config.flag("use_cpu"), Some(false));
        assert_eq!(config.get("beta"), Some(&Value::from([0.2, 0.4])));
    }

    #[test]
    fn test_missing_mandatory_flag_is_usage_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
        assert!(err.render().contains("--output-dir"));
    }

    #[test]
    fn test_choices_shorthand_accepts_listed_value() {
        let config = parse(&["--output-dir", "o", "--model", "roberta"]).unwrap();
        assert_eq!(config.str("model"), Some("roberta"));
    }

    #[test]
    fn test_choices_shorthand_rejects_unlisted_value() {
        let err = parse(&["--output-dir", "o", "--model", "gpt2"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
        assert!(err.render().contains("gpt2"));
    }

    #[test]
    fn test_tuple_collects_exact_arity() {
        let config = parse(&["--output-dir", "o", "--beta", "0.1", "0.9"]).unwrap();
        assert_eq!(config.get("beta"), Some(&Value::from([0.1, 0.9])));
        assert_eq!(config.list("beta").map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_tuple_wrong_arity_is_usage_error() {
        assert!(parse(&["--output-dir", "o", "--beta", "0.1"]).is_err());
        assert!(parse(&["--output-dir", "o", "--beta", "0.1", "--use-cpu"]).is_err());
        assert!(parse(&["--output-dir", "o", "--beta", "0.1", "0.2", "0.3"]).is_err());
    }

    #[test]
    fn test_bool_without_default_toggles_on() {
        let config = parse(&["--output-dir", "o", "--use-cpu"]).unwrap();
        assert_eq!(config.flag("use_cpu"), Some(true));
    }

    #[test]
    fn test_bool_with_true_default_toggles_off() {
        let schema = Schema::new("prog")
            .with_field(FieldSchema::new("shuffle", Primitive::Bool).with_default(true));
        let spec = compile(&schema).unwrap();

        let config = spec.try_parse_from(["prog"]).unwrap();
        assert_eq!(config.flag("shuffle"), Some(true));

        let config = spec.try_parse_from(["prog", "--shuffle"]).unwrap();
        assert_eq!(config.flag("shuffle"), Some(false));
    }

    #[test]
    fn test_bool_with_false_default_toggles_on() {
        let schema = Schema::new("prog")
            .with_field(FieldSchema::new("dry_run", Primitive::Bool).with_default(false));
        let spec = compile(&schema).unwrap();

        assert_eq!(spec.try_parse_from(["prog"]).unwrap().flag("dry_run"), Some(false));
        assert_eq!(
            spec.try_parse_from(["prog", "--dry-run"]).unwrap().flag("dry_run"),
            Some(true)
        );
    }

    #[test]
    fn test_conversion_failure_is_usage_error() {
        let err = parse(&["--output-dir", "o", "--n-epoch", "ten"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.render().contains("ten"));
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = parse(&["--output-dir", "o", "--learning-rate", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_negative_numbers_are_values() {
        let schema = Schema::new("prog")
            .with_field(FieldSchema::new("offset", Primitive::Int).with_default(0))
            .with_field(FieldSchema::new("lr", Primitive::Float).with_default(0.1));
        let spec = compile(&schema).unwrap();
        let config = spec
            .try_parse_from(["prog", "--offset", "-3", "--lr", "-0.5"])
            .unwrap();
        assert_eq!(config.int("offset"), Some(-3));
        assert_eq!(config.float("lr"), Some(-0.5));
    }

    #[test]
    fn test_negative_looking_strings_are_values() {
        let config = parse(&["--output-dir", "o", "--device", "-1"]).unwrap();
        assert_eq!(config.get("device"), Some(&Value::Str("-1".to_string())));

        let schema = Schema::new("prog").with_field(
            FieldSchema::new("gpus", FieldType::tuple(Primitive::Str, 2)).with_default(["0", "1"]),
        );
        let spec = compile(&schema).unwrap();
        let config = spec.try_parse_from(["prog", "--gpus", "-1", "-2"]).unwrap();
        assert_eq!(config.get("gpus"), Some(&Value::from(["-1", "-2"])));
    }

    #[test]
    fn test_unambiguous_prefix_selects_flag() {
        let config = parse(&["--output-dir", "o", "--n-ep", "5"]).unwrap();
        assert_eq!(config.int("n_epoch"), Some(5));

        let config = parse(&["--out", "o", "--use"]).unwrap();
        assert_eq!(config.str("output_dir"), Some("o"));
        assert_eq!(config.flag("use_cpu"), Some(true));
    }

    #[test]
    fn test_ambiguous_prefix_is_usage_error() {
        let schema = Schema::new("prog")
            .with_field(FieldSchema::new("lr", Primitive::Float).with_default(0.1))
            .with_field(FieldSchema::new("lr_decay", Primitive::Float).with_default(0.9));
        let spec = compile(&schema).unwrap();

        // An exact name wins over longer flags sharing it as a prefix.
        let config = spec.try_parse_from(["prog", "--lr", "0.5"]).unwrap();
        assert_eq!(config.float("lr"), Some(0.5));
        assert_eq!(config.float("lr_decay"), Some(0.9));

        let err = spec.try_parse_from(["prog", "--l", "0.5"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_repeated_flag_last_wins() {
        let config = parse(&["--output-dir", "a", "--output-dir", "b"]).unwrap();
        assert_eq!(config.str("output_dir"), Some("b"));
    }

    #[test]
    fn test_typed_enumeration() {
        let schema = Schema::new("prog").with_field(
            FieldSchema::new("batch_size", FieldType::choices([16, 32, 64])).with_default(32),
        );
        let spec = compile(&schema).unwrap();

        assert_eq!(spec.try_parse_from(["prog"]).unwrap().int("batch_size"), Some(32));
        assert_eq!(
            spec.try_parse_from(["prog", "--batch-size", "64"])
                .unwrap()
                .int("batch_size"),
            Some(64)
        );
        let err = spec
            .try_parse_from(["prog", "--batch-size", "48"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_help_lists_fields_in_order() {
        let spec = compile(&train_schema()).unwrap();
        let help = spec.command().render_help().to_string();
        let n_epoch = help.find("--n-epoch").unwrap();
        let beta = help.find("--beta").unwrap();
        assert!(n_epoch < beta);
        assert!(help.contains("[default: 100]"));
        assert!(help.contains("roberta"));

        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_compile_and_parse_from_reports_schema_errors_first() {
        let schema = Schema::new("prog")
            .with_field(FieldSchema::new("x", FieldType::choices(["a"])).with_default("b"));
        let err = try_compile_and_parse_from(&schema, ["prog", "--bogus"]).unwrap_err();
        assert!(matches!(err, crate::Error::Schema(SchemaError::DefaultNotInChoices { .. })));
    }
}
