use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use argclass_core::{Config, OpenMode, ParserSpec, Schema, Value, compile, safe_open};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output format for resolved configurations.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    /// `NAME=value` lines for `eval` in shell scripts.
    Env,
}

#[derive(Debug, Parser)]
#[command(name = "argclass")]
#[command(about = "Resolve experiment configurations from argument schema files")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse arguments against a schema and print the resolved configuration.
    Resolve(ResolveArgs),
    /// Validate a schema file and list its compiled flags.
    Check(CheckArgs),
    /// Print the usage text generated for a schema.
    Usage(UsageArgs),
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    schema: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Write the configuration to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Arguments for the schema, after `--`.
    #[arg(last = true)]
    args: Vec<OsString>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema file (JSON or YAML).
    #[arg(required = true)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Schema file (JSON or YAML).
    #[arg(required = true)]
    schema: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Check(args) => run_check(args),
        Command::Usage(args) => run_usage(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_spec(path: &Path) -> Result<ParserSpec, String> {
    let schema = Schema::load(path)
        .map_err(|err| format!("Failed to load schema '{}': {err}", path.display()))?;
    let spec = compile(&schema)
        .map_err(|err| format!("Invalid schema '{}': {err}", path.display()))?;
    debug!(schema = %path.display(), fields = spec.rules.len(), "Compiled schema");
    Ok(spec)
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let spec = load_spec(&args.schema)?;

    // Usage errors print the schema's own usage and exit with status 2.
    let argv = std::iter::once(OsString::from(&spec.program)).chain(args.args);
    let config = spec.parse_from(argv);

    let rendered = render_config(&config, args.format)?;
    match &args.output {
        Some(path) => {
            let mut file = safe_open(path, OpenMode::Write)
                .map_err(|err| format!("Failed to open '{}': {err}", path.display()))?;
            file.write_all(rendered.as_bytes())
                .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
            info!(path = %path.display(), fields = config.len(), "Wrote configuration");
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let spec = load_spec(&args.schema)?;

    println!(
        "Schema '{}' is valid: {} field(s).",
        spec.program,
        spec.rules.len()
    );
    for rule in &spec.rules {
        let mut line = format!("  {:<24} {}", rule.flag, rule.value_type);
        if rule.arity.count() > 1 {
            line.push_str(&format!(" x{}", rule.arity.count()));
        }
        if let Some(choices) = &rule.choices {
            let choices: Vec<String> = choices.iter().map(Value::to_string).collect();
            line.push_str(&format!(" {{{}}}", choices.join(", ")));
        }
        match &rule.default {
            _ if rule.is_toggle() => line.push_str(" (toggle)"),
            Some(default) => line.push_str(&format!(" [default: {default}]")),
            None => line.push_str(" (required)"),
        }
        println!("{line}");
    }

    Ok(())
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let spec = load_spec(&args.schema)?;
    print!("{}", spec.command().render_help());
    Ok(())
}

fn render_config(config: &Config, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(config)
            .map(|json| format!("{json}\n"))
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(config).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        CliOutputFormat::Env => config_to_env(config),
    }
}

/// Keys must stay distinct after upper-casing, or `eval` would silently
/// overwrite one field with another.
fn config_to_env(config: &Config) -> Result<String, String> {
    let mut out = String::new();
    let mut keys: HashMap<String, &str> = HashMap::new();
    for (name, value) in config.iter() {
        let key = name.replace('-', "_").to_uppercase();
        if let Some(previous) = keys.insert(key.clone(), name) {
            return Err(format!(
                "Fields '{previous}' and '{name}' both map to environment variable '{key}'"
            ));
        }
        let rendered = match value {
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => value.to_string(),
            Value::Str(_) | Value::List(_) => shell_quote(&value.to_string()),
        };
        out.push_str(&format!("{key}={rendered}\n"));
    }
    Ok(out)
}

fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
