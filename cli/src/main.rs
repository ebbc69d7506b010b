//! keytree: load layered configuration and print it.
//!
//! # Usage
//!
//! ```text
//! keytree -f base.json -f local.yaml get db.host
//! keytree -f base.json --env-prefix APP_ dump --format yaml
//! keytree -f base.json --set db.port=5433 keys db
//! ```

mod cli;
mod error;

use clap::Parser;
use keytree_core::{file_loader, Config, EnvLoader, Key, KeyParser, LoadError, SeparatorKeyParser, Value, Values};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, DumpFormat};
use error::{exit_with_error, CliError, CliResult};


fn init_tracing(cli: &Cli) {
    // -q always wins; -v forces debug; otherwise KEYTREE_LOG, defaulting to warn.
    let filter = if cli.quiet {
        EnvFilter::new("off")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("KEYTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}


fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => exit_with_error(e),
    }
}


fn run(cli: &Cli) -> CliResult<String> {
    let config = build_config(cli)?;

    match &cli.command {
        Commands::Get { key } => match config.get(key) {
            Some(Value::Values(sub)) => Ok(serde_json::to_string_pretty(&sub)?),
            Some(value) => Ok(value.to_string()),
            None => Err(CliError::NotFound(key.clone())),
        },
        Commands::Dump { format } => render(config.values(), *format, &cli.separator),
        Commands::Keys { prefix } => {
            let prefix = prefix
                .as_deref()
                .map(|p| config.new_key(p))
                .unwrap_or_default();
            let keys: Vec<String> = config
                .values()
                .keys()
                .into_iter()
                .filter(|k| k.starts_with(&prefix))
                .map(|k| join(&k, &cli.separator))
                .collect();
            Ok(keys.join("\n"))
        }
    }
}


/// Register every source named on the command line and load them as one batch:
/// files in order, then the environment, then `--set` overrides.
fn build_config(cli: &Cli) -> CliResult<Config> {
    if cli.separator.is_empty() {
        return Err(CliError::Usage("--separator must not be empty".into()));
    }
    let parser = SeparatorKeyParser::new(cli.separator.clone());
    let overrides = parse_sets(&cli.sets, &parser)?;
    let config = Config::new().with_key_parser(parser);

    for path in &cli.files {
        config.add_loaders([file_loader(path.clone())?]);
    }
    if let Some(prefix) = &cli.env_prefix {
        config.add_loader(EnvLoader::lower_underscore(prefix.clone()));
    }
    if !overrides.is_empty() {
        config.add_loader(move || Ok::<_, LoadError>(overrides.clone()));
    }

    let changed = config.load_all()?;
    debug!(sources = config.loader_count(), changed, "configuration loaded");
    Ok(config)
}


fn parse_sets(sets: &[String], parser: &dyn KeyParser) -> CliResult<Values> {
    let values = Values::new();
    for set in sets {
        let Some((raw_key, raw_value)) = set.split_once('=') else {
            return Err(CliError::Usage(format!("--set expects KEY=VALUE, got '{}'", set)));
        };
        let raw_key = raw_key.trim();
        let key = parser.parse(raw_key);
        if raw_key.is_empty() || key.segments().iter().all(|s| s.is_empty()) {
            return Err(CliError::Usage(format!("--set has an empty key in '{}'", set)));
        }
        values.put(&key, parse_value(raw_value));
    }
    Ok(values)
}

/// JSON when the text parses as JSON, otherwise the text itself.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}


fn render(values: &Values, format: DumpFormat, separator: &str) -> CliResult<String> {
    match format {
        DumpFormat::Json => Ok(serde_json::to_string_pretty(values)?),
        DumpFormat::Yaml => Ok(serde_yaml::to_string(values)?.trim_end().to_string()),
        DumpFormat::Flat => {
            let lines: Vec<String> = values
                .key_values()
                .into_iter()
                .map(|kv| format!("{} = {}", join(&kv.key, separator), kv.value))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

fn join(key: &Key, separator: &str) -> String {
    key.segments().join(separator)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn set_values_are_typed_when_json() {
        let parser = SeparatorKeyParser::default();
        let sets = vec![
            "port=8080".to_string(),
            "name=svc".to_string(),
            "tls=true".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
        ];
        let values = parse_sets(&sets, &parser).unwrap();
        assert_eq!(values.get(&Key::from(["port"])), Some(Value::I64(8080)));
        assert_eq!(values.get(&Key::from(["name"])), Some(Value::from("svc")));
        assert_eq!(values.get(&Key::from(["tls"])), Some(Value::Bool(true)));
        assert_eq!(
            values.get(&Key::from(["tags"])),
            Some(Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn malformed_set_is_usage_error() {
        let parser = SeparatorKeyParser::default();
        match parse_sets(&["novalue".to_string()], &parser) {
            Err(CliError::Usage(msg)) => assert!(msg.contains("novalue")),
            other => panic!("expected Usage, got {:?}", other.map(|v| v.len())),
        }
        for bad in ["=1", "  =1", "..=1"] {
            match parse_sets(&[bad.to_string()], &parser) {
                Err(CliError::Usage(msg)) => assert!(msg.contains("empty key")),
                other => panic!("expected Usage for {:?}, got {:?}", bad, other.map(|v| v.len())),
            }
        }
        let values = parse_sets(&["a..b=1".to_string()], &parser).unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn get_reads_layered_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("base.json");
        fs::write(&base, r#"{"db": {"host": "localhost", "port": 5432}}"#).unwrap();
        let base = base.to_string_lossy().into_owned();

        let cli = parse(&["keytree", "-f", &base, "--set", "db.port=5433", "get", "db.port"]);
        assert_eq!(run(&cli).unwrap(), "5433");

        let cli = parse(&["keytree", "-f", &base, "get", "db.host"]);
        assert_eq!(run(&cli).unwrap(), "localhost");

        let cli = parse(&["keytree", "-f", &base, "get", "db.user"]);
        assert!(matches!(run(&cli), Err(CliError::NotFound(_))));
    }

    #[test]
    fn keys_and_flat_dump_use_separator() {
        let cli = parse(&[
            "keytree",
            "--separator",
            "/",
            "--set",
            "a/b=1",
            "--set",
            "a/c=x",
            "--set",
            "z=2",
            "keys",
            "a",
        ]);
        assert_eq!(run(&cli).unwrap(), "a/b\na/c");

        let cli = parse(&["keytree", "--set", "a.b=1", "--set", "z=two", "dump", "--format", "flat"]);
        assert_eq!(run(&cli).unwrap(), "a.b = 1\nz = two");
    }

    #[test]
    fn json_dump_nests() {
        let cli = parse(&["keytree", "--set", "a.b=1", "dump"]);
        let out: serde_json::Value = serde_json::from_str(&run(&cli).unwrap()).unwrap();
        assert_eq!(out, serde_json::json!({"a": {"b": 1}}));
    }

    #[test]
    fn unsupported_file_extension_fails() {
        let cli = parse(&["keytree", "-f", "settings.toml", "dump"]);
        assert!(matches!(
            run(&cli),
            Err(CliError::Load(LoadError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn empty_separator_rejected() {
        let cli = parse(&["keytree", "--separator", "", "dump"]);
        assert!(matches!(run(&cli), Err(CliError::Usage(_))));
    }
}
