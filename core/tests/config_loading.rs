//! End-to-end loading: files, environment and flags feeding one `Config`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, Command};
use keytree_core::loader::Loader;
use keytree_core::{file_loader, Config, EnvLoader, FlagLoader, JsonLoader, LoadError, Value, YamlLoader};
use tempfile::TempDir;


fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}


#[test]
fn later_sources_override_earlier_ones() {
    let dir = TempDir::new().unwrap();
    let json = write(
        &dir,
        "base.json",
        r#"{"db": {"host": "localhost", "port": 5432}, "debug": false}"#,
    );
    let yaml = write(&dir, "override.yaml", "db:\n  host: db.internal\nfeatures: [a, b]\n");

    let config = Config::new();
    config
        .add_loader(JsonLoader::new().file(json))
        .add_loader(YamlLoader::new().file(yaml))
        .add_loader(EnvLoader::lower_underscore("APP_").with_vars([("APP_DEBUG", "true")]));

    assert!(config.load_all().unwrap());
    assert_eq!(config.get_string("db.host"), Some("db.internal".into()));
    assert_eq!(config.get_i64("db.port"), Some(5432));
    assert_eq!(config.get_string("debug"), Some("true".into()));
    assert_eq!(
        config.get_list("features"),
        Some(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn flags_layer_over_files() {
    let dir = TempDir::new().unwrap();
    let yaml = write(&dir, "app.yml", "log:\n  level: info\nport: 80\n");
    let command = Command::new("app")
        .arg(Arg::new("log-level").long("log-level"))
        .arg(Arg::new("port").long("port").value_parser(clap::value_parser!(u16)));

    let config = Config::new();
    config
        .add_loaders([file_loader(&yaml).unwrap()])
        .add_loader(FlagLoader::new(command).args(["app", "--log-level", "trace"]));

    config.load_all().unwrap();
    assert_eq!(config.get_string("log.level"), Some("trace".into()));
    assert_eq!(config.get_u64("port"), Some(80));
}

#[test]
fn missing_file_leaves_config_untouched() {
    let dir = TempDir::new().unwrap();
    let present = write(&dir, "present.json", r#"{"a": 1}"#);
    let missing = dir.path().join("missing.json");

    let config = Config::new();
    config.put("existing", true);
    config
        .add_loader(JsonLoader::new().file(present))
        .add_loader(JsonLoader::new().file(missing.clone()));

    match config.load_all() {
        Err(LoadError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Io error, got {:?}", other),
    }
    assert_eq!(config.get("a"), None);
    assert_eq!(config.get_bool("existing"), Some(true));
}

#[test]
fn malformed_file_aborts_batch() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.yaml", "a: 1\n");
    let bad = write(&dir, "bad.json", "{ not json");

    let config = Config::new();
    let loaders: Vec<Arc<dyn Loader>> = vec![file_loader(&good).unwrap(), file_loader(&bad).unwrap()];
    config.add_loaders(loaders);

    assert!(matches!(config.load_all(), Err(LoadError::Json(_))));
    assert!(config.values().is_empty());
}

#[test]
fn reloading_picks_up_file_changes() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "live.json", r#"{"mode": "a"}"#);

    let config = Config::new();
    config.add_loader(JsonLoader::new().file(path.clone()));
    assert!(config.load_all().unwrap());
    assert!(!config.load_all().unwrap());

    fs::write(&path, r#"{"mode": "b"}"#).unwrap();
    assert!(config.load_all().unwrap());
    assert_eq!(config.get_string("mode"), Some("b".into()));
}

#[test]
fn one_shot_reader_is_exhausted_on_reload() {
    let config = Config::new();
    config.add_loader(JsonLoader::new().reader(std::io::Cursor::new(r#"{"k": "v"}"#)));
    assert!(config.load_all().unwrap());
    assert!(matches!(config.load_all(), Err(LoadError::Exhausted)));
    assert_eq!(config.get_string("k"), Some("v".into()));
}

#[test]
fn help_flag_loads_nothing() {
    let config = Config::new();
    config.put("kept", 1i64);
    let command = Command::new("app").arg(Arg::new("name").long("name"));
    config.add_loader(FlagLoader::new(command).args(["app", "--help"]));
    assert!(!config.load_all().unwrap());
    assert_eq!(config.get_i64("kept"), Some(1));
}

#[test]
fn snapshot_serializes_as_nested_map() {
    let config = Config::new();
    config.put("server.port", 8080i64);
    config.put("server.tls", true);
    config.put("name", "svc");
    let json = serde_json::to_value(config.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"name": "svc", "server": {"port": 8080, "tls": true}})
    );
}
