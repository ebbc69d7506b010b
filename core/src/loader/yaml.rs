//! YAML mapping loader.
//!
//! Same shape as the JSON loader: nested mappings become nested keys and
//! everything else lands at a leaf. Scalar mapping keys (numbers, booleans)
//! are stringified; mappings nested inside sequences stay inside the list.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;

use serde_yaml::{Mapping, Value as Yaml};
use tracing::{debug, warn};

use super::{Decoded, FileLoader, KeyPartTransform};
use crate::error::LoadError;
use crate::tree::{Key, Value, Values};


/// Settings for decoding YAML mappings into [`Values`].
#[derive(Clone, Default)]
pub struct YamlLoader {
    pub key_prefix: Key,
    pub key_suffix: Key,
    pub discard_null: bool,
    pub key_part_transform: Option<KeyPartTransform>,
}

impl YamlLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_prefix(mut self, prefix: impl Into<Key>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn key_suffix(mut self, suffix: impl Into<Key>) -> Self {
        self.key_suffix = suffix.into();
        self
    }

    pub fn discard_null(mut self, discard: bool) -> Self {
        self.discard_null = discard;
        self
    }

    pub fn key_part_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.key_part_transform = Some(Arc::new(transform));
        self
    }

    pub fn load_str(&self, input: &str) -> Result<Values, LoadError> {
        self.load_yaml(serde_yaml::from_str(input)?)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Values, LoadError> {
        self.load_yaml(serde_yaml::from_reader(reader)?)
    }

    /// Load an already-decoded document. It must be a mapping; an empty
    /// document loads as an empty tree.
    pub fn load_yaml(&self, document: Yaml) -> Result<Values, LoadError> {
        let mapping = match document {
            Yaml::Mapping(mapping) => mapping,
            Yaml::Null => Mapping::new(),
            Yaml::Tagged(tagged) => return self.load_yaml(tagged.value),
            other => return Err(LoadError::NotAnObject(yaml_kind(&other))),
        };
        let values = Values::new();
        self.load_mapping(&Key::root(), mapping, &values);
        debug!(values = values.len(), "decoded YAML document");
        Ok(values)
    }

    pub fn file(
        self,
        path: impl Into<PathBuf>,
    ) -> FileLoader<impl Fn(BufReader<File>) -> Decoded + Send + Sync> {
        FileLoader::new(path, move |r| self.load_reader(r))
    }

    fn load_mapping(&self, key: &Key, mapping: Mapping, values: &Values) {
        for (raw_key, value) in mapping {
            let Some(part) = key_part(&raw_key) else {
                warn!(parent = %key, "skipping non-scalar YAML mapping key");
                continue;
            };
            let part = match &self.key_part_transform {
                Some(transform) => transform(&part),
                None => part,
            };
            let next = key.child(part);
            match untag(value) {
                Yaml::Mapping(nested) => self.load_mapping(&next, nested, values),
                leaf => self.load_leaf(next, leaf, values),
            }
        }
    }

    fn load_leaf(&self, key: Key, value: Yaml, values: &Values) {
        if !key.starts_with(&self.key_prefix) || !key.ends_with(&self.key_suffix) {
            return;
        }
        if self.discard_null && value.is_null() {
            return;
        }
        values.put(&key, yaml_value(value));
    }
}


fn untag(value: Yaml) -> Yaml {
    match value {
        Yaml::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn key_part(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Null => Some("null".to_string()),
        Yaml::Tagged(tagged) => key_part(&tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => None,
    }
}

fn yaml_value(value: Yaml) -> Value {
    match untag(value) {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::List(items.into_iter().map(yaml_value).collect()),
        Yaml::Mapping(mapping) => {
            let nested = Values::new();
            for (raw_key, item) in mapping {
                if let Some(part) = key_part(&raw_key) {
                    nested.put(&Key::new([part]), yaml_value(item));
                }
            }
            Value::Values(nested)
        }
        Yaml::Tagged(_) => Value::Null,
    }
}

fn yaml_kind(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "boolean",
        Yaml::Number(_) => "number",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "sequence",
        Yaml::Mapping(_) => "mapping",
        Yaml::Tagged(_) => "tagged value",
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "
server:
  host: example.org
  port: 8080
  tls: true
limits:
  ratio: 0.25
  codes: [200, 404]
  1: numeric-key
empty:
";

    fn key(raw: &str) -> Key {
        Key::split(raw, ".")
    }

    #[test]
    fn loads_nested_mappings() {
        let values = YamlLoader::default().load_str(DOC).unwrap();
        assert_eq!(values.get(&key("server.host")), Some(Value::from("example.org")));
        assert_eq!(values.get(&key("server.port")), Some(Value::I64(8080)));
        assert_eq!(values.get(&key("server.tls")), Some(Value::Bool(true)));
        assert_eq!(values.get(&key("limits.ratio")), Some(Value::F64(0.25)));
        assert_eq!(
            values.get(&key("limits.codes")),
            Some(Value::List(vec![Value::I64(200), Value::I64(404)]))
        );
        assert_eq!(values.get(&key("limits.1")), Some(Value::from("numeric-key")));
        assert_eq!(values.get(&key("empty")), Some(Value::Null));
    }

    #[test]
    fn discard_null_and_filters() {
        let values = YamlLoader::new()
            .discard_null(true)
            .key_prefix(["server"])
            .load_str(DOC)
            .unwrap();
        assert_eq!(values.len(), 3);
        assert!(values.get(&key("empty")).is_none());
    }

    #[test]
    fn empty_document_is_empty_tree() {
        assert!(YamlLoader::default().load_str("").unwrap().is_empty());
    }

    #[test]
    fn scalar_document_is_rejected() {
        match YamlLoader::default().load_str("just a string") {
            Err(LoadError::NotAnObject(kind)) => assert_eq!(kind, "string"),
            other => panic!("expected NotAnObject, got {:?}", other),
        }
    }
}
