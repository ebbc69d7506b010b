//! JSON object loader.
//!
//! Nested objects become nested keys; everything else lands at a leaf.
//! Integers that fit `i64` load as `I64`, larger positive integers as `U64`,
//! and all other numbers as `F64`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::debug;

use super::{Decoded, FileLoader, KeyPartTransform, ReaderLoader};
use crate::error::LoadError;
use crate::tree::{Key, Value, Values};


/// Settings for decoding JSON objects into [`Values`].
///
/// The default includes every leaf, keeps `null`s, and parses numbers.
/// `JsonLoader` is not itself a [`Loader`](super::Loader); use
/// [`JsonLoader::file`] or [`JsonLoader::reader`] to get one.
#[derive(Clone, Default)]
pub struct JsonLoader {
    /// Only leaves whose key starts with this are kept.
    pub key_prefix: Key,
    /// Only leaves whose key ends with this are kept.
    pub key_suffix: Key,
    /// Skip `null` leaves instead of storing [`Value::Null`].
    pub discard_null: bool,
    /// Store numbers as their literal text instead of parsing them. The text
    /// is kept exactly as written, including exponents and out-of-range values.
    pub number_as_string: bool,
    /// Applied to every object key before it becomes a key segment.
    pub key_part_transform: Option<KeyPartTransform>,
}

impl JsonLoader {
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

    pub fn number_as_string(mut self, as_string: bool) -> Self {
        self.number_as_string = as_string;
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
        self.load_json(serde_json::from_str(input)?)
    }

    pub fn load_slice(&self, input: &[u8]) -> Result<Values, LoadError> {
        self.load_json(serde_json::from_slice(input)?)
    }

    pub fn load_reader<R: Read>(&self, reader: R) -> Result<Values, LoadError> {
        self.load_json(serde_json::from_reader(reader)?)
    }

    /// Load an already-decoded document. It must be an object.
    pub fn load_json(&self, document: Json) -> Result<Values, LoadError> {
        let object = match document {
            Json::Object(object) => object,
            other => return Err(LoadError::NotAnObject(json_kind(&other))),
        };
        let values = Values::new();
        self.load_object(&Key::root(), object, &values);
        debug!(values = values.len(), "decoded JSON document");
        Ok(values)
    }

    /// A loader that reads the file at `path` on every load.
    pub fn file(
        self,
        path: impl Into<PathBuf>,
    ) -> FileLoader<impl Fn(BufReader<File>) -> Decoded + Send + Sync> {
        FileLoader::new(path, move |r| self.load_reader(r))
    }

    /// A loader that decodes `reader` once.
    pub fn reader<R: Read + Send>(
        self,
        reader: R,
    ) -> ReaderLoader<R, impl Fn(R) -> Decoded + Send + Sync> {
        ReaderLoader::new(reader, move |r| self.load_reader(r))
    }

    fn load_object(&self, key: &Key, object: Map<String, Json>, values: &Values) {
        for (part, value) in object {
            let part = match &self.key_part_transform {
                Some(transform) => transform(&part),
                None => part,
            };
            let next = key.child(part);
            match value {
                Json::Object(nested) => self.load_object(&next, nested, values),
                leaf => self.load_leaf(next, leaf, values),
            }
        }
    }

    fn load_leaf(&self, key: Key, value: Json, values: &Values) {
        if !key.starts_with(&self.key_prefix) || !key.ends_with(&self.key_suffix) {
            return;
        }
        let value = match value {
            Json::Null if self.discard_null => return,
            Json::Number(n) if self.number_as_string => Value::String(n.to_string()),
            other => Value::from(other),
        };
        values.put(&key, value);
    }
}


fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
