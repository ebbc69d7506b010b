//! Environment variable loader.
//!
//! Selects variables by name prefix, strips the prefix, and parses the rest
//! of the name into a key. Values are always stored as strings.

use std::sync::Arc;

use tracing::debug;

use super::Loader;
use crate::error::LoadError;
use crate::tree::{Key, KeyParser, SeparatorKeyParser, Value, Values};


/// Separator used by [`EnvLoader::lower_underscore`].
pub const UNDERSCORE_SEPARATOR: &str = "_";


pub struct EnvLoader {
    prefix: String,
    parser: Arc<dyn KeyParser + Send + Sync>,
    vars: Option<Vec<(String, String)>>,
}

impl EnvLoader {
    /// Variables starting with `prefix`, remainder parsed by `parser`.
    pub fn new<P>(prefix: impl Into<String>, parser: P) -> Self
    where
        P: KeyParser + Send + Sync + 'static,
    {
        EnvLoader {
            prefix: prefix.into(),
            parser: Arc::new(parser),
            vars: None,
        }
    }

    /// Variables starting with `prefix`, remainder lower-cased and split on `_`.
    ///
    /// `APP_DB_HOST` with prefix `APP_` becomes `db.host`.
    pub fn lower_underscore(prefix: impl Into<String>) -> Self {
        let split = SeparatorKeyParser::new(UNDERSCORE_SEPARATOR);
        EnvLoader::new(prefix, move |raw: &str| split.parse(&raw.to_lowercase()))
    }

    /// Read from `vars` instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    fn entry(&self, name: &str) -> Option<Key> {
        let rest = name.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            return None;
        }
        let key = self.parser.parse(rest);
        (!key.is_empty()).then_some(key)
    }
}

impl Loader for EnvLoader {
    fn load(&self) -> Result<Values, LoadError> {
        let values = Values::new();
        let put = |name: &str, value: &str| {
            if let Some(key) = self.entry(name) {
                values.put(&key, Value::from(value));
            }
        };
        match &self.vars {
            Some(vars) => {
                for (name, value) in vars {
                    put(name.as_str(), value.as_str());
                }
            }
            None => {
                for (name, value) in std::env::vars_os() {
                    if let (Some(name), Some(value)) = (name.to_str(), value.to_str()) {
                        put(name, value);
                    }
                }
            }
        }
        debug!(prefix = %self.prefix, values = values.len(), "loaded environment");
        Ok(values)
    }
}
