//! String-keyed configuration facade over a [`Values`] tree.
//!
//! A [`Config`] owns one tree, a swappable [`KeyParser`] that turns strings
//! like `db.host` into keys, and the list of loaders `load_all` applies.
//! Typed accessors narrow stored values and report `None` on a type mismatch.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::loader::Loader;
use crate::tree::{Key, KeyParser, SeparatorKeyParser, Value, Values};


pub struct Config {
    key_parser: Arc<dyn KeyParser + Send + Sync>,
    values: Values,
    loaders: Mutex<Vec<Arc<dyn Loader>>>,
}

impl Config {
    /// Empty config parsing keys on `.`.
    pub fn new() -> Self {
        Config::from_values(Values::new())
    }

    /// Config over an existing tree.
    pub fn from_values(values: Values) -> Self {
        Config {
            key_parser: Arc::new(SeparatorKeyParser::default()),
            values,
            loaders: Mutex::new(Vec::new()),
        }
    }

    pub fn with_key_parser<P>(mut self, parser: P) -> Self
    where
        P: KeyParser + Send + Sync + 'static,
    {
        self.set_key_parser(parser);
        self
    }

    pub fn set_key_parser<P>(&mut self, parser: P)
    where
        P: KeyParser + Send + Sync + 'static,
    {
        self.key_parser = Arc::new(parser);
    }

    pub fn new_key(&self, raw: &str) -> Key {
        self.key_parser.parse(raw)
    }

    /// The live tree.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// A detached deep copy of the tree.
    pub fn snapshot(&self) -> Values {
        self.values.clone()
    }

    // -------------------------------------------------------------------
    // Tree operations
    // -------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_key(&self.new_key(key))
    }

    pub fn get_key(&self, key: &Key) -> Option<Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains(&self.new_key(key))
    }

    /// Returns true iff the stored mapping changed.
    pub fn put(&self, key: &str, value: impl Into<Value>) -> bool {
        self.put_key(&self.new_key(key), value)
    }

    pub fn put_key(&self, key: &Key, value: impl Into<Value>) -> bool {
        self.values.put(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.remove_key(&self.new_key(key))
    }

    pub fn remove_key(&self, key: &Key) -> Option<Value> {
        self.values.remove(key)
    }

    /// Merge every value of `other` into this config at the root.
    pub fn merge(&self, other: &Config) -> bool {
        self.values.merge(&Key::root(), &other.values)
    }

    pub fn equal_values(&self, other: &Config) -> bool {
        self.values.equal(&other.values)
    }

    // -------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any stored integer width, wrapping values beyond `i64`.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.as_u64()
    }

    /// `f32` or `f64` values only.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_list(&self, key: &str) -> Option<Vec<Value>> {
        match self.get(key)? {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The sub-tree at `key`, detached from this config.
    pub fn get_values(&self, key: &str) -> Option<Values> {
        self.get(key)?.into_values()
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get_i64(key).unwrap_or(default)
    }

    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        self.get_f64(key).unwrap_or(default)
    }

    // -------------------------------------------------------------------
    // Loaders
    // -------------------------------------------------------------------

    /// Register a loader for [`Config::load_all`].
    pub fn add_loader<L: Loader + 'static>(&self, loader: L) -> &Self {
        self.loaders.lock().push(Arc::new(loader));
        self
    }

    pub fn add_loaders<I>(&self, loaders: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn Loader>>,
    {
        self.loaders.lock().extend(loaders);
        self
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.lock().len()
    }

    /// Run every registered loader, in registration order, as one batch.
    pub fn load_all(&self) -> Result<bool, LoadError> {
        let loaders = self.loaders.lock().clone();
        let refs: Vec<&dyn Loader> = loaders.iter().map(|l| l.as_ref()).collect();
        self.put_loaders(&refs)
    }

    /// Run `loaders` in order, staging their output in a scratch tree, then
    /// merge the scratch tree into this config once.
    ///
    /// The first loader error aborts the batch and is returned unchanged;
    /// nothing from the batch reaches this config in that case. Loaders that
    /// produce an empty tree contribute nothing, and an empty batch leaves
    /// the config untouched.
    pub fn put_loaders(&self, loaders: &[&dyn Loader]) -> Result<bool, LoadError> {
        let staged = Values::new();
        for (index, loader) in loaders.iter().enumerate() {
            let loaded = loader.load().inspect_err(|e| {
                warn!(index, error = %e, "loader failed, discarding batch");
            })?;
            debug!(index, values = loaded.len(), "loader finished");
            if !loaded.is_empty() {
                staged.merge(&Key::root(), &loaded);
            }
        }
        if staged.is_empty() {
            return Ok(false);
        }
        let changed = self.values.merge(&Key::root(), &staged);
        info!(loaders = loaders.len(), values = staged.len(), changed, "applied loader batch");
        Ok(changed)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-copies the values; the key parser and registered loaders are shared.
impl Clone for Config {
    fn clone(&self) -> Self {
        Config {
            key_parser: Arc::clone(&self.key_parser),
            values: self.values.clone(),
            loaders: Mutex::new(self.loaders.lock().clone()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("values", &self.values)
            .field("loaders", &self.loader_count())
            .finish()
    }
}
