//! Keytree: a hierarchical key/value store for configuration values.
//!
//! Keys are sequences of string segments (`db.host` parses to `["db", "host"]`)
//! addressing positions in a tree. Each position is either a leaf holding one
//! [`Value`] or a branch of named children, never both. Loaders build
//! standalone trees from files, the environment or command-line flags, and a
//! [`Config`] merges them into its live tree as one batch.
//!
//! ```
//! use keytree_core::{Config, Value};
//!
//! let config = Config::new();
//! assert!(config.put("foo", "bar"));
//! assert!(!config.put("foo", "bar"));
//! assert!(config.put("foo", 1024i64));
//! assert_eq!(config.get("foo"), Some(Value::I64(1024)));
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod tree;

pub use config::Config;
pub use error::LoadError;
pub use loader::{file_loader, EnvLoader, FlagLoader, JsonLoader, Loader, YamlLoader};
pub use tree::{Key, KeyParser, KeyValue, Opaque, SeparatorKeyParser, Value, Values, PERIOD_SEPARATOR};
