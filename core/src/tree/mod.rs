//! Tree storage engine: hierarchical values addressed by string-segment keys.
//!
//! Provides [`Key`]s and pluggable [`KeyParser`]s, the closed [`Value`] sum
//! type, and the [`Values`] store: a lock-guarded tree whose positions are
//! each either a leaf value or a branch of named children.

pub mod key;
pub mod value;
pub mod values;
mod node;

pub use key::{Key, KeyParser, SeparatorKeyParser, PERIOD_SEPARATOR};
pub use value::{Opaque, Value};
pub use values::{KeyValue, Values};
