//! Loaders: producers of standalone [`Values`] trees from external sources.
//!
//! A loader's only job is to build a tree (or fail). The live store consumes
//! loader output exclusively by merging it; see [`Config::load_all`].
//!
//! [`Config::load_all`]: crate::Config::load_all

pub mod env;
pub mod flag;
pub mod json;
pub mod yaml;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::LoadError;
use crate::tree::Values;

pub use env::EnvLoader;
pub use flag::FlagLoader;
pub use json::JsonLoader;
pub use yaml::YamlLoader;


/// Produces a populated, standalone tree from some source.
pub trait Loader: Send + Sync {
    fn load(&self) -> Result<Values, LoadError>;
}

impl<F> Loader for F
where
    F: Fn() -> Result<Values, LoadError> + Send + Sync,
{
    fn load(&self) -> Result<Values, LoadError> {
        self()
    }
}


/// What decoders hand back to reader and file loaders.
pub type Decoded = Result<Values, LoadError>;


/// Optional rewrite applied to every key segment a document loader reads.
pub type KeyPartTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;


// ---------------------------------------------------------------------------
// Reader and file loaders
// ---------------------------------------------------------------------------

/// Decodes a reader once. A second `load` reports [`LoadError::Exhausted`].
pub struct ReaderLoader<R, F> {
    reader: Mutex<Option<R>>,
    decode: F,
}

impl<R, F> ReaderLoader<R, F>
where
    R: Read + Send,
    F: Fn(R) -> Result<Values, LoadError> + Send + Sync,
{
    pub fn new(reader: R, decode: F) -> Self {
        ReaderLoader {
            reader: Mutex::new(Some(reader)),
            decode,
        }
    }
}

impl<R, F> Loader for ReaderLoader<R, F>
where
    R: Read + Send,
    F: Fn(R) -> Result<Values, LoadError> + Send + Sync,
{
    fn load(&self) -> Result<Values, LoadError> {
        let reader = self.reader.lock().take().ok_or(LoadError::Exhausted)?;
        (self.decode)(reader)
    }
}


/// Opens a file on every `load` and decodes it.
pub struct FileLoader<F> {
    path: PathBuf,
    decode: F,
}

impl<F> FileLoader<F>
where
    F: Fn(BufReader<File>) -> Result<Values, LoadError> + Send + Sync,
{
    pub fn new(path: impl Into<PathBuf>, decode: F) -> Self {
        FileLoader {
            path: path.into(),
            decode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F> Loader for FileLoader<F>
where
    F: Fn(BufReader<File>) -> Result<Values, LoadError> + Send + Sync,
{
    fn load(&self) -> Result<Values, LoadError> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let values = (self.decode)(BufReader::new(file))?;
        debug!(path = %self.path.display(), values = values.len(), "loaded file");
        Ok(values)
    }
}


/// A loader for a JSON or YAML file, chosen by extension.
pub fn file_loader(path: impl Into<PathBuf>) -> Result<Arc<dyn Loader>, LoadError> {
    let path = path.into();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => {
            let json = JsonLoader::default();
            Ok(Arc::new(FileLoader::new(path, move |r| json.load_reader(r))))
        }
        Some("yaml") | Some("yml") => {
            let yaml = YamlLoader::default();
            Ok(Arc::new(FileLoader::new(path, move |r| yaml.load_reader(r))))
        }
        _ => Err(LoadError::UnsupportedFormat(path)),
    }
}
