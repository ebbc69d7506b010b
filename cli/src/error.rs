//! Command-line errors and their process exit codes.

use std::fmt;
use std::process;

use keytree_core::LoadError;


pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;


pub enum CliError {
    /// A file, environment or `--set` source failed to load.
    Load(LoadError),
    /// Malformed arguments that clap could not catch.
    Usage(String),
    /// `get` on a key with no value.
    NotFound(String),
    /// The tree could not be rendered in the requested format.
    Output(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::NotFound(_) => EXIT_NOT_FOUND,
            CliError::Load(_) | CliError::Output(_) => EXIT_ERROR,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Load(e) => write!(f, "load failed: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::NotFound(key) => write!(f, "no value at '{}'", key),
            CliError::Output(msg) => write!(f, "output failed: {}", msg),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        CliError::Load(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(format!("JSON: {}", e))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Output(format!("YAML: {}", e))
    }
}


/// Print `err` and exit with its code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("keytree: {}", err);
    process::exit(err.exit_code())
}

pub type CliResult<T> = Result<T, CliError>;
