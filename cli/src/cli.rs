//! Command-line arguments and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};


#[derive(Parser, Debug)]
#[command(name = "keytree", about = "Inspect layered configuration trees", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON or YAML file to load; repeat to layer several, later files win
    #[arg(long = "file", short = 'f', global = true)]
    pub files: Vec<PathBuf>,

    /// Load environment variables starting with this prefix (APP_DB_HOST -> db.host)
    #[arg(long, global = true, env = "KEYTREE_ENV_PREFIX")]
    pub env_prefix: Option<String>,

    /// Set `key=value` after files and environment; the value is parsed as
    /// JSON when possible and kept as a string otherwise
    #[arg(long = "set", short = 's', global = true, value_name = "KEY=VALUE")]
    pub sets: Vec<String>,

    /// Separator between key segments
    #[arg(long, global = true, default_value = ".")]
    pub separator: String,

    /// Log loader activity to stderr
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all logging
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the value at a key
    Get {
        key: String,
    },

    /// Print the whole tree
    Dump {
        #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },

    /// List every leaf key, optionally only those under a prefix
    Keys {
        prefix: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    Json,
    Yaml,
    /// One `key = value` line per leaf
    Flat,
}
