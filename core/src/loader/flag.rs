//! Command-line flag loader built on `clap`.
//!
//! The caller describes the accepted flags with a [`clap::Command`]; the
//! loader parses an argument vector against it and stores every explicitly
//! supplied argument under a key parsed from its id (or alias), split on `-`
//! by default. With `load_defaults`, arguments that only have a default value
//! are stored too.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use super::Loader;
use crate::error::LoadError;
use crate::tree::{KeyParser, SeparatorKeyParser, Value, Values};


/// Separator used by the default flag key parser.
pub const DASH_SEPARATOR: &str = "-";


pub struct FlagLoader {
    command: Command,
    args: Vec<OsString>,
    aliases: HashMap<String, String>,
    parser: Arc<dyn KeyParser + Send + Sync>,
    load_defaults: bool,
}

impl FlagLoader {
    /// Parse the process arguments against `command`.
    pub fn new(command: Command) -> Self {
        FlagLoader {
            command,
            args: std::env::args_os().collect(),
            aliases: HashMap::new(),
            parser: Arc::new(SeparatorKeyParser::new(DASH_SEPARATOR)),
            load_defaults: false,
        }
    }

    /// Parse `args` instead of the process arguments. The first element is
    /// the program name, as with `std::env::args`.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Store the argument `id` under the key parsed from `alias` instead.
    pub fn alias(mut self, id: impl Into<String>, alias: impl Into<String>) -> Self {
        self.aliases.insert(id.into(), alias.into());
        self
    }

    pub fn key_parser<P>(mut self, parser: P) -> Self
    where
        P: KeyParser + Send + Sync + 'static,
    {
        self.parser = Arc::new(parser);
        self
    }

    pub fn load_defaults(mut self, load_defaults: bool) -> Self {
        self.load_defaults = load_defaults;
        self
    }

    fn wanted(&self, source: Option<ValueSource>) -> bool {
        match source {
            Some(ValueSource::DefaultValue) => self.load_defaults,
            Some(_) => true,
            None => false,
        }
    }
}

impl Loader for FlagLoader {
    fn load(&self) -> Result<Values, LoadError> {
        let matches = match self.command.clone().try_get_matches_from(self.args.iter().cloned()) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                debug!(command = %self.command.get_name(), "help requested, no flags loaded");
                return Ok(Values::new());
            }
            Err(e) => return Err(LoadError::Flag(e)),
        };

        let values = Values::new();
        for arg in self.command.get_arguments() {
            if is_informational(arg) {
                continue;
            }
            let id = arg.get_id().as_str();
            if !self.wanted(matches.value_source(id)) {
                continue;
            }
            let Some(value) = arg_value(&matches, arg) else {
                continue;
            };
            let name = self.aliases.get(id).map(String::as_str).unwrap_or(id);
            values.put(&self.parser.parse(name), value);
        }
        debug!(command = %self.command.get_name(), values = values.len(), "loaded flags");
        Ok(values)
    }
}


fn is_informational(arg: &Arg) -> bool {
    matches!(
        arg.get_action(),
        ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
    )
}

macro_rules! typed_one {
    ($matches:expr, $id:expr, $($ty:ty),+) => {
        $(
            if let Ok(Some(v)) = $matches.try_get_one::<$ty>($id) {
                return Some(Value::from(v.clone()));
            }
        )+
    };
}

macro_rules! typed_many {
    ($matches:expr, $id:expr, $($ty:ty),+) => {
        $(
            if let Ok(Some(vs)) = $matches.try_get_many::<$ty>($id) {
                return Some(Value::List(vs.cloned().map(Value::from).collect()));
            }
        )+
    };
}

/// The typed value clap parsed for `arg`, falling back to its raw text.
fn arg_value(matches: &ArgMatches, arg: &Arg) -> Option<Value> {
    let id = arg.get_id().as_str();
    if matches!(arg.get_action(), ArgAction::Append) {
        typed_many!(matches, id, String, bool, i64, u64, i32, u32, u16, u8, f64, f32);
        if let Ok(Some(paths)) = matches.try_get_many::<PathBuf>(id) {
            return Some(Value::List(
                paths.map(|p| Value::from(p.to_string_lossy().into_owned())).collect(),
            ));
        }
        let raw = matches.try_get_raw(id).ok().flatten()?;
        return Some(Value::List(
            raw.map(|r| Value::from(r.to_string_lossy().into_owned())).collect(),
        ));
    }

    typed_one!(matches, id, String, bool, i64, u64, i32, u32, u16, u8, f64, f32);
    if let Ok(Some(path)) = matches.try_get_one::<PathBuf>(id) {
        return Some(Value::from(path.to_string_lossy().into_owned()));
    }
    let mut raw = matches.try_get_raw(id).ok().flatten()?;
    raw.next().map(|r| Value::from(r.to_string_lossy().into_owned()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Key;

    fn command() -> Command {
        Command::new("app")
            .arg(Arg::new("log-level").long("log-level").default_value("info"))
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_parser(clap::value_parser!(u16))
                    .default_value("8080"),
            )
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
            .arg(Arg::new("tag").long("tag").action(ArgAction::Append))
    }

    fn key(raw: &str) -> Key {
        Key::split(raw, ".")
    }

    #[test]
    fn only_explicit_flags_by_default() {
        let loader = FlagLoader::new(command()).args(["app", "--log-level", "debug"]);
        let values = loader.load().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&key("log.level")), Some(Value::from("debug")));
    }

    #[test]
    fn typed_values() {
        let loader = FlagLoader::new(command())
            .args(["app", "--port", "9000", "--verbose", "--tag", "a", "--tag", "b"]);
        let values = loader.load().unwrap();
        assert_eq!(values.get(&key("port")), Some(Value::U16(9000)));
        assert_eq!(values.get(&key("verbose")), Some(Value::Bool(true)));
        assert_eq!(
            values.get(&key("tag")),
            Some(Value::List(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn load_defaults_includes_defaults() {
        let loader = FlagLoader::new(command()).args(["app"]).load_defaults(true);
        let values = loader.load().unwrap();
        assert_eq!(values.get(&key("log.level")), Some(Value::from("info")));
        assert_eq!(values.get(&key("port")), Some(Value::U16(8080)));
        assert_eq!(values.get(&key("verbose")), Some(Value::Bool(false)));
        assert_eq!(values.get(&key("tag")), None);
    }

    #[test]
    fn aliases_rename_keys() {
        let loader = FlagLoader::new(command())
            .args(["app", "--port", "1"])
            .alias("port", "server-listen-port");
        let values = loader.load().unwrap();
        assert_eq!(values.get(&key("server.listen.port")), Some(Value::U16(1)));
        assert_eq!(values.get(&key("port")), None);
    }

    #[test]
    fn help_is_not_an_error() {
        let loader = FlagLoader::new(command()).args(["app", "--help"]);
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn bad_arguments_are_an_error() {
        let loader = FlagLoader::new(command()).args(["app", "--port", "not-a-number"]);
        assert!(matches!(loader.load(), Err(LoadError::Flag(_))));
        let loader = FlagLoader::new(command()).args(["app", "--nope"]);
        assert!(matches!(loader.load(), Err(LoadError::Flag(_))));
    }
}
