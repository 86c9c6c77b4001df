//! Command-line flag source.
//!
//! Every leaf becomes a long option named by the flag [`NamingPolicy`]. The
//! option set is built at runtime from the record's schema with the clap
//! builder API, so `--help` lists every leaf with its kind.

use super::{Source, SourceTier};
use crate::coerce::{Radix, ScalarKind};
use crate::error::{ConfigError, Result};
use crate::naming::NamingPolicy;
use crate::schema::{LeafDescriptor, LeafKind, Record, Schema, for_each_leaf};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, trace};

/// Key clap claims for `--help`; no leaf may derive it.
pub const HELP_KEY: &str = "help";

/// Id of the hidden positional that collects everything from the first
/// non-option argument on.
pub const TRAILING_ARGS: &str = "trailing args";

const DEFAULT_BIN_NAME: &str = "app";

/// Fills leaves from command-line options.
///
/// - `--key value` and `--key=value` both work
/// - booleans accept a bare `--key` as `true`, or `--key=<bool>`
/// - sequences take one element per occurrence, in order
/// - integers accept `0x`, `0o` and `0b` prefixes
/// - repeating a non-sequence option keeps the last value
/// - a value may start with `-`, so `--host -x` sets `host` to `-x`
/// - parsing stops at the first argument that is not an option; it and
///   everything after it are returned as trailing arguments
#[derive(Debug, Clone)]
pub struct FlagSource {
    pub policy: NamingPolicy,
    args: Vec<OsString>,
    bin_name: String,
}

impl FlagSource {
    /// Read the process arguments.
    pub fn new(policy: NamingPolicy) -> Self {
        let mut args = std::env::args_os();
        let bin_name = args
            .next()
            .as_deref()
            .and_then(|argv0| Path::new(argv0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_BIN_NAME.to_string());
        Self {
            policy,
            args: args.collect(),
            bin_name,
        }
    }

    /// Parse `args` instead of the process arguments. `args` excludes the
    /// program name.
    pub fn with_args<I, A>(policy: NamingPolicy, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            policy,
            args: args.into_iter().map(Into::into).collect(),
            bin_name: DEFAULT_BIN_NAME.to_string(),
        }
    }

    /// Program name shown in usage and help output.
    pub fn with_bin_name(mut self, bin_name: impl Into<String>) -> Self {
        self.bin_name = bin_name.into();
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Option names for every leaf of `schema`, in walk order.
    pub fn keys(&self, schema: &Schema) -> Result<Vec<String>> {
        schema.keys(&self.policy, &[HELP_KEY, TRAILING_ARGS])
    }

    /// The clap command describing one option per leaf.
    pub fn command(&self, schema: &Schema) -> Result<Command> {
        let keys = self.keys(schema)?;
        let args = schema
            .leaves()
            .iter()
            .zip(keys)
            .map(|(leaf, key)| leaf_arg(leaf, key));

        Ok(Command::new(self.bin_name.clone())
            .args_override_self(true)
            .args(args)
            .arg(trailing_arg()))
    }

    fn matches(&self, schema: &Schema) -> Result<ArgMatches> {
        let argv = std::iter::once(OsString::from(&self.bin_name))
            .chain(self.args.iter().cloned());
        Ok(self.command(schema)?.try_get_matches_from(argv)?)
    }

    /// Like [`Source::populate`], also returning the arguments left after the
    /// first non-option argument.
    pub fn populate_with_trailing<T: Record>(&self) -> Result<(T, Vec<OsString>)> {
        let schema = Schema::of::<T>();
        let keys = self.keys(&schema)?;
        let matches = self.matches(&schema)?;
        let mut record = T::default();

        for_each_leaf(&mut record, |slot| {
            let key = &keys[slot.index];
            let Some(values) = matches.get_many::<String>(key) else {
                return Ok(());
            };
            let values: Vec<&str> = values.map(String::as_str).collect();
            trace!(key = %key, occurrences = values.len(), "Read flag");
            slot.leaf
                .assign_occurrences(&values, Radix::Prefixed)
                .map_err(|err| ConfigError::coercion(key, &schema.leaves()[slot.index].path, err))
        })?;

        let trailing: Vec<OsString> = matches
            .get_many::<OsString>(TRAILING_ARGS)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        if !trailing.is_empty() {
            debug!(count = trailing.len(), "Stopped at first non-option argument");
        }

        Ok((record, trailing))
    }
}

fn trailing_arg() -> Arg {
    Arg::new(TRAILING_ARGS)
        .action(ArgAction::Append)
        .num_args(1..)
        .trailing_var_arg(true)
        .value_parser(clap::value_parser!(OsString))
        .hide(true)
}

fn leaf_arg(leaf: &LeafDescriptor, key: String) -> Arg {
    let mut arg = Arg::new(key.clone())
        .long(key)
        .help(format!("{} ({})", leaf.path, leaf.kind))
        .value_parser(clap::value_parser!(String));

    arg = match leaf.kind {
        LeafKind::Sequence(_) => arg.action(ArgAction::Append).value_name("VALUE"),
        LeafKind::Scalar(ScalarKind::Bool) | LeafKind::Optional(ScalarKind::Bool) => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_name("BOOL"),
        _ => arg.action(ArgAction::Set).value_name("VALUE"),
    };

    if leaf.kind.element() != ScalarKind::Bool {
        arg = arg.allow_hyphen_values(true);
    }

    arg
}

impl Source for FlagSource {
    fn tier(&self) -> SourceTier {
        SourceTier::Flags
    }

    fn populate<T: Record>(&self) -> Result<T> {
        self.populate_with_trailing().map(|(record, _)| record)
    }
}
