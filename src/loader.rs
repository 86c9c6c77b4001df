//! Configuration loader with tier-based merging.
//!
//! Builds a record from every tier and merges them leaf by leaf, lowest
//! precedence first: caller defaults, YAML, JSON, MessagePack, environment,
//! flags.

use crate::error::Result;
use crate::merge::merge;
use crate::naming::{NamingPolicy, Tokenizer};
use crate::schema::{Node, Record, Schema, for_each_leaf};
use crate::sources::{
    DEFAULT_FILENAME, EnvSource, Environment, FileFormat, FileSource, FlagSource, ProcessEnv,
    Source, SourceTier,
};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A tier that provided at least one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub tier: SourceTier,
    /// The file read, for file tiers.
    pub path: Option<PathBuf>,
}

/// A resolved record together with the tiers that shaped it.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    config: T,
    contributions: Vec<Contribution>,
    trailing_args: Vec<OsString>,
}

impl<T> Resolved<T> {
    /// Get the resolved configuration.
    pub fn config(&self) -> &T {
        &self.config
    }

    /// Consume the report and return the configuration.
    pub fn into_config(self) -> T {
        self.config
    }

    /// Contributing tiers, lowest precedence first.
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Whether `tier` provided any value.
    pub fn contributed(&self, tier: SourceTier) -> bool {
        self.contributions.iter().any(|c| c.tier == tier)
    }

    /// Arguments from the first non-option argument on, left for the caller.
    pub fn trailing_args(&self) -> &[OsString] {
        &self.trailing_args
    }

    /// Files that were found and merged, in merge order.
    pub fn file_paths(&self) -> Vec<&Path> {
        self.contributions
            .iter()
            .filter_map(|c| c.path.as_deref())
            .collect()
    }
}

/// Resolve `T` with the default loader: `./config.{yaml,json,bin}`, unprefixed
/// environment variables and the process arguments.
pub fn resolve<T: Record>(defaults: &[T]) -> Result<T> {
    Loader::new().load(defaults)
}

/// Builder holding the options of a resolution pass.
#[derive(Clone)]
pub struct Loader {
    dirs: Vec<PathBuf>,
    filename: String,
    formats: Vec<FileFormat>,
    env_policy: NamingPolicy,
    flag_policy: NamingPolicy,
    environment: Arc<dyn Environment + Send + Sync>,
    args: Option<Vec<OsString>>,
    bin_name: Option<String>,
    ignore_flags: bool,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("dirs", &self.dirs)
            .field("filename", &self.filename)
            .field("formats", &self.formats)
            .field("env_policy", &self.env_policy)
            .field("flag_policy", &self.flag_policy)
            .field("args", &self.args)
            .field("bin_name", &self.bin_name)
            .field("ignore_flags", &self.ignore_flags)
            .finish_non_exhaustive()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self {
            dirs: FileSource::default_dirs(),
            filename: DEFAULT_FILENAME.to_string(),
            formats: FileFormat::ALL.to_vec(),
            env_policy: NamingPolicy::env(),
            flag_policy: NamingPolicy::flags(),
            environment: Arc::new(ProcessEnv),
            args: None,
            bin_name: None,
            ignore_flags: false,
        }
    }

    /// Prefix every derived environment key, e.g. `APP` gives `APP_PORT`.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_policy = self.env_policy.with_prefix(prefix);
        self
    }

    pub fn env_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.env_policy = self.env_policy.with_delimiter(delimiter);
        self
    }

    pub fn env_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.env_policy = self.env_policy.with_tokenizer(tokenizer);
        self
    }

    pub fn flag_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.flag_policy = self.flag_policy.with_delimiter(delimiter);
        self
    }

    pub fn flag_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.flag_policy = self.flag_policy.with_tokenizer(tokenizer);
        self
    }

    /// Append a search directory. Earlier directories win.
    pub fn add_file_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    /// Replace the search directories.
    pub fn file_paths<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Append the per-user config directory for `app`, when the platform has one.
    pub fn add_user_config_dir(mut self, app: &str) -> Self {
        if let Some(dir) = FileSource::user_config_dir(app) {
            self.dirs.push(dir);
        }
        self
    }

    /// Base filename, without extension.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Restrict which file formats are probed. Precedence among them is fixed.
    pub fn formats(mut self, formats: impl IntoIterator<Item = FileFormat>) -> Self {
        let mut formats: Vec<FileFormat> = formats.into_iter().collect();
        formats.sort();
        formats.dedup();
        self.formats = formats;
        self
    }

    /// Read environment variables from `environment` instead of the process.
    pub fn environment(mut self, environment: impl Environment + Send + Sync + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    /// Parse `args` (without the program name) instead of the process arguments.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Program name shown in flag usage and help.
    pub fn bin_name(mut self, bin_name: impl Into<String>) -> Self {
        self.bin_name = Some(bin_name.into());
        self
    }

    /// Skip the flag tier entirely.
    pub fn ignore_flags(mut self, ignore: bool) -> Self {
        self.ignore_flags = ignore;
        self
    }

    fn file_sources(&self) -> impl Iterator<Item = FileSource> + '_ {
        self.formats
            .iter()
            .map(|format| FileSource::new(self.dirs.clone(), self.filename.clone(), *format))
    }

    fn env_source(&self) -> EnvSource<&(dyn Environment + Send + Sync)> {
        EnvSource::with_env(self.env_policy.clone(), self.environment.as_ref())
    }

    fn flag_source(&self) -> Option<FlagSource> {
        if self.ignore_flags {
            return None;
        }
        let source = match &self.args {
            Some(args) => FlagSource::with_args(self.flag_policy.clone(), args.iter().cloned()),
            None => FlagSource::new(self.flag_policy.clone()),
        };
        Some(match &self.bin_name {
            Some(name) => source.with_bin_name(name.clone()),
            None => source,
        })
    }

    /// Resolve `T`. `defaults` are merged first, in order.
    pub fn load<T: Record>(&self, defaults: &[T]) -> Result<T> {
        self.load_report(defaults).map(Resolved::into_config)
    }

    /// Resolve `T` and report which tiers contributed.
    pub fn load_report<T: Record>(&self, defaults: &[T]) -> Result<Resolved<T>> {
        // Key clashes are schema errors: report them before touching any source.
        let schema = Schema::of::<T>();
        let env = self.env_source();
        env.keys(&schema)?;
        let flags = self.flag_source();
        if let Some(flags) = &flags {
            flags.keys(&schema)?;
        }

        let mut config = T::default();
        let mut contributions = Vec::new();

        for record in defaults {
            merge(&mut config, record);
        }
        if !defaults.is_empty() {
            contributions.push(Contribution {
                tier: SourceTier::Defaults,
                path: None,
            });
        }

        for source in self.file_sources() {
            match source.load::<T>() {
                Ok((path, record)) => {
                    merge(&mut config, &record);
                    contributions.push(Contribution {
                        tier: source.tier(),
                        path: Some(path),
                    });
                }
                Err(err) if err.is_not_found() => {
                    debug!(tier = %source.tier(), "{}", err);
                }
                Err(err) => return Err(err),
            }
        }

        merge_populated(env.tier(), env.populate()?, &mut config, &mut contributions);
        let mut trailing_args = Vec::new();
        if let Some(flags) = &flags {
            let (record, trailing) = flags.populate_with_trailing()?;
            merge_populated(flags.tier(), record, &mut config, &mut contributions);
            trailing_args = trailing;
        }

        Ok(Resolved {
            config,
            contributions,
            trailing_args,
        })
    }
}

fn merge_populated<T: Record>(
    tier: SourceTier,
    mut record: T,
    config: &mut T,
    contributions: &mut Vec<Contribution>,
) {
    let provided = count_provided(&mut record);
    debug!(tier = %tier, provided, "Merged source");
    if provided > 0 {
        merge(config, &record);
        contributions.push(Contribution { tier, path: None });
    }
}

fn count_provided<T: Node>(record: &mut T) -> usize {
    let mut provided = 0;
    let walked = for_each_leaf(record, |slot| {
        if !slot.leaf.is_unset() {
            provided += 1;
        }
        Ok(())
    });
    debug_assert!(walked.is_ok());
    provided
}
