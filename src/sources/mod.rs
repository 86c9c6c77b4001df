//! Sources that produce partially populated records.
//!
//! Each source fills a fresh zero record of the requested type with whatever
//! it finds and leaves every other leaf at its zero value:
//! - [`FileSource`]: one file decoded whole with serde (YAML, JSON or MessagePack)
//! - [`EnvSource`]: one environment variable per leaf
//! - [`FlagSource`]: one command-line option per leaf

mod env;
mod file;
mod flags;

pub use env::{EnvSource, Environment, ProcessEnv};
pub use file::{DEFAULT_FILENAME, FileFormat, FileSource};
pub use flags::{FlagSource, HELP_KEY, TRAILING_ARGS};

use crate::error::Result;
use crate::schema::Record;
use std::fmt;

/// Where a partial record came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceTier {
    /// Records supplied by the caller (lowest priority)
    Defaults,
    /// A configuration file
    File(FileFormat),
    /// Environment variables
    Environment,
    /// Command-line flags (highest priority)
    Flags,
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTier::Defaults => write!(f, "defaults"),
            SourceTier::File(format) => write!(f, "file ({})", format),
            SourceTier::Environment => write!(f, "environment"),
            SourceTier::Flags => write!(f, "flags"),
        }
    }
}

/// A source of partial records.
pub trait Source {
    fn tier(&self) -> SourceTier;

    /// Build a record of type `T` holding only what this source provides.
    fn populate<T: Record>(&self) -> Result<T>;
}
