//! Layered typed configuration.
//!
//! Resolves one typed record from caller defaults, configuration files
//! (YAML, JSON, MessagePack), environment variables and command-line flags.
//! Sources are merged leaf by leaf with fixed precedence; a leaf left at its
//! zero value by a source never overrides what a lower tier set.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Config {
//!     hostname: String,
//!     port: u16,
//! }
//! layercfg::record!(Config { hostname, port });
//!
//! let defaults = Config { hostname: "localhost".into(), port: 8080 };
//! let config = layercfg::Loader::new()
//!     .env_prefix("APP")
//!     .load(&[defaults])?;
//! # Ok::<(), layercfg::ConfigError>(())
//! ```

pub mod coerce;
pub mod error;
pub mod loader;
pub mod merge;
pub mod naming;
pub mod schema;
pub mod sources;

pub use coerce::{CoercionError, Radix, Scalar, ScalarKind};
pub use error::{ConfigError, Result};
pub use loader::{Contribution, Loader, Resolved, resolve};
pub use merge::{merge, merge_all};
pub use naming::{KeyCase, NamingPolicy, Tokenizer, resolve_key};
pub use schema::{
    FieldPath, Leaf, LeafDescriptor, LeafKind, LeafSlot, Node, Record, Schema, Visitor,
    for_each_leaf,
};
pub use sources::{
    EnvSource, Environment, FileFormat, FileSource, FlagSource, ProcessEnv, Source, SourceTier,
};
