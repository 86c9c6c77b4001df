//! Environment variable source.

use super::{Source, SourceTier};
use crate::coerce::{CoercionError, Radix};
use crate::error::{ConfigError, Result};
use crate::naming::NamingPolicy;
use crate::schema::{Record, Schema, for_each_leaf};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use tracing::trace;

/// Lookup of environment variables.
///
/// The process environment is the default; maps stand in for it in tests.
/// Values are returned raw so that non-unicode text can be reported rather
/// than silently altered.
pub trait Environment {
    fn var_os(&self, key: &str) -> Option<OsString>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

impl Environment for HashMap<String, String> {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.get(key).map(OsString::from)
    }
}

impl Environment for HashMap<String, OsString> {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.get(key).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.get(key).map(OsString::from)
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var_os(&self, key: &str) -> Option<OsString> {
        (**self).var_os(key)
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn var_os(&self, key: &str) -> Option<OsString> {
        (**self).var_os(key)
    }
}

/// Fills leaves from one environment variable each.
///
/// Variables that are unset or empty leave their leaf untouched. Integers are
/// decimal, sequences are comma-separated. A value that is not valid unicode
/// is a coercion error naming the variable.
#[derive(Debug, Clone)]
pub struct EnvSource<E = ProcessEnv> {
    pub policy: NamingPolicy,
    env: E,
}

impl EnvSource<ProcessEnv> {
    pub fn new(policy: NamingPolicy) -> Self {
        Self {
            policy,
            env: ProcessEnv,
        }
    }
}

impl<E: Environment> EnvSource<E> {
    pub fn with_env(policy: NamingPolicy, env: E) -> Self {
        Self { policy, env }
    }

    /// Variable names for every leaf of `schema`, in walk order.
    pub fn keys(&self, schema: &Schema) -> Result<Vec<String>> {
        schema.keys(&self.policy, &[])
    }
}

impl<E: Environment> Source for EnvSource<E> {
    fn tier(&self) -> SourceTier {
        SourceTier::Environment
    }

    fn populate<T: Record>(&self) -> Result<T> {
        let schema = Schema::of::<T>();
        let keys = self.keys(&schema)?;
        let mut record = T::default();

        for_each_leaf(&mut record, |slot| {
            let key = &keys[slot.index];
            let Some(raw) = self.env.var_os(key).filter(|value| !value.is_empty()) else {
                return Ok(());
            };
            let path = &schema.leaves()[slot.index].path;
            trace!(key = %key, "Read environment variable");
            let value = raw.into_string().map_err(|raw| {
                let kind = slot.leaf.kind().element();
                let err = CoercionError::new(kind, raw.to_string_lossy(), "not valid unicode");
                ConfigError::coercion(key, path, err)
            })?;
            slot.leaf
                .assign_text(&value, Radix::Decimal)
                .map_err(|err| ConfigError::coercion(key, path, err))
        })?;

        Ok(record)
    }
}
