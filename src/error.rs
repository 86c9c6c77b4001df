//! Error types for configuration resolution.

use crate::coerce::CoercionError;
use crate::schema::FieldPath;
use crate::sources::FileFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for resolution operations.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Everything that can stop a resolution pass.
///
/// Only [`ConfigError::NotFound`] is recoverable: the orchestrator treats it as
/// "this file source contributed nothing". Every other variant aborts the pass.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists in none of the search directories.
    #[error("{filename} not found in paths: {}", display_dirs(dirs))]
    NotFound { filename: String, dirs: Vec<PathBuf> },

    /// Reading a candidate file failed for a reason other than absence.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was found but its contents could not be decoded.
    #[error("failed to parse {format} file '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        format: FileFormat,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A source value does not fit its leaf.
    #[error("invalid value for {key} ({path}): {source}")]
    Coercion {
        key: String,
        path: FieldPath,
        #[source]
        source: CoercionError,
    },

    /// Two leaves derive the same source key.
    #[error("key {key} is derived by both {first} and {second}")]
    DuplicateKey {
        key: String,
        first: FieldPath,
        second: FieldPath,
    },

    /// A leaf derives a key the source keeps for itself.
    #[error("key {key} derived by {path} is reserved")]
    ReservedKey { key: String, path: FieldPath },

    /// Command-line parsing failed (unknown option, missing value, `--help`).
    #[error(transparent)]
    Flags(#[from] clap::Error),
}

impl ConfigError {
    pub fn not_found(filename: impl Into<String>, dirs: &[PathBuf]) -> Self {
        Self::NotFound {
            filename: filename.into(),
            dirs: dirs.to_vec(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(
        path: impl Into<PathBuf>,
        format: FileFormat,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            path: path.into(),
            format,
            source: Box::new(source),
        }
    }

    pub fn coercion(key: impl Into<String>, path: &FieldPath, source: CoercionError) -> Self {
        Self::Coercion {
            key: key.into(),
            path: path.clone(),
            source,
        }
    }

    /// Whether this is the non-fatal "file absent from every directory" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    let dirs: Vec<String> = dirs.iter().map(|d| d.display().to_string()).collect();
    format!("[{}]", dirs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::ScalarKind;

    #[test]
    fn test_not_found_message_lists_dirs() {
        let err = ConfigError::not_found(
            "config.yaml",
            &[PathBuf::from("/etc/app"), PathBuf::from("/home/me")],
        );
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "config.yaml not found in paths: [/etc/app, /home/me]"
        );
    }

    #[test]
    fn test_coercion_message_names_key_and_path() {
        let path = FieldPath::from_segments(["database", "port"]);
        let err = ConfigError::coercion(
            "DATABASE_PORT",
            &path,
            CoercionError::new(ScalarKind::Unsigned(16), "70000", "number too large"),
        );
        assert!(!err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("DATABASE_PORT"));
        assert!(message.contains("database.port"));
        assert!(message.contains("70000"));
    }
}
