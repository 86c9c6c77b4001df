//! File source: first-found-wins lookup across search directories.
//!
//! Directories are probed in order for `<filename>.<ext>`; the first one that
//! has the file wins and later directories are not consulted. The file is
//! decoded whole by serde, so field names follow the codec's own conventions
//! (and any `#[serde(rename)]`), not the naming policies of the other sources.

use super::{Source, SourceTier};
use crate::error::{ConfigError, Result};
use crate::schema::Record;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Base filename probed when none is configured.
pub const DEFAULT_FILENAME: &str = "config";

/// Codec of a configuration file, selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileFormat {
    /// `.yaml`
    Yaml,
    /// `.json`
    Json,
    /// `.bin`, MessagePack encoded
    MessagePack,
}

impl FileFormat {
    /// All formats, in merge order.
    pub const ALL: [FileFormat; 3] = [FileFormat::Yaml, FileFormat::Json, FileFormat::MessagePack];

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
            FileFormat::MessagePack => "bin",
        }
    }

    /// Decode a whole file.
    ///
    /// An empty YAML document decodes to the zero record.
    pub fn decode<T: Record>(&self, path: &Path, bytes: &[u8]) -> Result<T> {
        match self {
            FileFormat::Yaml => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(T::default());
                }
                serde_yaml::from_slice(bytes).map_err(|err| ConfigError::decode(path, *self, err))
            }
            FileFormat::Json => {
                serde_json::from_slice(bytes).map_err(|err| ConfigError::decode(path, *self, err))
            }
            FileFormat::MessagePack => {
                rmp_serde::from_slice(bytes).map_err(|err| ConfigError::decode(path, *self, err))
            }
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Yaml => write!(f, "yaml"),
            FileFormat::Json => write!(f, "json"),
            FileFormat::MessagePack => write!(f, "msgpack"),
        }
    }
}

/// One file format looked up across ordered search directories.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub dirs: Vec<PathBuf>,
    pub filename: String,
    pub format: FileFormat,
}

impl FileSource {
    pub fn new(dirs: Vec<PathBuf>, filename: impl Into<String>, format: FileFormat) -> Self {
        Self {
            dirs,
            filename: filename.into(),
            format,
        }
    }

    /// Default search path: the current working directory.
    pub fn default_dirs() -> Vec<PathBuf> {
        vec![PathBuf::from(".")]
    }

    /// The per-user configuration directory for `app` (e.g. `~/.config/<app>`).
    pub fn user_config_dir(app: &str) -> Option<PathBuf> {
        let dir = dirs::config_dir().map(|d| d.join(app));
        if dir.is_none() {
            warn!(app, "No user configuration directory on this platform");
        }
        dir
    }

    /// `<filename>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.filename, self.format.extension())
    }

    /// Find the file in the first directory that has it.
    ///
    /// Returns [`ConfigError::NotFound`] when no directory has it, and
    /// [`ConfigError::Io`] when probing a directory fails for any other reason.
    pub fn locate(&self) -> Result<PathBuf> {
        let file_name = self.file_name();

        for dir in &self.dirs {
            let path = dir.join(&file_name);
            match std::fs::metadata(&path) {
                Ok(_) => return Ok(path),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    trace!(path = %path.display(), "Config file not present");
                }
                Err(err) => return Err(ConfigError::io(path, err)),
            }
        }

        Err(ConfigError::not_found(file_name, &self.dirs))
    }

    /// Locate and decode the file, returning where it was found.
    pub fn load<T: Record>(&self) -> Result<(PathBuf, T)> {
        let path = self.locate()?;
        let bytes = std::fs::read(&path).map_err(|err| ConfigError::io(&path, err))?;
        let record = self.format.decode(&path, &bytes)?;
        debug!(path = %path.display(), format = %self.format, "Loaded config file");
        Ok((path, record))
    }
}

impl Source for FileSource {
    fn tier(&self) -> SourceTier {
        SourceTier::File(self.format)
    }

    fn populate<T: Record>(&self) -> Result<T> {
        self.load().map(|(_, record)| record)
    }
}
