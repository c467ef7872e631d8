//! On-disk fixture storage
//!
//! One file per (unit, setting index) pair, named `<unit>_<index>.fixture`,
//! holding the serialized result value. The format is opaque to callers and
//! constrained only by the round-trip law: a value read back must be
//! comparator-equal to the value written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::value::Value;

/// Extension used for fixture files
pub const FIXTURE_EXT: &str = "fixture";

/// Fixture storage errors
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no fixture for {unit} setting {index}; run generate first")]
    FixtureMissing { unit: String, index: usize },

    #[error("fixture {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode fixture for {unit} setting {index}: {source}")]
    Encode {
        unit: String,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("fixture I/O at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fixture store rooted at one directory
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    /// Open (creating if needed) a store at the given directory. An
    /// uncreatable root is the unrecoverable environment fault that aborts
    /// the whole batch.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, unit: &str, index: usize) -> PathBuf {
        self.root.join(format!("{unit}_{index}.{FIXTURE_EXT}"))
    }

    /// Persist a result value for the given pair, replacing any prior one
    pub fn write(&self, unit: &str, index: usize, value: &Value) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            unit: unit.to_string(),
            index,
            source,
        })?;
        let path = self.path_for(unit, index);
        fs::write(&path, body).map_err(|source| StoreError::Io { path, source })
    }

    /// Read the persisted value for the given pair
    pub fn read(&self, unit: &str, index: usize) -> Result<Value, StoreError> {
        let path = self.path_for(unit, index);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::FixtureMissing {
                    unit: unit.to_string(),
                    index,
                });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&body).map_err(|source| StoreError::Corrupt { path, source })
    }

    pub fn exists(&self, unit: &str, index: usize) -> bool {
        self.path_for(unit, index).is_file()
    }

    /// Enumerate every (unit, index) pair present on disk, sorted. Used to
    /// report fixtures whose unit no longer exists in the registry.
    pub fn known_pairs(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| parse_fixture_name(e.path()))
            .collect();
        pairs.sort();
        pairs
    }
}

/// Parse `<unit>_<index>.fixture` back into its pair key. Unit names may
/// themselves contain underscores, so the index is split off the right.
fn parse_fixture_name(path: &Path) -> Option<(String, usize)> {
    if path.extension().and_then(|e| e.to_str()) != Some(FIXTURE_EXT) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (unit, index) = stem.rsplit_once('_')?;
    let index: usize = index.parse().ok()?;
    Some((unit.to_string(), index))
}
