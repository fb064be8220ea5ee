use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use composer::{LabelRecord, Sample};
use serde::{Deserialize, Serialize};

use crate::error::GenError;

pub const LABELS_FILE: &str = "labels.json";
pub const STORE_VERSION: u32 = 1;

pub fn save_sample(out_dir: &Path, sample: &Sample) -> Result<PathBuf, GenError> {
    let path = out_dir.join(&sample.record.filename);
    sample
        .image
        .save(&path)
        .map_err(|source| GenError::SaveImage {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelAggregate {
    // files written before versioning carry no field and are version 1
    #[serde(default = "first_version")]
    pub version: u32,
    pub labels: Vec<Vec<LabelRecord>>,
}

fn first_version() -> u32 {
    1
}

impl Default for LabelAggregate {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            labels: Vec::new(),
        }
    }
}

/// `labels.json` next to the generated images.
///
/// Only the coordinating thread touches the store, after every sample of
/// the batch has finished. Separate processes appending to the same file
/// can still lose each other's updates.
pub struct LabelStore {
    path: PathBuf,
}

impl LabelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(out_dir: &Path) -> Self {
        Self::new(out_dir.join(LABELS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty aggregate.
    pub fn load(&self) -> Result<LabelAggregate, GenError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LabelAggregate::default()),
            Err(source) => {
                return Err(GenError::StoreIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let aggregate: LabelAggregate =
            serde_json::from_slice(&bytes).map_err(|source| GenError::StoreCorrupt {
                path: self.path.clone(),
                source,
            })?;
        if aggregate.version > STORE_VERSION {
            return Err(GenError::StoreVersion {
                path: self.path.clone(),
                found: aggregate.version,
                supported: STORE_VERSION,
            });
        }
        Ok(aggregate)
    }

    /// Appends `batch` as a new entry and replaces the file in one rename.
    /// Returns the number of batches now stored.
    pub fn append(&self, batch: Vec<LabelRecord>) -> Result<usize, GenError> {
        let mut aggregate = self.load()?;
        aggregate.version = STORE_VERSION;
        aggregate.labels.push(batch);

        let store_io = |source: io::Error| GenError::StoreIo {
            path: self.path.clone(),
            source,
        };
        let json =
            serde_json::to_vec_pretty(&aggregate).map_err(|e| store_io(io::Error::other(e)))?;
        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(&json)?;
                f.flush()
            })
            .map_err(|err| match err {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => store_io(e),
            })?;

        Ok(aggregate.labels.len())
    }
}
