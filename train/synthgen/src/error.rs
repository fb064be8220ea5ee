use std::{fmt, io, path::PathBuf};

use composer::ComposeError;

/// Pipeline stage an error came out of, for user-facing reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Load,
    Setup,
    Placement,
    Save,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Setup => "setup",
            Stage::Placement => "placement",
            Stage::Save => "save",
            Stage::Store => "store",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("failed to read directory {}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("card id `{id}` is used by more than one file")]
    DuplicateCard { id: String },
    #[error("failed to create output directory {}", dir.display())]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to start worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("failed to save sample {}", path.display())]
    SaveImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("label store {} is not a valid label aggregate", path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("label store {} has version {found}, newer than supported {supported}", path.display())]
    StoreVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
    #[error("failed to access label store {}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{failed} of {total} samples failed, labels were not written")]
    BatchAborted {
        failed: usize,
        total: usize,
        #[source]
        first: Box<GenError>,
    },
}

impl GenError {
    pub fn stage(&self) -> Stage {
        match self {
            GenError::Scan { .. } | GenError::Load { .. } | GenError::DuplicateCard { .. } => {
                Stage::Load
            }
            GenError::OutputDir { .. } | GenError::Pool(_) => Stage::Setup,
            GenError::Compose(_) => Stage::Placement,
            GenError::SaveImage { .. } => Stage::Save,
            GenError::StoreCorrupt { .. }
            | GenError::StoreVersion { .. }
            | GenError::StoreIo { .. } => Stage::Store,
            GenError::BatchAborted { first, .. } => first.stage(),
        }
    }
}
