//! Level loading errors

use std::path::PathBuf;

use sixdof_core::SceneError;
use thiserror::Error;

/// Fatal level load errors. Malformed individual entities are not errors:
/// they are logged and skipped.
#[derive(Error, Debug)]
pub enum LevelError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Level description parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Level description is missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Level scene contains no rooms")]
    NoRooms,
}

/// Result type for level operations
pub type LevelResult<T> = Result<T, LevelError>;
