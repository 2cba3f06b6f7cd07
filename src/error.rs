//! Error taxonomy for the selection core.
//!
//! Every failure is raised eagerly at the point of detection and names the
//! offending source; there is no silent truncation or skipping. Retry policy
//! belongs to the orchestration layer, not here.

use std::path::PathBuf;

/// Errors produced by the frame-selection core.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// Malformed trust level (a `lo` above its `hi`, or a half-specified
    /// virial band).
    #[error("invalid trust level: {0}")]
    Config(String),

    /// A trajectory's configuration file and deviation file disagree on the
    /// number of frames.
    #[error("{path:?}: {conf_frames} configuration frames but {devi_frames} deviation rows")]
    ShapeMismatch {
        path: PathBuf,
        conf_frames: usize,
        devi_frames: usize,
    },

    /// The same trajectory index was recorded twice in one run.
    #[error("trajectory {0} was already recorded in this run")]
    DuplicateTrajectory(usize),

    /// A nonsensical caller-supplied value (e.g. a negative selection cap).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A trajectory or deviation source could not be read or parsed.
    #[error("failed to load {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Filesystem failure while persisting the output dataset.
    #[error("i/o error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SiftError {
    /// Construct a [`SiftError::Load`] for `path` with a formatted reason.
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Construct a [`SiftError::Io`] wrapping a `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, SiftError>;
