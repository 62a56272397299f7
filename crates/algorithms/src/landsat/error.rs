//! Failures of an LST run

use super::metadata::MetadataParseError;
use super::pipeline::Stage;
use landtherm_core::Error;
use std::path::PathBuf;
use thiserror::Error;

/// Why an LST run stopped.
///
/// Every variant aborts the run; no partial output is ever returned.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no *MTL.txt metadata file found in {}", .dir.display())]
    MetadataNotFound { dir: PathBuf },

    #[error("cannot list input directory {}: {source}", .dir.display())]
    InputDirectory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataParseError),

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Error,
    },

    #[error("run cancelled before {before}")]
    Cancelled { before: Stage },
}

/// Coarse classification of a [`PipelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MetadataNotFound,
    MetadataParse,
    RasterLoad,
    GridShapeMismatch,
    RasterWrite,
    InvalidParameter,
    Cancelled,
}

impl PipelineError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(Error) -> Self {
        move |source| PipelineError::Stage { stage, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MetadataNotFound { .. } | PipelineError::InputDirectory { .. } => {
                ErrorKind::MetadataNotFound
            }
            PipelineError::Metadata(_) => ErrorKind::MetadataParse,
            PipelineError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            PipelineError::Cancelled { .. } => ErrorKind::Cancelled,
            PipelineError::Stage { source, .. } => match source {
                Error::RasterLoad { .. } => ErrorKind::RasterLoad,
                Error::RasterWrite { .. } => ErrorKind::RasterWrite,
                Error::GridShapeMismatch { .. } => ErrorKind::GridShapeMismatch,
                Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
                // Remaining core errors only surface from I/O inside a stage
                Error::Io(_)
                | Error::InvalidDimensions { .. }
                | Error::IndexOutOfBounds { .. }
                | Error::UnsupportedDataType(_)
                | Error::Other(_) => ErrorKind::RasterLoad,
            },
        }
    }

    /// Stage that failed, for stage errors
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Cancelled { before } => Some(*before),
            _ => None,
        }
    }
}
