//! Input directory contract: one `*MTL.txt` file plus the band GeoTIFFs it names

use super::error::PipelineError;
use super::metadata::{Band, MetadataParseError, MtlDocument, SceneMetadata};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix identifying the MTL metadata file
pub const MTL_SUFFIX: &str = "MTL.txt";

/// Locate the MTL file in `dir`.
///
/// When several files match, the first one in directory listing order is
/// used. That order is filesystem dependent.
pub fn find_mtl(dir: &Path) -> Result<PathBuf, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|source| PipelineError::InputDirectory {
        dir: dir.to_path_buf(),
        source,
    })?;

    let candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(MTL_SUFFIX))
        .map(|entry| entry.path())
        // is_file follows symlinks
        .filter(|path| path.is_file())
        .collect();

    match candidates.as_slice() {
        [] => Err(PipelineError::MetadataNotFound {
            dir: dir.to_path_buf(),
        }),
        [only] => Ok(only.clone()),
        [first, ..] => {
            warn!(
                candidates = ?candidates,
                chosen = %first.display(),
                "multiple MTL files found, using the first one listed"
            );
            Ok(first.clone())
        }
    }
}

/// A Landsat 8/9 Level-1 scene on disk
#[derive(Debug, Clone)]
pub struct LandsatScene {
    directory: PathBuf,
    mtl_path: PathBuf,
    metadata: SceneMetadata,
}

impl LandsatScene {
    /// Find, read and parse the scene's MTL file.
    ///
    /// No raster is touched here; band files are only opened by the pipeline.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let directory = dir.as_ref().to_path_buf();
        let mtl_path = find_mtl(&directory)?;

        let text = fs::read_to_string(&mtl_path).map_err(|source| {
            MetadataParseError::Unreadable {
                path: mtl_path.clone(),
                source,
            }
        })?;
        let metadata = SceneMetadata::from_mtl(&MtlDocument::parse(&text))?;

        info!(
            mtl = %mtl_path.display(),
            spacecraft = metadata.spacecraft_id.as_deref().unwrap_or("unknown"),
            product = metadata.product_id.as_deref().unwrap_or("unknown"),
            acquired = metadata.date_acquired.as_deref().unwrap_or("unknown"),
            "opened Landsat scene"
        );

        Ok(Self {
            directory,
            mtl_path,
            metadata,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn mtl_path(&self) -> &Path {
        &self.mtl_path
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    /// Full path of a band file
    pub fn band_path(&self, band: Band) -> PathBuf {
        self.directory.join(self.metadata.calibration.band_file(band))
    }
}
