//! Filesystem persistence for trained models and their metadata sidecars.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::PredictError;
use crate::trainer::{CalibratedModel, ModelMetadata};

/// Directory-backed store for `{name}.model` / `{name}_meta.json` pairs.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written file. The model blob lands before
/// the metadata sidecar; a crash between the two leaves a version mismatch
/// that [`ModelStore::load`] reports instead of serving a torn pair. The
/// skew check compares version strings only, so every retrain must bump the
/// version for a torn pair to stay detectable.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ModelStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.model", name))
    }

    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}_meta.json", name))
    }

    /// True when both files of the pair are present.
    pub fn exists(&self, name: &str) -> bool {
        self.model_path(name).is_file() && self.metadata_path(name).is_file()
    }

    /// Persist a model and its metadata under `name`.
    ///
    /// Saving a retrain under an unchanged version string makes a torn pair
    /// indistinguishable from a good one; only `trained_at` goes stale.
    pub fn save(
        &self,
        name: &str,
        model: &CalibratedModel,
        metadata: &ModelMetadata,
    ) -> Result<(), PredictError> {
        if model.version != metadata.version {
            return Err(PredictError::VersionSkew {
                model: model.version.clone(),
                metadata: metadata.version.clone(),
            });
        }
        if metadata.features.is_empty() {
            return Err(PredictError::MetadataInvalid(
                "metadata lists no feature columns".to_string(),
            ));
        }

        fs::create_dir_all(&self.dir).map_err(|e| PredictError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let model_path = self.model_path(name);
        let blob = serde_json::to_vec(model).map_err(|e| PredictError::ArtifactMalformed {
            path: model_path.clone(),
            detail: e.to_string(),
        })?;
        write_atomic(&model_path, &blob)?;

        let metadata_path = self.metadata_path(name);
        let sidecar =
            serde_json::to_vec_pretty(metadata).map_err(|e| PredictError::ArtifactMalformed {
                path: metadata_path.clone(),
                detail: e.to_string(),
            })?;
        write_atomic(&metadata_path, &sidecar)?;

        info!(
            "saved model '{}' version {} to {}",
            name,
            model.version,
            self.dir.display()
        );
        Ok(())
    }

    /// Load a model/metadata pair, verifying that the two files agree.
    pub fn load(&self, name: &str) -> Result<(CalibratedModel, ModelMetadata), PredictError> {
        let model_path = self.model_path(name);
        let blob = read_file(&model_path)?;
        let model: CalibratedModel =
            serde_json::from_slice(&blob).map_err(|e| PredictError::ArtifactMalformed {
                path: model_path.clone(),
                detail: e.to_string(),
            })?;
        if model.members.is_empty() {
            return Err(PredictError::ArtifactMalformed {
                path: model_path,
                detail: "model blob has no ensemble members".to_string(),
            });
        }

        let metadata_path = self.metadata_path(name);
        let sidecar = read_file(&metadata_path)?;
        let metadata: ModelMetadata = serde_json::from_slice(&sidecar).map_err(|e| {
            PredictError::MetadataInvalid(format!("{}: {}", metadata_path.display(), e))
        })?;
        if metadata.features.is_empty() {
            return Err(PredictError::MetadataInvalid(format!(
                "{}: metadata lists no feature columns",
                metadata_path.display()
            )));
        }
        if model.version != metadata.version {
            return Err(PredictError::VersionSkew {
                model: model.version,
                metadata: metadata.version,
            });
        }

        info!(
            "loaded model '{}' version {} ({} members, {} features)",
            name,
            model.version,
            model.members.len(),
            metadata.features.len()
        );
        Ok((model, metadata))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, PredictError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(PredictError::ArtifactMissing(path.to_path_buf()))
        }
        Err(e) => Err(PredictError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write to a temporary sibling, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PredictError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|e| PredictError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path).map_err(|e| PredictError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
