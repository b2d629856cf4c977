//! JSON model store with a SHA-256 manifest.
//!
//! Layout of the artifact directory:
//! - `ensemble.json`: the serialized [`ModelBundle`]
//! - `manifest.json`: `{ version, created_at, files: { name: sha256_hex } }`
//!
//! The manifest is written last, so a crash mid-save leaves either the old
//! manifest (hash mismatch on load, triggering a retrain) or no manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{Classifier, ModelBundle, ModelStore};

const ENSEMBLE_FILE: &str = "ensemble.json";
const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_VERSION: u32 = 1;

/// Error type for artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("Incompatible bundle: {0}")]
    Incompatible(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    created_at: i64,
    files: BTreeMap<String, String>,
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Directory-backed model store.
pub struct JsonModelStore {
    dir: PathBuf,
}

impl JsonModelStore {
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let bytes = fs::read(self.dir.join(MANIFEST_FILE))?;
        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Manifest(format!("Invalid manifest.json format: {e}")))?;

        if manifest.version != MANIFEST_VERSION {
            return Err(StoreError::Manifest(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        if !manifest.files.contains_key(ENSEMBLE_FILE) {
            return Err(StoreError::Manifest(format!(
                "manifest.json must include {ENSEMBLE_FILE}"
            )));
        }
        Ok(manifest)
    }

    /// Check every file bound by the manifest and return the ensemble bytes.
    fn verified_ensemble(&self, manifest: &Manifest) -> Result<Vec<u8>, StoreError> {
        let mut ensemble = None;

        for (rel, expected_hex) in &manifest.files {
            if Path::new(rel).components().count() != 1 {
                return Err(StoreError::Manifest(format!(
                    "Manifest entry {rel:?} escapes the artifact directory"
                )));
            }
            let path = self.dir.join(rel);
            let bytes = fs::read(&path).map_err(|e| {
                StoreError::Manifest(format!(
                    "Manifest references missing/unreadable file {path:?}: {e}"
                ))
            })?;
            if sha256_hex_bytes(&bytes) != *expected_hex {
                return Err(StoreError::HashMismatch(rel.clone()));
            }
            if rel == ENSEMBLE_FILE {
                ensemble = Some(bytes);
            }
        }

        ensemble.ok_or_else(|| StoreError::Manifest(format!("{ENSEMBLE_FILE} not bound")))
    }
}

impl ModelStore for JsonModelStore {
    type Error = StoreError;

    fn save<M: Serialize>(&self, bundle: &ModelBundle<M>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let ensemble = serde_json::to_vec(bundle)?;
        write_atomic(&self.dir.join(ENSEMBLE_FILE), &ensemble)?;

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            files: BTreeMap::from([(ENSEMBLE_FILE.to_string(), sha256_hex_bytes(&ensemble))]),
        };
        write_atomic(
            &self.dir.join(MANIFEST_FILE),
            &serde_json::to_vec_pretty(&manifest)?,
        )?;

        tracing::info!(
            dir = %self.dir.display(),
            models = bundle.models.len(),
            bytes = ensemble.len(),
            "Model bundle saved"
        );
        Ok(())
    }

    fn load<M: DeserializeOwned + Classifier>(&self) -> Result<Option<ModelBundle<M>>, StoreError> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let ensemble_path = self.dir.join(ENSEMBLE_FILE);

        match (manifest_path.exists(), ensemble_path.exists()) {
            (false, false) => return Ok(None),
            (false, true) => {
                return Err(StoreError::Manifest(format!(
                    "{ENSEMBLE_FILE} present without {MANIFEST_FILE}"
                )))
            }
            _ => {}
        }

        let manifest = self.read_manifest()?;
        let bytes = self.verified_ensemble(&manifest)?;
        let bundle: ModelBundle<M> = serde_json::from_slice(&bytes)?;
        bundle.check_compatible().map_err(StoreError::Incompatible)?;

        tracing::debug!(
            created_at = manifest.created_at,
            models = bundle.models.len(),
            "Model bundle verified"
        );
        Ok(Some(bundle))
    }

    fn exists(&self) -> bool {
        self.dir.join(MANIFEST_FILE).exists()
    }

    fn clear(&self) -> Result<(), StoreError> {
        for name in [MANIFEST_FILE, ENSEMBLE_FILE] {
            let path = self.dir.join(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
