use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{NllbError, Result};

/// File CTranslate2 writes next to the weights describing special tokens
const MODEL_CONFIG_FILE: &str = "config.json";

/// Resolve a concrete model directory under `models_dir`.
///
/// The directory itself is used when it holds `marker_file`, otherwise the
/// first immediate subdirectory (by name) that holds it.
pub fn find_model_dir<P: AsRef<Path>>(models_dir: P, marker_file: &str) -> Result<PathBuf> {
    let models_dir = models_dir.as_ref();

    if models_dir.join(marker_file).is_file() {
        debug!("Model marker found directly in {}", models_dir.display());
        return Ok(models_dir.to_path_buf());
    }

    if !models_dir.is_dir() {
        return Err(NllbError::ModelNotFound(format!(
            "Models dir not found: {}",
            models_dir.display()
        )));
    }

    for entry in WalkDir::new(models_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let candidate = entry.path();
        if candidate.join(marker_file).is_file() {
            info!("Using model directory: {}", candidate.display());
            return Ok(candidate.to_path_buf());
        }
    }

    Err(NllbError::ModelNotFound(format!(
        "No CTranslate2 model found (missing {})",
        marker_file
    )))
}

/// Special tokens recorded in a converted model's `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub bos_token: Option<String>,
    #[serde(default)]
    pub eos_token: Option<String>,
    #[serde(default)]
    pub unk_token: Option<String>,
    #[serde(default)]
    pub decoder_start_token: Option<String>,
}

impl ModelMetadata {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the metadata of a model directory, falling back to empty metadata
    pub fn load_or_default<P: AsRef<Path>>(model_dir: P) -> Self {
        let path = model_dir.as_ref().join(MODEL_CONFIG_FILE);
        if !path.is_file() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Ignoring unreadable model config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
