use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{NllbError, Result};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "nllb-translate.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub translate: TranslateConfig,
    /// Extra short code → model language code entries
    pub languages: BTreeMap<String, String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory holding the converted model, or a directory of model directories
    pub models_dir: Option<PathBuf>,
    /// File whose presence marks a model directory
    pub marker_file: String,
    /// Tokenizer definition inside the tokenizer directory
    pub tokenizer_file: String,
    /// Inference device: cpu or cuda
    pub device: String,
    /// Weight quantization used at load time (e.g. int8, float16, default)
    pub compute_type: String,
    /// Unknown-token sentinel, overridden by the model's config.json when present
    pub unk_token: String,
    /// End-of-sequence token appended to source sentences
    pub eos_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Beam search width
    pub beam_size: usize,
    /// Soft upper bound of characters per chunk
    pub max_chars: usize,
    /// Hard cap on generated tokens per chunk
    pub max_decoding_length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for daily-rotated log files; console only when unset
    pub dir: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: None,
            marker_file: "model.bin".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            device: "cpu".to_string(),
            compute_type: "int8".to_string(),
            unk_token: "<unk>".to_string(),
            eos_token: "</s>".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            beam_size: 4,
            max_chars: 2000,
            max_decoding_length: 512,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NllbError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| NllbError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NllbError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| NllbError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Explicit path first, then the default file in the working directory, then defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.translate.beam_size == 0 {
            return Err(NllbError::Config("beam_size must be greater than 0".to_string()));
        }

        if self.translate.max_chars == 0 {
            return Err(NllbError::Config("max_chars must be greater than 0".to_string()));
        }

        if self.translate.max_decoding_length == 0 {
            return Err(NllbError::Config(
                "max_decoding_length must be greater than 0".to_string(),
            ));
        }

        if self.model.marker_file.is_empty() {
            return Err(NllbError::Config("marker_file must not be empty".to_string()));
        }

        Ok(())
    }
}
