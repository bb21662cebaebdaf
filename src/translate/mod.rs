// Translation backends and the chunk driver
//
// The driver only talks to two capabilities:
// - Tokenizer: text <-> model tokens, language code lookup
// - TranslationOracle: token sequence in, best hypothesis out
//
// Concrete implementations:
// - tokenizer: Hugging Face tokenizer.json via the tokenizers crate
// - ctranslate2: CTranslate2 model via ct2rs (cargo feature "ctranslate2")

pub mod driver;
pub mod tokenizer;
#[cfg(feature = "ctranslate2")]
pub mod ctranslate2;

use async_trait::async_trait;
use std::path::Path;

pub use driver::*;
pub use tokenizer::HfTokenizer;

use crate::config::ModelConfig;
use crate::error::{NllbError, Result};

/// Converts between text and the oracle's token representation
#[cfg_attr(test, mockall::automock)]
pub trait Tokenizer: Send + Sync {
    /// Tokenize a chunk into the token strings the oracle consumes
    fn encode(&self, text: &str) -> Result<Vec<String>>;

    /// Turn hypothesis tokens back into text, dropping special tokens
    fn decode(&self, tokens: &[String]) -> Result<String>;

    /// Explicit language code mapping, if the tokenizer declares one
    fn language_token_id(&self, language: &str) -> Option<u32>;

    /// Plain vocabulary lookup
    fn token_to_id(&self, token: &str) -> Option<u32>;

    fn id_to_token(&self, id: u32) -> Option<String>;

    /// Id of the unknown-token sentinel
    fn unk_token_id(&self) -> Option<u32>;

    /// Variant of this tokenizer that frames encoded text as `language` source text
    fn for_source(&self, language: &str) -> Box<dyn Tokenizer>;
}

/// Decoding parameters passed with every oracle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub beam_size: usize,
    pub max_decoding_length: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            beam_size: 4,
            max_decoding_length: 512,
        }
    }
}

/// One chunk worth of work for the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub source: Vec<String>,
    /// Tokens the oracle must emit first, i.e. the target language directive
    pub target_prefix: Vec<String>,
    pub options: DecodeOptions,
}

/// Black-box sequence-to-sequence translator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationOracle: Send + Sync {
    /// Return the tokens of the single best hypothesis
    async fn translate(&self, request: OracleRequest) -> Result<Vec<String>>;
}

/// Factory for creating oracle instances
pub struct OracleFactory;

impl OracleFactory {
    /// Fail early when this build carries no inference backend
    pub fn ensure_available() -> Result<()> {
        if cfg!(feature = "ctranslate2") {
            Ok(())
        } else {
            Err(backend_missing())
        }
    }

    /// Load the model at `model_dir` with the configured device settings
    #[cfg(feature = "ctranslate2")]
    pub fn create(model_dir: &Path, config: &ModelConfig) -> Result<Box<dyn TranslationOracle>> {
        Ok(Box::new(ctranslate2::Ct2Oracle::load(model_dir, config)?))
    }

    #[cfg(not(feature = "ctranslate2"))]
    pub fn create(_model_dir: &Path, _config: &ModelConfig) -> Result<Box<dyn TranslationOracle>> {
        Err(backend_missing())
    }
}

fn backend_missing() -> NllbError {
    NllbError::BackendUnavailable(
        "built without the `ctranslate2` feature; rebuild with --features ctranslate2".to_string(),
    )
}
