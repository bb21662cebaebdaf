use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{NllbError, Result};
use super::Tokenizer;

/// Special tokens the adapter needs besides the vocabulary itself
#[derive(Debug, Clone)]
pub struct SpecialTokens {
    pub unk: String,
    pub eos: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            unk: "<unk>".to_string(),
            eos: "</s>".to_string(),
        }
    }
}

/// Tokenizer backed by a Hugging Face `tokenizer.json`.
///
/// Source text is framed as `[src_lang] tokens </s>`, the layout NLLB models
/// are trained with, instead of relying on the template baked into the file.
#[derive(Clone)]
pub struct HfTokenizer {
    inner: Arc<tokenizers::Tokenizer>,
    specials: SpecialTokens,
    source_token: Option<String>,
}

impl HfTokenizer {
    pub fn from_file<P: AsRef<Path>>(path: P, specials: SpecialTokens) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| NllbError::TokenizerLoad(format!("{}: {}", path.display(), e)))?;

        info!(
            "Loaded tokenizer from {} ({} tokens)",
            path.display(),
            inner.get_vocab_size(true)
        );

        Ok(Self {
            inner: Arc::new(inner),
            specials,
            source_token: None,
        })
    }

    /// Load `<dir>/<file_name>`
    pub fn from_dir<P: AsRef<Path>>(dir: P, file_name: &str, specials: SpecialTokens) -> Result<Self> {
        Self::from_file(dir.as_ref().join(file_name), specials)
    }

    /// Copy of this tokenizer that prefixes every encoded chunk with a source language token
    pub fn with_source_language(&self, language: &str) -> Self {
        let source_token = if self.token_id(language).is_some() {
            Some(language.to_string())
        } else {
            debug!("Source language {} has no token, encoding without prefix", language);
            None
        };

        Self {
            inner: Arc::clone(&self.inner),
            specials: self.specials.clone(),
            source_token,
        }
    }

    pub fn source_token(&self) -> Option<&str> {
        self.source_token.as_deref()
    }

    fn token_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| NllbError::Tokenize(e.to_string()))?;

        let pieces = encoding.get_tokens();
        let mut tokens = Vec::with_capacity(pieces.len() + 2);
        if let Some(source) = &self.source_token {
            tokens.push(source.clone());
        }
        tokens.extend(pieces.iter().cloned());
        tokens.push(self.specials.eos.clone());

        Ok(tokens)
    }

    fn decode(&self, tokens: &[String]) -> Result<String> {
        let unk = self.unk_token_id();
        let ids = tokens
            .iter()
            .map(|token| {
                self.token_id(token)
                    .or(unk)
                    .ok_or_else(|| NllbError::Tokenize(format!("Unknown token in hypothesis: {}", token)))
            })
            .collect::<Result<Vec<u32>>>()?;

        self.inner
            .decode(&ids, true)
            .map_err(|e| NllbError::Tokenize(e.to_string()))
    }

    fn language_token_id(&self, language: &str) -> Option<u32> {
        self.inner
            .get_added_tokens_decoder()
            .into_iter()
            .find(|(_, added)| added.special && added.content == language)
            .map(|(id, _)| id)
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.token_id(token)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn unk_token_id(&self) -> Option<u32> {
        self.token_id(&self.specials.unk)
    }

    fn for_source(&self, language: &str) -> Box<dyn Tokenizer> {
        Box::new(self.with_source_language(language))
    }
}
