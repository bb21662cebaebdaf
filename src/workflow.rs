use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

use crate::chunker::Chunker;
use crate::config::Config;
use crate::error::{NllbError, Result};
use crate::language::{AUTO_DETECT, LanguageTable, detect_source_language};
use crate::model::{ModelMetadata, find_model_dir};
use crate::translate::tokenizer::SpecialTokens;
use crate::translate::{
    DecodeOptions, HfTokenizer, Hop, OracleFactory, Tokenizer, TranslationDriver,
    TranslationOracle, resolve_directive,
};

/// Languages requested for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    /// Source code, or `auto`
    pub src: String,
    pub dst: String,
    pub pivot: Option<String>,
}

pub struct Workflow {
    config: Config,
    languages: LanguageTable,
    tokenizer: Box<dyn Tokenizer>,
    oracle: Box<dyn TranslationOracle>,
    show_progress: bool,
}

impl Workflow {
    /// Locate the model, load the tokenizer and bring up the inference backend
    pub fn new(config: Config, tokenizer_dir: Option<&Path>) -> Result<Self> {
        config.validate()?;

        // Check dependencies
        OracleFactory::ensure_available()?;

        let models_dir = config.model.models_dir.clone().ok_or_else(|| {
            NllbError::Config("models directory is required (--models-dir)".to_string())
        })?;
        let model_dir = find_model_dir(&models_dir, &config.model.marker_file)?;

        let metadata = ModelMetadata::load_or_default(&model_dir);
        let specials = SpecialTokens {
            unk: metadata.unk_token.unwrap_or_else(|| config.model.unk_token.clone()),
            eos: metadata.eos_token.unwrap_or_else(|| config.model.eos_token.clone()),
        };

        let tokenizer_dir = tokenizer_dir.unwrap_or(model_dir.as_path());
        let tokenizer = HfTokenizer::from_dir(tokenizer_dir, &config.model.tokenizer_file, specials)?;

        let oracle = OracleFactory::create(&model_dir, &config.model)?;

        let mut workflow = Self::with_backends(config, Box::new(tokenizer), oracle);
        workflow.show_progress = true;
        Ok(workflow)
    }

    /// Assemble a workflow around already constructed backends
    pub fn with_backends(
        config: Config,
        tokenizer: Box<dyn Tokenizer>,
        oracle: Box<dyn TranslationOracle>,
    ) -> Self {
        let languages = LanguageTable::with_entries(config.languages.clone());
        Self {
            config,
            languages,
            tokenizer,
            oracle,
            show_progress: false,
        }
    }

    /// Translate a whole document according to `job`.
    ///
    /// Every target directive is resolved before the first chunk is sent, so a
    /// bad language code never produces partial work.
    pub async fn translate(&self, text: &str, job: &TranslationJob) -> Result<String> {
        if text.trim().is_empty() {
            info!("Input is empty, nothing to translate");
            return Ok(String::new());
        }

        let src = if job.src == AUTO_DETECT {
            let detected = detect_source_language(text);
            info!("Detected source language: {}", detected);
            detected.to_string()
        } else {
            job.src.clone()
        };

        let route = self.plan_route(&src, job.pivot.as_deref(), &job.dst);
        info!("Translation route: {}", route.join(" -> "));

        let mut legs = Vec::with_capacity(route.len() - 1);
        for pair in route.windows(2) {
            let directive = resolve_directive(self.tokenizer.as_ref(), &self.languages, &pair[1])?;
            let source_tokenizer = self.tokenizer.for_source(&self.languages.resolve(&pair[0]));
            legs.push((source_tokenizer, directive));
        }

        let hops: Vec<Hop<'_>> = legs
            .iter()
            .map(|(tokenizer, directive)| Hop {
                tokenizer: tokenizer.as_ref(),
                directive: directive.clone(),
            })
            .collect();

        let options = DecodeOptions {
            beam_size: self.config.translate.beam_size,
            max_decoding_length: self.config.translate.max_decoding_length,
        };
        let driver = TranslationDriver::new(
            self.oracle.as_ref(),
            Chunker::new(self.config.translate.max_chars),
            options,
        )
        .with_progress(self.progress_bar());

        driver.translate_via(text, &hops).await
    }

    /// Language codes visited in order; a pivot equal to either end is ignored
    pub fn plan_route(&self, src: &str, pivot: Option<&str>, dst: &str) -> Vec<String> {
        match pivot {
            Some(pivot)
                if self.languages.resolve(pivot) != self.languages.resolve(src)
                    && self.languages.resolve(pivot) != self.languages.resolve(dst) =>
            {
                vec![src.to_string(), pivot.to_string(), dst.to_string()]
            }
            _ => vec![src.to_string(), dst.to_string()],
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        ProgressBar::new(0).with_style(style)
    }
}
