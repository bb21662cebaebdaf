use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Translate plain text from stdin to stdout with a CTranslate2 NLLB model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model directory, or a directory containing model directories
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Source language code (e.g. en, he, rus_Cyrl), or "auto" to detect from the script
    #[arg(long)]
    pub src: String,

    /// Target language code (e.g. ru, en, heb_Hebr)
    #[arg(long)]
    pub dst: String,

    /// Directory holding tokenizer.json; defaults to the resolved model directory
    #[arg(long, value_name = "DIR")]
    pub tokenizer_dir: Option<PathBuf>,

    /// Beam search width
    #[arg(long)]
    pub beam_size: Option<usize>,

    /// Maximum characters per translated chunk
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Translate through an intermediate language (e.g. he -> en -> ru)
    #[arg(long)]
    pub pivot: Option<String>,
}

impl Args {
    /// Command line values take precedence over the config file
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(models_dir) = &self.models_dir {
            config.model.models_dir = Some(models_dir.clone());
        }
        if let Some(beam_size) = self.beam_size {
            config.translate.beam_size = beam_size;
        }
        if let Some(max_chars) = self.max_chars {
            config.translate.max_chars = max_chars;
        }
    }
}
