//! nllb-translate - plain text translation through a local NLLB model
//!
//! Input is split into paragraph and sentence bounded chunks, each chunk is
//! translated by a CTranslate2 backend steered with a target language token,
//! and the translated chunks are joined back with blank lines.

pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod model;
pub mod translate;
pub mod workflow;
