use async_trait::async_trait;
use ct2rs::sys::{ComputeType, Config, Device, TranslationOptions, Translator};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{NllbError, Result};
use super::{OracleRequest, TranslationOracle};

/// CTranslate2 model driven at the token level
pub struct Ct2Oracle {
    translator: Arc<Translator>,
}

impl Ct2Oracle {
    pub fn load(model_dir: &Path, config: &ModelConfig) -> Result<Self> {
        let ct2_config = Config {
            device: parse_device(&config.device)?,
            compute_type: parse_compute_type(&config.compute_type)?,
            ..Default::default()
        };

        info!(
            "Loading CTranslate2 model from {} (device: {}, compute type: {})",
            model_dir.display(),
            config.device,
            config.compute_type
        );

        let translator = Translator::new(model_dir, &ct2_config).map_err(|e| {
            NllbError::BackendUnavailable(format!(
                "failed to load model from {}: {}",
                model_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            translator: Arc::new(translator),
        })
    }
}

#[async_trait]
impl TranslationOracle for Ct2Oracle {
    async fn translate(&self, request: OracleRequest) -> Result<Vec<String>> {
        let translator = Arc::clone(&self.translator);

        // Decoding is CPU bound, keep it off the async workers
        tokio::task::spawn_blocking(move || {
            let options = TranslationOptions::<String, String> {
                beam_size: request.options.beam_size,
                max_decoding_length: request.options.max_decoding_length,
                num_hypotheses: 1,
                ..Default::default()
            };

            debug!(
                "Decoding {} source tokens (beam {})",
                request.source.len(),
                options.beam_size
            );

            let results = translator
                .translate_batch_with_target_prefix(
                    &[request.source],
                    &[request.target_prefix],
                    &options,
                    None,
                )
                .map_err(|e| NllbError::Oracle(e.to_string()))?;

            results
                .into_iter()
                .next()
                .and_then(|result| result.hypotheses.into_iter().next())
                .ok_or_else(|| NllbError::Oracle("model returned no hypothesis".to_string()))
        })
        .await?
    }
}

fn parse_device(device: &str) -> Result<Device> {
    match device.to_lowercase().as_str() {
        "cpu" => Ok(Device::CPU),
        "cuda" => Ok(Device::CUDA),
        _ => Err(NllbError::Config(format!(
            "Invalid device '{}'. Valid devices: cpu, cuda",
            device
        ))),
    }
}

fn parse_compute_type(compute_type: &str) -> Result<ComputeType> {
    match compute_type.to_lowercase().as_str() {
        "default" => Ok(ComputeType::DEFAULT),
        "auto" => Ok(ComputeType::AUTO),
        "float32" => Ok(ComputeType::FLOAT32),
        "float16" => Ok(ComputeType::FLOAT16),
        "bfloat16" => Ok(ComputeType::BFLOAT16),
        "int8" => Ok(ComputeType::INT8),
        "int8_float32" => Ok(ComputeType::INT8_FLOAT32),
        "int8_float16" => Ok(ComputeType::INT8_FLOAT16),
        "int16" => Ok(ComputeType::INT16),
        _ => Err(NllbError::Config(format!(
            "Invalid compute type '{}'. Valid types: default, auto, float32, float16, bfloat16, int8, int8_float32, int8_float16, int16",
            compute_type
        ))),
    }
}
