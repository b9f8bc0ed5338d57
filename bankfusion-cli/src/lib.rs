//! bankfusion-cli: configuration, document loading and the batch runner
//! behind the `bankfusion` binary.

pub mod auth;
pub mod batch;
pub mod config;
pub mod loader;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod state;

use anyhow::{Context, Result};
use bankfusion_ingest::StatementExtractor;
use bankfusion_normalize::{Normalizer, OpenAiClassifier, RuleTables};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::pipeline::Pipeline;

/// Wire extractor, rule tables and the optional advisory client from config
pub fn build_pipeline(cfg: &Config, output_dir: PathBuf, advisory_key: Option<String>) -> Result<Pipeline> {
    let extractor = StatementExtractor::new().context("compile extraction patterns")?;
    let tables = RuleTables::shared().context("compile rule tables")?;
    let mut normalizer = Normalizer::new(tables)
        .with_concurrency(cfg.advisory.concurrency)
        .with_timeout(Duration::from_secs(cfg.advisory.timeout_secs.max(1)));

    match advisory_key {
        Some(key) => {
            info!(model = %cfg.advisory.model, "advisory classification enabled");
            normalizer = normalizer.with_advisory(Arc::new(OpenAiClassifier::new(key, cfg.advisory_settings())));
        }
        None => info!("rules-only normalization"),
    }

    Ok(Pipeline::new(extractor, normalizer, cfg.timezone()?, output_dir))
}

/// API key to use, or `None` when advisory is switched off or no key exists
pub fn resolve_advisory_key(cfg: &Config, no_advisory: bool) -> Result<Option<String>> {
    if no_advisory || !cfg.advisory_enabled() {
        return Ok(None);
    }
    let key = auth::api_key()?;
    if key.is_none() {
        warn!("no {} or ~/.bankfusion/auth.json key; falling back to rules only", auth::API_KEY_ENV);
    }
    Ok(key)
}
