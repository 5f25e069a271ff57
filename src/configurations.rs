use std::fs::File;
use std::path::Path;

use failure::ResultExt;
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::utterance::{NBestNormalisation, Probability};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaiClassifierConfig {
    pub featurizer: FeaturizerConfig,
    pub training: TrainingConfig,
    pub nbest_normalisation: NBestNormalisation,
    /// Items scored below this threshold are dropped from the confusion network
    pub confnet_prune_threshold: Probability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerConfig {
    /// Longest n-gram extracted from the tokens
    pub ngram_order: usize,
    pub use_category_features: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub max_iterations: usize,
    /// Optimization stops once the largest gradient component is below this value
    pub tolerance: f64,
    /// Size of the training thread pool, all cores when unset
    pub num_threads: Option<usize>,
}

impl Default for DaiClassifierConfig {
    fn default() -> Self {
        Self {
            featurizer: FeaturizerConfig::default(),
            training: TrainingConfig::default(),
            nbest_normalisation: NBestNormalisation::default(),
            confnet_prune_threshold: 0.0,
        }
    }
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        Self {
            ngram_order: 2,
            use_category_features: true,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-5,
            num_threads: None,
        }
    }
}

impl DaiClassifierConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_file = File::open(&path).with_context(|_| {
            SluError::ModelLoad(path.as_ref().to_string_lossy().to_string())
        })?;
        let config: Self = serde_json::from_reader(config_file)
            .with_context(|_| "Cannot deserialize DaiClassifierConfig json data")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.featurizer.ngram_order == 0 {
            return Err(SluError::Configuration(
                "ngram_order must be at least 1".to_string()
            ).into());
        }
        if self.training.max_iterations == 0 {
            return Err(SluError::Configuration(
                "max_iterations must be at least 1".to_string()
            ).into());
        }
        if !(self.training.tolerance.is_finite() && self.training.tolerance > 0.0) {
            return Err(SluError::Configuration(format!(
                "tolerance must be strictly positive, found {}",
                self.training.tolerance
            ))
            .into());
        }
        if self.training.num_threads == Some(0) {
            return Err(SluError::Configuration(
                "num_threads must be at least 1".to_string()
            ).into());
        }
        if !(0.0..=1.0).contains(&self.confnet_prune_threshold) {
            return Err(SluError::Configuration(format!(
                "confnet_prune_threshold must be in [0, 1], found {}",
                self.confnet_prune_threshold
            ))
            .into());
        }
        Ok(())
    }
}
