use serde::{Deserialize, Serialize};

use crate::configurations::DaiClassifierConfig;

#[derive(Debug, Deserialize)]
pub struct ModelVersion {
    pub model_version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DaiClassifierModel {
    pub model_version: String,
    pub config: DaiClassifierConfig,
    /// Category types of the database the classifiers were trained with
    pub category_types: Vec<String>,
    pub classifiers: Vec<ItemClassifierModel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemClassifierModel {
    pub dai: String,
    pub vocabulary: Vec<String>,
    pub intercept: f32,
    pub coeffs: Vec<f32>,
}
